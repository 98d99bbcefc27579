use anyhow::Result;

mod package;
pub use package::{ConfigValue, Configuration, Package};

/// Registry backed by package directories on disk.
mod dir;
pub use dir::DirRegistry;

/// Registry held entirely in memory.
mod memory;
pub use memory::MemoryRegistry;

/// Running init and finalize commands.
mod hook;

/// Name of the manifest file inside a package directory.
pub const MANIFEST_FILE: &str = "package.vtpkg";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Package '{0}' is missing.")]
    NotFound(String),
    #[error("Invalid manifest for package '{0}': {1}")]
    InvalidManifest(String, String),
    #[error("Unknown field \"{1}\" in manifest for package '{0}'")]
    UnknownField(String, String),
    #[error("Field \"{1}\" in manifest for package '{0}' must be a single value, not a list")]
    ExpectedSingleValue(String, String),
    #[error("Package '{0}' requires \"{1}\", which does not exist")]
    MissingRequirement(String, String),
    #[error("Package '{0}' failed to initialize: {1}")]
    InitializationFailed(String, String),
}

/// The outside world as the package manager sees it:
/// somewhere to find package metadata, and the callbacks that
/// actually bring a package up and tear it down.
pub trait Registry {
    /// Codepaths of every package that could be enabled.
    fn available(&self) -> Result<Vec<String>>;

    /// Load metadata for the package at `codepath`. This does not initialize it.
    fn load(&mut self, codepath: &str) -> Result<Package>;

    /// Check that everything the package needs from its environment is present.
    fn check_requirements(&self, _package: &Package) -> Result<()> {
        Ok(())
    }

    /// Initialize `package`. Called at most once per enabled package,
    /// after all of its dependencies were initialized.
    fn initialize(&mut self, package: &Package) -> Result<()>;

    /// Tear down an initialized package. Failures are the registry's to report.
    fn finalize(&mut self, _package: &Package) {}
}
