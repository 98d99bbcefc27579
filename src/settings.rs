use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::args::{Args, Command};
use crate::manager::DEFAULT_BASE_PACKAGE;
use crate::startup::StartupFile;

/// Startup file looked for in the working directory when none is given.
const DEFAULT_CONFIG: &str = "startup.vtpkg";
const DEFAULT_PACKAGE_DIR: &str = "packages";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Startup file {0:?} does not exist")]
    ConfigNotFound(PathBuf),
    #[error("Invalid config path has no parent (should not happen)")]
    ConfigHasNoParent,
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in and the
/// startup file has been read.
#[derive(Debug)]
pub struct Settings {
    /// Canonicalized path of the startup file, if there is one.
    pub config: Option<PathBuf>,
    /// Startup file contents, kept as written so they can be saved back.
    pub startup: StartupFile,
    pub package_dir: PathBuf,
    pub user_package_dir: Option<PathBuf>,
    pub base_package: String,
    /// Codepaths to enable at startup. `None` means every available package.
    pub enabled: Option<Vec<String>>,
    pub command: Command,
    pub yes: bool,
    pub verbose: u8,
}

impl Settings {
    /// Package directories in search order.
    pub fn package_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::with_capacity(2);
        dirs.push(self.package_dir.clone());
        if let Some(user_dir) = &self.user_package_dir {
            dirs.push(user_dir.clone());
        }
        dirs
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let config = match &args.config {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path).into());
                }
                Some(path.canonicalize()?)
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG);
                if path.exists() {
                    Some(path.canonicalize()?)
                } else {
                    None
                }
            }
        };

        let (startup, config_dir) = match &config {
            Some(path) => {
                log::debug!("reading startup file {path:?}");
                let parent = path.parent().ok_or(Error::ConfigHasNoParent)?;
                (StartupFile::read(path)?, Some(parent.to_path_buf()))
            }
            None => (StartupFile::default(), None),
        };

        // command line first, then startup file (relative to its own dir), then defaults:
        let package_dir = args
            .package_dir
            .map(PathBuf::from)
            .or_else(|| relative_to(config_dir.as_deref(), startup.package_dir.as_deref()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKAGE_DIR));
        let user_package_dir = args
            .user_package_dir
            .map(PathBuf::from)
            .or_else(|| relative_to(config_dir.as_deref(), startup.user_package_dir.as_deref()));

        let base_package = startup
            .base_package
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_PACKAGE.to_owned());
        let enabled = startup.enabled.clone();

        Ok(Self {
            config,
            startup,
            package_dir,
            user_package_dir,
            base_package,
            enabled,
            command: args.command,
            yes: args.yes,
            verbose: args.verbose,
        })
    }
}

fn relative_to(dir: Option<&Path>, path: Option<&str>) -> Option<PathBuf> {
    let path = Path::new(path?);
    match dir {
        Some(dir) if path.is_relative() => Some(dir.join(path)),
        _ => Some(path.to_path_buf()),
    }
}
