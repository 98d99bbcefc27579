use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use syntax::ast::Item;
use syntax::MANIFEST_EXT;
use util::{HashSet, PathEncodingError};

use crate::hook::run_hook;
use crate::{Error, Package, Registry, MANIFEST_FILE};

/// Finds packages in a standard package directory and an optional user package
/// directory. A package with codepath `vtk` is either a single manifest
/// `<dir>/vtk.vtpkg` or a directory `<dir>/vtk/` containing `package.vtpkg`.
/// Earlier directories take precedence over later ones.
#[derive(Debug)]
pub struct DirRegistry {
    dirs: Vec<PathBuf>,
    /// Forward hook output to stderr.
    echo: bool,
}

impl DirRegistry {
    pub fn new<I>(dirs: I, echo: bool) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().collect(),
            echo,
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find the manifest for `codepath`.
    /// Returns the manifest path and the package's own directory.
    fn find_manifest(&self, codepath: &str) -> Option<(PathBuf, PathBuf)> {
        if !is_valid_codepath(codepath) {
            return None;
        }
        for dir in &self.dirs {
            let file = dir.join(format!("{codepath}.{MANIFEST_EXT}"));
            if file.is_file() {
                return Some((file, dir.clone()));
            }
            let pkg_dir = dir.join(codepath);
            let file = pkg_dir.join(MANIFEST_FILE);
            if file.is_file() {
                return Some((file, pkg_dir));
            }
        }
        None
    }

    fn scan_dir(dir: &Path, seen: &mut HashSet<String>, found: &mut Vec<String>) -> Result<()> {
        let mut entries = fs::read_dir(dir)
            .with_context(|| format!("reading package directory {}", dir.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let codepath = if path.is_file() {
                if path.extension().map_or(true, |ext| ext != MANIFEST_EXT) {
                    continue;
                }
                path.file_stem()
            } else if path.join(MANIFEST_FILE).is_file() {
                path.file_name()
            } else {
                continue;
            };

            let Some(codepath) = codepath else { continue };
            let codepath = match codepath.to_str() {
                Some(s) => s,
                None => {
                    log::warn!("skipping {}: {}", path.display(), PathEncodingError);
                    continue;
                }
            };
            if !is_valid_codepath(codepath) {
                continue;
            }
            if seen.insert(codepath.to_owned()) {
                found.push(codepath.to_owned());
            }
        }
        Ok(())
    }
}

impl Registry for DirRegistry {
    fn available(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::default();
        let mut found = Vec::new();
        for dir in &self.dirs {
            if dir.is_dir() {
                Self::scan_dir(dir, &mut seen, &mut found)?;
            } else {
                log::debug!("package directory {} does not exist", dir.display());
            }
        }
        Ok(found)
    }

    fn load(&mut self, codepath: &str) -> Result<Package> {
        let (manifest, pkg_dir) = self
            .find_manifest(codepath)
            .ok_or_else(|| Error::NotFound(codepath.to_owned()))?;

        log::debug!("loading {codepath} from {}", manifest.display());
        let text = fs::read_to_string(&manifest)
            .with_context(|| format!("reading manifest {}", manifest.display()))?;

        let items = syntax::parse(&text)
            .with_context(|| format!("parsing manifest {}", manifest.display()))?;

        let mut block = None;
        for item in &items {
            match item {
                Item::Package(b) if block.is_none() => block = Some(b),
                Item::Package(_) => {
                    let msg = "more than one package block".to_owned();
                    return Err(Error::InvalidManifest(codepath.to_owned(), msg).into());
                }
                Item::Setting((key, _)) => {
                    let msg = format!("unexpected top-level setting \"{key}\"");
                    return Err(Error::InvalidManifest(codepath.to_owned(), msg).into());
                }
            }
        }
        let block = block.ok_or_else(|| {
            Error::InvalidManifest(codepath.to_owned(), "no package block".to_owned())
        })?;

        Package::from_block(codepath, block, Some(&pkg_dir))
    }

    fn check_requirements(&self, package: &Package) -> Result<()> {
        for path in package.resolved_requirements() {
            if !path.exists() {
                let path = path.display().to_string();
                return Err(Error::MissingRequirement(package.identifier.clone(), path).into());
            }
        }
        Ok(())
    }

    fn initialize(&mut self, package: &Package) -> Result<()> {
        let Some(cmd) = &package.init else {
            return Ok(());
        };
        let out = run_hook(package, cmd, self.echo)?;
        if out.status.success() {
            Ok(())
        } else {
            let reason = match out.last_error_line() {
                Some(line) => format!("{} ({line})", out.status),
                None => out.status.to_string(),
            };
            Err(Error::InitializationFailed(package.identifier.clone(), reason).into())
        }
    }

    fn finalize(&mut self, package: &Package) {
        let Some(cmd) = &package.finalize else {
            return;
        };
        match run_hook(package, cmd, self.echo) {
            Ok(out) if out.status.success() => {}
            Ok(out) => log::warn!(
                "finalize hook for {} failed with {}",
                package.identifier,
                out.status
            ),
            Err(e) => log::warn!("finalize hook for {} failed: {e:#}", package.identifier),
        }
    }
}

/// A codepath names one entry directly inside a package directory,
/// and must be writable to a startup file.
fn is_valid_codepath(codepath: &str) -> bool {
    !codepath.is_empty()
        && !codepath.starts_with('.')
        && !codepath.contains(|c: char| c == '/' || c == '\\' || c == '"' || c.is_control())
}
