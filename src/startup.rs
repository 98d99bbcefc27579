use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use syntax::ast::{Item, Value};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown setting \"{0}\" in startup file")]
    UnknownSetting(String),
    #[error("Setting \"{0}\" must be a single value, not a list")]
    ExpectedSingleValue(String),
    #[error("Startup file may not define packages (found '{0}')")]
    UnexpectedPackage(String),
    #[error("Can't write {0:?} to a startup file")]
    Unrepresentable(String),
}

/// Contents of a startup configuration file:
/// ```text
/// package_dir = packages
/// user_package_dir = userpackages
/// base_package = org.vistrails.basic
/// enabled = [basic, vtk, spreadsheet]
/// ```
/// Values are kept as written; relative paths are resolved by `Settings`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartupFile {
    pub package_dir: Option<String>,
    pub user_package_dir: Option<String>,
    pub base_package: Option<String>,
    /// Codepaths to enable at startup. `None` means every available package.
    pub enabled: Option<Vec<String>>,
}

impl StartupFile {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("while reading startup file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("while parsing startup file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut startup = Self::default();
        for item in syntax::parse(text)? {
            let (key, val) = match item {
                Item::Setting(asst) => asst,
                Item::Package(block) => {
                    return Err(Error::UnexpectedPackage(block.identifier.to_owned()).into())
                }
            };
            match key {
                "package_dir" => startup.package_dir = Some(single(key, &val)?),
                "user_package_dir" => startup.user_package_dir = Some(single(key, &val)?),
                "base_package" => startup.base_package = Some(single(key, &val)?),
                "enabled" => {
                    startup.enabled = Some(val.to_list().into_iter().map(str::to_owned).collect())
                }
                _ => return Err(Error::UnknownSetting(key.to_owned()).into()),
            }
        }
        Ok(startup)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        log::debug!("writing startup file {}", path.display());
        let text = self.to_text()?;
        std::fs::write(path, text)
            .with_context(|| format!("while writing startup file {}", path.display()))
    }

    /// Serialize in the same format `parse` reads.
    pub fn to_text(&self) -> Result<String, Error> {
        let mut text = String::with_capacity(128);
        let settings = [
            ("package_dir", &self.package_dir),
            ("user_package_dir", &self.user_package_dir),
            ("base_package", &self.base_package),
        ];
        for (key, val) in settings {
            if let Some(val) = val {
                let _ = writeln!(text, "{key} = {}", quote(val)?);
            }
        }
        if let Some(enabled) = &self.enabled {
            let items = enabled.iter().map(|s| quote(s)).collect::<Result<Vec<_>, _>>()?;
            let _ = writeln!(text, "enabled = [{}]", items.join(", "));
        }
        Ok(text)
    }
}

fn single(key: &str, val: &Value) -> Result<String> {
    match val {
        Value::Literal(s) => Ok((*s).to_owned()),
        Value::List(_) => Err(Error::ExpectedSingleValue(key.to_owned()).into()),
    }
}

/// Quote `s` if it can't be written as a bare literal.
/// Quoted literals can't hold a quote or a newline, so those can't be written at all.
fn quote(s: &str) -> Result<String, Error> {
    if s.contains(|c: char| c == '"' || c == '\n') {
        return Err(Error::Unrepresentable(s.to_owned()));
    }
    let needs_quotes = s.is_empty()
        || s.contains(|c: char| c.is_whitespace() || "[]{},=#".contains(c));
    if needs_quotes {
        Ok(format!("\"{s}\""))
    } else {
        Ok(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() -> Result<()> {
        let startup = StartupFile::parse(
            "# startup\npackage_dir = packages\nuser_package_dir = \"my packages\"\n\
             base_package = org.vistrails.basic\nenabled = [basic, vtk]\n",
        )?;
        assert_eq!(startup.package_dir.as_deref(), Some("packages"));
        assert_eq!(startup.user_package_dir.as_deref(), Some("my packages"));
        assert_eq!(startup.base_package.as_deref(), Some("org.vistrails.basic"));
        assert_eq!(startup.enabled, Some(vec!["basic".to_owned(), "vtk".to_owned()]));
        Ok(())
    }

    #[test]
    fn test_parse_empty() -> Result<()> {
        assert_eq!(StartupFile::parse("")?, StartupFile::default());
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        let e = StartupFile::parse("colour = blue\n").unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(), Some(Error::UnknownSetting(_))));
        let e = StartupFile::parse("package_dir = [a, b]\n").unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(), Some(Error::ExpectedSingleValue(_))));
        let e = StartupFile::parse("package p {}\n").unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(), Some(Error::UnexpectedPackage(_))));
    }

    #[test]
    fn test_to_text_reparses() -> Result<()> {
        let startup = StartupFile {
            package_dir: Some("packages".to_owned()),
            user_package_dir: Some("my packages".to_owned()),
            base_package: None,
            enabled: Some(vec!["basic".to_owned(), "vtk".to_owned()]),
        };
        let text = startup.to_text()?;
        assert_eq!(
            text,
            "package_dir = packages\nuser_package_dir = \"my packages\"\nenabled = [basic, vtk]\n"
        );
        assert_eq!(StartupFile::parse(&text)?, startup);
        Ok(())
    }

    #[test]
    fn test_unwritable_values() -> Result<()> {
        let mut startup = StartupFile {
            enabled: Some(vec!["basic".to_owned(), "a\"b".to_owned()]),
            ..Default::default()
        };
        let e = startup.to_text().unwrap_err();
        assert!(matches!(e, Error::Unrepresentable(s) if s == "a\"b"));

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("startup.vtpkg");
        std::fs::write(&path, "enabled = [basic]\n")?;
        startup.base_package = Some("line\nbreak".to_owned());
        assert!(startup.write(&path).is_err());
        // left as it was:
        assert_eq!(std::fs::read_to_string(&path)?, "enabled = [basic]\n");

        startup.base_package = None;
        startup.enabled = Some(vec!["with space".to_owned(), "x#y".to_owned()]);
        let text = startup.to_text()?;
        assert_eq!(StartupFile::parse(&text)?, startup);
        Ok(())
    }
}
