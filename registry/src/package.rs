use std::path::{Path, PathBuf};

use anyhow::Result;

use syntax::ast::{PackageBlock, Value};
use util::HashMap;

use crate::Error;

/// Value of one package configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Single(String),
    List(Vec<String>),
}

impl From<&Value<'_>> for ConfigValue {
    fn from(val: &Value<'_>) -> Self {
        match val {
            Value::Literal(s) => Self::Single((*s).to_owned()),
            Value::List(items) => Self::List(items.iter().map(|s| (*s).to_owned()).collect()),
        }
    }
}

/// Per-package key/value settings declared in a manifest's `configuration` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: HashMap<String, ConfigValue>,
}

impl Configuration {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Get a single-valued entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(ConfigValue::Single(s)) => Some(s),
            _ => None,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, val: ConfigValue) {
        self.entries.insert(key.into(), val);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key.
    pub fn sorted(&self) -> Vec<(&str, &ConfigValue)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }
}

/// Metadata for a single package.
///
/// The distinction between name, identifier and codepath:
/// the codepath is where the package lives on disk, the identifier is the
/// globally unique id other packages use to depend on it, and the name
/// is only for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub codepath: String,
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub description: String,
    /// Identifiers of packages this one depends on, as declared.
    pub dependencies: Vec<String>,
    /// Menu entries to offer once the package is initialized.
    pub menu_items: Vec<String>,
    /// Files that must exist before the package can be initialized.
    pub requires: Vec<PathBuf>,
    /// Shell command run to initialize the package.
    pub init: Option<String>,
    /// Shell command run when the package is disabled or finalized.
    pub finalize: Option<String>,
    pub configuration: Configuration,
    /// Directory the manifest was found in, if it came from disk.
    pub dir: Option<PathBuf>,
}

impl Package {
    /// Create a package with no dependencies or other metadata;
    /// the display name defaults to the codepath.
    pub fn new(codepath: impl Into<String>, identifier: impl Into<String>) -> Self {
        let codepath = codepath.into();
        Self {
            name: codepath.clone(),
            codepath,
            identifier: identifier.into(),
            version: String::new(),
            description: String::new(),
            dependencies: Vec::with_capacity(0),
            menu_items: Vec::with_capacity(0),
            requires: Vec::with_capacity(0),
            init: None,
            finalize: None,
            configuration: Configuration::default(),
            dir: None,
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_menu_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.menu_items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Build a package from a parsed manifest block.
    /// `dir` is the directory relative paths in the manifest are resolved against.
    pub fn from_block(codepath: &str, block: &PackageBlock, dir: Option<&Path>) -> Result<Self> {
        let mut package = Self::new(codepath, block.identifier);
        package.dir = dir.map(Path::to_path_buf);

        for (field, val) in &block.fields {
            match *field {
                "name" => package.name = single(codepath, field, val)?,
                "version" => package.version = single(codepath, field, val)?,
                "description" => package.description = single(codepath, field, val)?,
                "init" => package.init = Some(single(codepath, field, val)?),
                "finalize" => package.finalize = Some(single(codepath, field, val)?),
                "dependencies" => package.dependencies.extend(owned_list(val)),
                "menu" => package.menu_items.extend(owned_list(val)),
                "requires" => package
                    .requires
                    .extend(val.to_list().into_iter().map(PathBuf::from)),
                _ => {
                    return Err(Error::UnknownField(codepath.to_owned(), (*field).to_owned()).into())
                }
            }
        }

        for (key, val) in &block.configuration {
            package.configuration.set(*key, ConfigValue::from(val));
        }

        log::trace!("loaded package {package:?}");
        Ok(package)
    }

    /// Requirement paths, resolved against the package directory.
    pub fn resolved_requirements(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.requires.iter().map(|path| match &self.dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.clone(),
        })
    }
}

fn single(codepath: &str, field: &str, val: &Value) -> Result<String> {
    match val {
        Value::Literal(s) => Ok((*s).to_owned()),
        Value::List(_) => {
            Err(Error::ExpectedSingleValue(codepath.to_owned(), field.to_owned()).into())
        }
    }
}

fn owned_list(val: &Value) -> Vec<String> {
    val.to_list().into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use syntax::ast::Item;

    fn parse_block(text: &str) -> Result<Package> {
        let items = syntax::parse(text)?;
        match &items[..] {
            [Item::Package(block)] => Package::from_block("vtk", block, Some(Path::new("/pkgs/vtk"))),
            _ => panic!("expected a single package block"),
        }
    }

    #[test]
    fn test_from_block() -> Result<()> {
        let pkg = parse_block(
            "package org.vistrails.vtk {\n  name = VTK\n  version = 0.9.1\n  \
             dependencies = [org.vistrails.spreadsheet]\n  menu = [\"Reload\"]\n  \
             requires = [lib/libvtk.so, /etc/hosts]\n  init = \"./setup.sh\"\n  \
             configuration {\n    offscreen = true\n  }\n}",
        )?;
        assert_eq!(pkg.codepath, "vtk");
        assert_eq!(pkg.identifier, "org.vistrails.vtk");
        assert_eq!(pkg.name, "VTK");
        assert_eq!(pkg.version, "0.9.1");
        assert_eq!(pkg.dependencies, vec!["org.vistrails.spreadsheet"]);
        assert_eq!(pkg.menu_items, vec!["Reload"]);
        assert_eq!(pkg.init.as_deref(), Some("./setup.sh"));
        assert_eq!(pkg.finalize, None);
        assert_eq!(pkg.configuration.get_str("offscreen"), Some("true"));
        let reqs: Vec<PathBuf> = pkg.resolved_requirements().collect();
        assert_eq!(
            reqs,
            vec![
                PathBuf::from("/pkgs/vtk/lib/libvtk.so"),
                PathBuf::from("/etc/hosts")
            ]
        );
        Ok(())
    }

    #[test]
    fn test_name_defaults_to_codepath() -> Result<()> {
        let pkg = parse_block("package org.vistrails.vtk {}")?;
        assert_eq!(pkg.name, "vtk");
        assert!(pkg.dependencies.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_field() {
        let e = parse_block("package p {\n  colour = blue\n}").unwrap_err();
        assert!(matches!(
            e.downcast_ref::<Error>(),
            Some(Error::UnknownField(_, field)) if field == "colour"
        ));
    }

    #[test]
    fn test_list_where_single_expected() {
        let e = parse_block("package p {\n  name = [a, b]\n}").unwrap_err();
        assert!(matches!(
            e.downcast_ref::<Error>(),
            Some(Error::ExpectedSingleValue(_, _))
        ));
    }

    #[test]
    fn test_builder() {
        let pkg = Package::new("spreadsheet", "org.vistrails.spreadsheet")
            .with_dependencies(["org.vistrails.basic"])
            .with_menu_items(vec![String::from("Show")]);
        assert_eq!(pkg.name, "spreadsheet");
        assert_eq!(pkg.dependencies, vec!["org.vistrails.basic"]);
        assert_eq!(pkg.menu_items, vec!["Show"]);
    }
}
