use anyhow::Result;

use util::HashSet;

use crate::{Error, Package, Registry};

/// Packages held in memory. Initialization does nothing except record
/// the call, unless the package was marked as failing.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    packages: Vec<Package>,
    failing: HashSet<String>,
    unmet: HashSet<String>,
    initialized: Vec<String>,
    finalized: Vec<String>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package, replacing any earlier one with the same codepath.
    pub fn add(&mut self, package: Package) -> &mut Self {
        match self.packages.iter_mut().find(|p| p.codepath == package.codepath) {
            Some(existing) => *existing = package,
            None => self.packages.push(package),
        }
        self
    }

    /// Make initialization of `codepath` fail.
    pub fn fail_initialization(&mut self, codepath: impl Into<String>) -> &mut Self {
        self.failing.insert(codepath.into());
        self
    }

    /// Make the requirement check of `codepath` fail.
    pub fn fail_requirements(&mut self, codepath: impl Into<String>) -> &mut Self {
        self.unmet.insert(codepath.into());
        self
    }

    /// Codepaths passed to `initialize`, in call order.
    pub fn initialized(&self) -> &[String] {
        &self.initialized
    }

    /// Codepaths passed to `finalize`, in call order.
    pub fn finalized(&self) -> &[String] {
        &self.finalized
    }
}

impl Registry for MemoryRegistry {
    fn available(&self) -> Result<Vec<String>> {
        Ok(self.packages.iter().map(|p| p.codepath.clone()).collect())
    }

    fn load(&mut self, codepath: &str) -> Result<Package> {
        self.packages
            .iter()
            .find(|p| p.codepath == codepath)
            .cloned()
            .ok_or_else(|| Error::NotFound(codepath.to_owned()).into())
    }

    fn check_requirements(&self, package: &Package) -> Result<()> {
        if self.unmet.contains(&package.codepath) {
            let what = format!("requirements of {}", package.codepath);
            Err(Error::MissingRequirement(package.identifier.clone(), what).into())
        } else {
            Ok(())
        }
    }

    fn initialize(&mut self, package: &Package) -> Result<()> {
        if self.failing.contains(&package.codepath) {
            let reason = "initialization marked as failing".to_owned();
            return Err(Error::InitializationFailed(package.identifier.clone(), reason).into());
        }
        self.initialized.push(package.codepath.clone());
        Ok(())
    }

    fn finalize(&mut self, package: &Package) {
        self.finalized.push(package.codepath.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_registry() -> Result<()> {
        let mut registry = MemoryRegistry::new();
        registry
            .add(Package::new("basic", "org.vistrails.basic"))
            .add(Package::new("vtk", "org.vistrails.vtk"))
            .add(Package::new("basic", "org.vistrails.basic").with_menu_items(["About"]))
            .fail_initialization("vtk");

        assert_eq!(registry.available()?, vec!["basic", "vtk"]);
        let basic = registry.load("basic")?;
        assert_eq!(basic.menu_items, vec!["About"]);
        assert!(registry.load("nope").is_err());

        registry.initialize(&basic)?;
        let vtk = registry.load("vtk")?;
        assert!(registry.initialize(&vtk).is_err());
        assert_eq!(registry.initialized(), ["basic"]);

        registry.finalize(&basic);
        assert_eq!(registry.finalized(), ["basic"]);
        Ok(())
    }
}
