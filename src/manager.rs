use anyhow::{Context, Result};

use registry::{Configuration, Package, Registry};

use crate::listener::PackageListener;
use crate::resolver::{self, DependencyResolver};

/// Identifier of the package every other package implicitly depends on.
pub const DEFAULT_BASE_PACKAGE: &str = "org.vistrails.basic";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Package '{0}' is already enabled")]
    AlreadyEnabled(String),
    #[error("Package '{0}' is not enabled")]
    NotEnabled(String),
    #[error("Package '{0}' was disabled because its dependency '{1}' failed")]
    DependencyFailed(String, String),
}

/// Where a package is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    /// Metadata loaded, not yet in the dependency graph.
    Registered,
    /// In the dependency graph with all of its dependencies linked.
    DependencyChecked,
    Initialized,
    /// Disabled because of an error.
    Failed,
    /// Disabled on request.
    Removed,
}

impl PackageState {
    pub fn is_enabled(self) -> bool {
        matches!(
            self,
            Self::Registered | Self::DependencyChecked | Self::Initialized
        )
    }
}

/// A package that was disabled during startup, and why.
#[derive(Debug)]
pub struct Failure {
    pub codepath: String,
    pub identifier: String,
    pub error: anyhow::Error,
}

/// Outcome of [`PackageManager::initialize_packages`].
#[derive(Debug, Default)]
pub struct InitReport {
    /// Codepaths, in the order they were initialized.
    pub initialized: Vec<String>,
    pub failed: Vec<Failure>,
}

impl InitReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
struct Entry {
    package: Package,
    state: PackageState,
    failure: Option<String>,
}

/// Drives packages from a [`Registry`] through their lifecycle.
///
/// Packages are added by codepath, linked into the dependency graph by
/// identifier, then initialized in dependency order. A package that fails at
/// any stage is disabled along with everything that depends on it; the rest
/// carry on.
pub struct PackageManager<R> {
    registry: R,
    resolver: DependencyResolver,
    /// Every package added so far, including disabled ones, in the order added.
    entries: Vec<Entry>,
    /// Codepaths of initialized packages, in initialization order.
    load_order: Vec<String>,
    base_package: Option<String>,
    listeners: Vec<Box<dyn PackageListener>>,
}

impl<R: Registry> PackageManager<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            resolver: DependencyResolver::new(),
            entries: Vec::with_capacity(16),
            load_order: Vec::with_capacity(16),
            base_package: Some(DEFAULT_BASE_PACKAGE.to_owned()),
            listeners: Vec::with_capacity(1),
        }
    }

    /// Set the package every other package implicitly depends on, or `None` for no such package.
    pub fn with_base_package(mut self, base_package: Option<String>) -> Self {
        self.base_package = base_package;
        self
    }

    pub fn base_package(&self) -> Option<&str> {
        self.base_package.as_deref()
    }

    pub fn add_listener(&mut self, listener: Box<dyn PackageListener>) {
        self.listeners.push(listener);
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Read access to the dependency graph.
    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }
}

// LIFECYCLE ////////////////
impl<R: Registry> PackageManager<R> {
    /// Load metadata for `codepath` and queue it for initialization.
    pub fn add_package(&mut self, codepath: &str) -> Result<()> {
        if self.enabled_index(codepath).is_some() {
            return Err(Error::AlreadyEnabled(codepath.to_owned()).into());
        }
        let package = self
            .registry
            .load(codepath)
            .with_context(|| format!("while loading package '{codepath}'"))?;

        log::info!("added package {codepath} ({})", package.identifier);
        self.entries.retain(|e| e.package.codepath != codepath);
        self.entries.push(Entry {
            package,
            state: PackageState::Registered,
            failure: None,
        });
        Ok(())
    }

    /// Link every added package into the dependency graph without initializing it.
    /// Packages with duplicate identifiers, unknown dependencies or cyclic
    /// dependencies are disabled.
    pub fn check_dependencies(&mut self) -> InitReport {
        let mut report = InitReport::default();
        self.link_pending(&mut report);
        report
    }

    /// Link and initialize every added package, in dependency order.
    pub fn initialize_packages(&mut self) -> Result<InitReport> {
        let mut report = InitReport::default();
        self.link_pending(&mut report);

        let order: Vec<String> = self
            .resolver
            .resolve_order()?
            .into_iter()
            .map(str::to_owned)
            .collect();

        for identifier in order {
            let Some(idx) = self.index_by_identifier(&identifier) else {
                continue;
            };
            if self.entries[idx].state != PackageState::DependencyChecked {
                continue;
            }
            match self.initialize_one(idx) {
                Ok(()) => report.initialized.push(self.entries[idx].package.codepath.clone()),
                Err(e) => self.disable_with_dependents(idx, e, &mut report),
            }
        }

        log::info!(
            "initialized {} packages, {} failed",
            report.initialized.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Add and initialize a single package after startup.
    /// Its dependencies must already be enabled; on failure nothing of it remains.
    pub fn late_enable_package(&mut self, codepath: &str) -> Result<()> {
        self.add_package(codepath)?;
        let idx = self.entries.len() - 1;
        if let Err(e) = self.enable_added(idx) {
            self.entries.remove(idx);
            return Err(e.context(format!("while enabling package '{codepath}'")));
        }
        Ok(())
    }

    /// Finalize and remove an enabled package.
    /// Fails if any other enabled package depends on it.
    pub fn late_disable_package(&mut self, codepath: &str) -> Result<()> {
        let idx = self
            .enabled_index(codepath)
            .ok_or_else(|| Error::NotEnabled(codepath.to_owned()))?;
        self.detach(idx, true)
    }

    /// Remove an enabled package without finalizing it.
    /// Fails if any other enabled package depends on it.
    pub fn remove_package(&mut self, codepath: &str) -> Result<()> {
        let idx = self
            .enabled_index(codepath)
            .ok_or_else(|| Error::NotEnabled(codepath.to_owned()))?;
        self.detach(idx, false)
    }

    /// Finalize every initialized package, most recently initialized first,
    /// and forget all packages.
    pub fn finalize_packages(&mut self) {
        let order = std::mem::take(&mut self.load_order);
        for codepath in order.iter().rev() {
            let Some(entry) = self
                .entries
                .iter()
                .find(|e| e.state == PackageState::Initialized && e.package.codepath == *codepath)
            else {
                continue;
            };
            log::info!("finalizing package {codepath}");
            self.registry.finalize(&entry.package);
            if !entry.package.menu_items.is_empty() {
                for listener in &mut self.listeners {
                    listener.menu_removed(&entry.package.identifier);
                }
            }
        }
        self.entries.clear();
        self.resolver = DependencyResolver::new();
    }

    /// Log an error on behalf of a package and pass it on to listeners.
    pub fn show_error_message(&mut self, identifier: &str, msg: &str) {
        let name = self
            .entries
            .iter()
            .find(|e| e.package.identifier == identifier)
            .map_or(identifier, |e| e.package.name.as_str());
        log::error!("{name} ({identifier}): {msg}");
        for listener in &mut self.listeners {
            listener.error_message(identifier, name, msg);
        }
    }

    fn link_pending(&mut self, report: &mut InitReport) {
        let pending: Vec<usize> = (0..self.entries.len())
            .filter(|&idx| self.entries[idx].state == PackageState::Registered)
            .collect();

        // all vertices first, so packages may depend on ones added after them:
        let mut inserted = Vec::with_capacity(pending.len());
        for idx in pending {
            match self.resolver.insert(&self.entries[idx].package.identifier) {
                Ok(_) => inserted.push(idx),
                Err(e) => self.mark_failed(idx, e.into(), report),
            }
        }

        for idx in inserted {
            // may have been disabled along with one of its dependencies:
            if self.entries[idx].state != PackageState::Registered {
                continue;
            }
            let package = &self.entries[idx].package;
            let deps = dependencies_of(package, self.base_package.as_deref());
            match self.resolver.link(&package.identifier, &deps) {
                Ok(()) => self.entries[idx].state = PackageState::DependencyChecked,
                Err(e) => self.disable_with_dependents(idx, e.into(), report),
            }
        }
    }

    fn enable_added(&mut self, idx: usize) -> Result<()> {
        let package = &self.entries[idx].package;
        let identifier = package.identifier.clone();
        let deps = dependencies_of(package, self.base_package.as_deref());

        self.resolver.insert(&identifier)?;
        if let Err(e) = self.resolver.link(&identifier, &deps) {
            self.resolver.retract(&identifier);
            return Err(e.into());
        }
        self.entries[idx].state = PackageState::DependencyChecked;
        if let Err(e) = self.initialize_one(idx) {
            self.resolver.retract(&identifier);
            return Err(e);
        }
        Ok(())
    }

    fn initialize_one(&mut self, idx: usize) -> Result<()> {
        let package = &self.entries[idx].package;
        self.registry.check_requirements(package)?;
        self.registry.initialize(package)?;

        let entry = &mut self.entries[idx];
        entry.state = PackageState::Initialized;
        log::info!(
            "initialized package {} ({})",
            entry.package.codepath,
            entry.package.identifier
        );
        self.load_order.push(entry.package.codepath.clone());
        if !entry.package.menu_items.is_empty() {
            for listener in &mut self.listeners {
                listener.menu_added(
                    &entry.package.identifier,
                    &entry.package.name,
                    &entry.package.menu_items,
                );
            }
        }
        Ok(())
    }

    fn detach(&mut self, idx: usize, finalize: bool) -> Result<()> {
        let entry = &self.entries[idx];
        let state = entry.state;
        if state != PackageState::Registered {
            self.resolver.remove(&entry.package.identifier)?;
        }
        if finalize && state == PackageState::Initialized {
            log::info!("finalizing package {}", entry.package.codepath);
            self.registry.finalize(&entry.package);
        }

        let entry = &mut self.entries[idx];
        entry.state = PackageState::Removed;
        self.load_order.retain(|c| *c != entry.package.codepath);
        if state == PackageState::Initialized && !entry.package.menu_items.is_empty() {
            for listener in &mut self.listeners {
                listener.menu_removed(&entry.package.identifier);
            }
        }
        log::info!("disabled package {}", entry.package.codepath);
        Ok(())
    }

    /// Disable the package at `idx` and every package that depends on it.
    fn disable_with_dependents(&mut self, idx: usize, error: anyhow::Error, report: &mut InitReport) {
        let identifier = self.entries[idx].package.identifier.clone();
        let dependents: Vec<String> = self
            .resolver
            .transitive_dependents(&identifier)
            .map(|deps| deps.into_iter().map(str::to_owned).collect())
            .unwrap_or_default();

        self.resolver.retract(&identifier);
        self.mark_failed(idx, error, report);

        for dependent in dependents {
            self.resolver.retract(&dependent);
            if let Some(dep_idx) = self.index_by_identifier(&dependent) {
                let codepath = self.entries[dep_idx].package.codepath.clone();
                let e = Error::DependencyFailed(codepath, identifier.clone());
                self.mark_failed(dep_idx, e.into(), report);
            }
        }
    }

    fn mark_failed(&mut self, idx: usize, error: anyhow::Error, report: &mut InitReport) {
        let msg = format!("{error:#}");
        let entry = &mut self.entries[idx];
        log::error!("disabling package {}: {msg}", entry.package.codepath);

        for listener in &mut self.listeners {
            listener.error_message(&entry.package.identifier, &entry.package.name, &msg);
        }
        entry.state = PackageState::Failed;
        entry.failure = Some(msg);
        report.failed.push(Failure {
            codepath: entry.package.codepath.clone(),
            identifier: entry.package.identifier.clone(),
            error,
        });
    }
}

// QUERIES ////////////////
impl<R: Registry> PackageManager<R> {
    /// True if an enabled package has this identifier.
    pub fn has_package(&self, identifier: &str) -> bool {
        self.index_by_identifier(identifier).is_some()
    }

    pub fn get_package_by_codepath(&self, codepath: &str) -> Option<&Package> {
        self.enabled_index(codepath)
            .map(|idx| &self.entries[idx].package)
    }

    pub fn get_package_by_identifier(&self, identifier: &str) -> Option<&Package> {
        self.index_by_identifier(identifier)
            .map(|idx| &self.entries[idx].package)
    }

    pub fn get_package_configuration(&self, codepath: &str) -> Option<&Configuration> {
        self.get_package_by_codepath(codepath)
            .map(|p| &p.configuration)
    }

    /// Enabled packages, in the order they were added.
    pub fn enabled_package_list(&self) -> Vec<&Package> {
        self.entries
            .iter()
            .filter(|e| e.state.is_enabled())
            .map(|e| &e.package)
            .collect()
    }

    /// Codepaths of every package the registry knows about, enabled or not.
    pub fn available_package_names_list(&self) -> Result<Vec<String>> {
        self.registry.available()
    }

    /// Load a package's metadata without adding it.
    pub fn look_at_available_package(&mut self, codepath: &str) -> Result<Package> {
        self.registry.load(codepath)
    }

    /// Find an available package with `identifier`, if there is one.
    /// Packages whose metadata can't be loaded are skipped.
    pub fn identifier_is_available(&mut self, identifier: &str) -> Result<Option<Package>> {
        for codepath in self.registry.available()? {
            match self.registry.load(&codepath) {
                Ok(package) if package.identifier == identifier => return Ok(Some(package)),
                Ok(_) => {}
                Err(e) => log::debug!("skipping {codepath}: {e:#}"),
            }
        }
        Ok(None)
    }

    /// True if nothing enabled depends on `identifier`.
    pub fn can_be_disabled(&self, identifier: &str) -> bool {
        self.resolver.can_be_removed(identifier)
    }

    /// Enabled packages that directly depend on `identifier`.
    pub fn reverse_dependencies(&self, identifier: &str) -> Result<Vec<&str>, resolver::Error> {
        self.resolver.reverse_dependents(identifier)
    }

    /// Every enabled package that depends on `identifier`, directly or not.
    pub fn transitive_reverse_dependencies(
        &self,
        identifier: &str,
    ) -> Result<Vec<&str>, resolver::Error> {
        self.resolver.transitive_dependents(identifier)
    }

    /// Lifecycle state of the package most recently added at `codepath`.
    pub fn state(&self, codepath: &str) -> Option<PackageState> {
        self.entry(codepath).map(|e| e.state)
    }

    /// Why the package at `codepath` was disabled, if it failed.
    pub fn failure(&self, codepath: &str) -> Option<&str> {
        self.entry(codepath).and_then(|e| e.failure.as_deref())
    }

    fn entry(&self, codepath: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.package.codepath == codepath)
    }

    fn enabled_index(&self, codepath: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.state.is_enabled() && e.package.codepath == codepath)
    }

    fn index_by_identifier(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.state.is_enabled() && e.package.identifier == identifier)
    }
}

/// Declared dependencies, plus the base package unless this is the base package.
fn dependencies_of(package: &Package, base_package: Option<&str>) -> Vec<String> {
    let mut deps = Vec::with_capacity(package.dependencies.len() + 1);
    if let Some(base) = base_package {
        if package.identifier != base && !package.dependencies.iter().any(|d| d == base) {
            deps.push(base.to_owned());
        }
    }
    deps.extend(package.dependencies.iter().cloned());
    deps
}
