use anyhow::{Context, Result};
use colored::Colorize;

use registry::DirRegistry;

use crate::args::Command;
use crate::errors::Errors;
use crate::manager::{self, InitReport, PackageManager};
use crate::settings::Settings;
use crate::ui::{ConsoleListener, Ui};

type Manager = PackageManager<DirRegistry>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown package identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("Package '{0}' can't be disabled while other packages depend on it")]
    HasDependents(String),
}

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(&settings);
        Self { settings, ui }
    }

    /// Run the app, using settings to determine which command to run.
    pub fn run(mut self) -> Result<()> {
        if self.ui.verbose {
            eprintln!("Using package directories {:?}", self.settings.package_dirs());
        }
        let registry = DirRegistry::new(self.settings.package_dirs(), self.ui.verbose);
        let mut mgr = PackageManager::new(registry)
            .with_base_package(Some(self.settings.base_package.clone()));
        mgr.add_listener(Box::new(ConsoleListener::new(self.ui.verbose)));

        match self.settings.command.clone() {
            Command::List => self.list(&mut mgr),
            Command::Order => self.order(&mut mgr),
            Command::Init => self.init(&mut mgr),
            Command::Deps { identifier } => self.deps(&mut mgr, &identifier),
            Command::Enable { codepath } => self.enable(&mut mgr, &codepath),
            Command::Disable { codepath } => self.disable(&mut mgr, &codepath),
        }
    }

    /// Whether `codepath` is enabled by the startup file.
    fn enabled_at_startup(&self, codepath: &str) -> bool {
        match &self.settings.enabled {
            Some(enabled) => enabled.iter().any(|c| c == codepath),
            None => true,
        }
    }
}

// STARTUP //////////////////
impl App {
    /// Add every package enabled at startup; failures are collected in `errors`.
    fn add_enabled(&mut self, mgr: &mut Manager, errors: &mut Errors) -> Result<()> {
        let codepaths = match &self.settings.enabled {
            Some(enabled) => enabled.clone(),
            None => mgr
                .available_package_names_list()
                .context("while listing available packages")?,
        };

        self.ui.verbose_progress("Loading package metadata");
        for codepath in &codepaths {
            if let Err(e) = mgr.add_package(codepath) {
                errors.skipped(codepath, e);
            }
        }
        self.ui.done();
        log::debug!("added {} packages", mgr.enabled_package_list().len());
        Ok(())
    }

    /// Add and initialize every package enabled at startup.
    fn startup(&mut self, mgr: &mut Manager, errors: &mut Errors) -> Result<InitReport> {
        self.ui.start_timer();
        self.add_enabled(mgr, errors)?;

        let mut report = mgr.initialize_packages()?;
        for codepath in &report.initialized {
            eprintln!("{} {codepath}", "INIT".green());
        }
        errors.take_failures(&mut report);
        self.ui.print_elapsed("Initializing packages");
        Ok(report)
    }

    /// Print startup errors without failing.
    fn warn_recap(&self, errors: &Errors, label: &str) {
        if let Err(e) = errors.print_recap(label) {
            log::warn!("{e}");
        }
    }

    /// Save the enabled list back to the startup file, if there is one.
    fn save_enabled(&mut self, mgr: &Manager, codepath: &str, enable: bool) -> Result<()> {
        let Some(config) = &self.settings.config else {
            self.ui
                .verbose_msg("No startup file in use; the change will not be remembered.");
            return Ok(());
        };

        let mut enabled = match &self.settings.enabled {
            Some(enabled) => enabled.clone(),
            None => mgr.available_package_names_list()?,
        };
        enabled.retain(|c| c != codepath);
        if enable {
            enabled.push(codepath.to_owned());
        }

        self.settings.startup.enabled = Some(enabled.clone());
        self.settings.startup.write(config)?;
        self.settings.enabled = Some(enabled);
        Ok(())
    }
}

// COMMANDS /////////////////
impl App {
    fn list(&mut self, mgr: &mut Manager) -> Result<()> {
        let codepaths = mgr.available_package_names_list()?;
        if codepaths.is_empty() {
            eprintln!("{}", "No packages found.".yellow());
            return Ok(());
        }
        for codepath in codepaths {
            let status = if self.enabled_at_startup(&codepath) {
                "enabled".green()
            } else {
                "disabled".dimmed()
            };
            match mgr.look_at_available_package(&codepath) {
                Ok(package) => println!(
                    "{codepath:<20} {:<32} {:<10} {status}",
                    package.identifier, package.version
                ),
                Err(e) => println!("{codepath:<20} {} {e:#}", "invalid:".red()),
            }
        }
        Ok(())
    }

    fn order(&mut self, mgr: &mut Manager) -> Result<()> {
        let mut errors = Errors::default();
        self.add_enabled(mgr, &mut errors)?;
        let mut report = mgr.check_dependencies();
        errors.take_failures(&mut report);

        for (i, identifier) in mgr.resolver().resolve_order()?.into_iter().enumerate() {
            let codepath = mgr
                .get_package_by_identifier(identifier)
                .map_or("?", |p| p.codepath.as_str());
            println!("{:>3}. {identifier} ({codepath})", i + 1);
        }

        errors.print_recap("resolving package order")?;
        Ok(())
    }

    fn init(&mut self, mgr: &mut Manager) -> Result<()> {
        let mut errors = Errors::default();
        let report = self.startup(mgr, &mut errors)?;

        eprintln!(
            "\n{} {} packages.",
            "Initialized".green(),
            report.initialized.len()
        );
        self.ui.verbose_progress("Finalizing packages");
        mgr.finalize_packages();
        self.ui.done();

        errors.print_recap("initializing packages")?;
        Ok(())
    }

    fn deps(&mut self, mgr: &mut Manager, identifier: &str) -> Result<()> {
        let mut errors = Errors::default();
        self.add_enabled(mgr, &mut errors)?;
        let mut report = mgr.check_dependencies();
        errors.take_failures(&mut report);
        self.warn_recap(&errors, "checking dependencies");

        let resolver = mgr.resolver();
        if !resolver.has(identifier) {
            return Err(Error::UnknownIdentifier(identifier.to_owned()).into());
        }

        println!("{}", identifier.bold());
        println!("  depends on:");
        for dep in resolver.dependencies(identifier)? {
            println!("    {dep}");
        }
        println!("  required by:");
        for dep in mgr.reverse_dependencies(identifier)? {
            println!("    {dep}");
        }
        let removable = if mgr.can_be_disabled(identifier) {
            "yes".green()
        } else {
            "no".red()
        };
        println!("  can be disabled: {removable}");
        Ok(())
    }

    fn enable(&mut self, mgr: &mut Manager, codepath: &str) -> Result<()> {
        let mut errors = Errors::default();
        self.startup(mgr, &mut errors)?;
        self.warn_recap(&errors, "initializing packages");

        let result = self.enable_one(mgr, codepath);
        mgr.finalize_packages();
        result
    }

    fn enable_one(&mut self, mgr: &mut Manager, codepath: &str) -> Result<()> {
        // fails with `AlreadyEnabled` if startup already brought it up:
        mgr.late_enable_package(codepath)?;
        eprintln!("{} {codepath}", "ENABLED".green());
        self.save_enabled(mgr, codepath, true)
    }

    fn disable(&mut self, mgr: &mut Manager, codepath: &str) -> Result<()> {
        let mut errors = Errors::default();
        self.startup(mgr, &mut errors)?;
        self.warn_recap(&errors, "initializing packages");

        let result = self.disable_one(mgr, codepath);
        mgr.finalize_packages();
        result
    }

    fn disable_one(&mut self, mgr: &mut Manager, codepath: &str) -> Result<()> {
        let identifier = mgr
            .get_package_by_codepath(codepath)
            .map(|p| p.identifier.clone())
            .ok_or_else(|| manager::Error::NotEnabled(codepath.to_owned()))?;

        if !mgr.can_be_disabled(&identifier) {
            eprintln!("{} is required by:", identifier.bold());
            for dep in mgr.reverse_dependencies(&identifier)? {
                eprintln!("  {dep}");
            }
            return Err(Error::HasDependents(codepath.to_owned()).into());
        }

        if !self.ui.confirm(&format!("Disable package {codepath} ({identifier})?"))? {
            return Ok(());
        }
        mgr.late_disable_package(codepath)?;
        eprintln!("{} {codepath}", "DISABLED".yellow());
        self.save_enabled(mgr, codepath, false)
    }
}
