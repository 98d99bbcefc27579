//! Package dependency resolution and lifecycle management.
//!
//! [`DependencyResolver`] keeps the graph of which packages depend on which,
//! and [`PackageManager`] uses it to bring packages from a [`Registry`] up
//! in dependency order, disabling any that fail along with their dependents.

/// Dependency graph over package identifiers
pub mod resolver;
pub use resolver::{DependencyResolver, PackageId};

/// Package lifecycle
pub mod manager;
pub use manager::{InitReport, PackageManager, PackageState, DEFAULT_BASE_PACKAGE};

mod listener;
pub use listener::PackageListener;

pub use registry::{DirRegistry, MemoryRegistry, Package, Registry};

/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Collecting errors during startup
mod errors;
/// Combined command-line and startup file settings
mod settings;
/// Startup configuration file
mod startup;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::{Args, Command};
pub use settings::Settings;

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;

    let log_level = match settings.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    simple_logging::log_to_stderr(log_level);

    // RUN THE THING /////////////////
    let app = App::new(settings);
    app.run()?;

    Ok(())
}
