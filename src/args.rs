use clap::{Parser, Subcommand};

const CMD_NAME: &str = "vtpkg";

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Startup configuration file
    #[arg(short, long, value_name = "FILE")]
    #[arg(env = "VTPKG_CONFIG")]
    pub config: Option<String>,

    /// Standard package directory
    #[arg(short, long, value_name = "DIR")]
    #[arg(env = "VTPKG_PACKAGE_DIR")]
    pub package_dir: Option<String>,

    /// User package directory, searched after the standard one
    #[arg(short, long, value_name = "DIR")]
    #[arg(env = "VTPKG_USER_PACKAGE_DIR")]
    pub user_package_dir: Option<String>,

    /// Bypass user confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print additional info; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List available packages
    List,
    /// Print the order enabled packages would be initialized in
    Order,
    /// Initialize and then finalize all enabled packages
    Init,
    /// Show what a package depends on and what depends on it
    Deps {
        /// Package identifier, e.g. org.vistrails.vtk
        identifier: String,
    },
    /// Enable a package after initializing the enabled ones
    Enable {
        /// Package codepath, i.e. its name in the package directory
        codepath: String,
    },
    /// Disable an enabled package
    Disable {
        /// Package codepath, i.e. its name in the package directory
        codepath: String,
    },
}
