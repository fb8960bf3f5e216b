use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "stowage", about = "Prefix-based package manager")]
pub struct Args {
    /// Path to the package prefix
    #[structopt(long, short = "p", global = true, env = "STOWAGE_PREFIX")]
    pub prefix: Option<PathBuf>,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Create a new prefix
    Init,
    /// Install packages from archives or the store cache
    Install(InstallArgs),
    /// Uninstall installed packages
    Uninstall(UninstallArgs),
    /// Show the status of packages
    Status(StatusArgs),
    /// List installed packages
    List,
}

#[derive(Debug, StructOpt)]
pub struct InstallArgs {
    /// Package archives (.tar.xz) or `name==version` specs
    #[structopt(required = true)]
    pub packages: Vec<String>,

    /// Reinstall even when the package is already installed
    #[structopt(long)]
    pub force_reinstall: bool,

    /// Do not install dependencies
    #[structopt(long)]
    pub no_deps: bool,
}

#[derive(Debug, StructOpt)]
pub struct UninstallArgs {
    /// Packages to uninstall, by name or `name==version`
    #[structopt(required = true)]
    pub packages: Vec<String>,
}

#[derive(Debug, StructOpt)]
pub struct StatusArgs {
    /// Packages to query, by name
    pub packages: Vec<String>,
}
