mod cli;
mod install;
mod list;
mod status;
mod uninstall;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use structopt::StructOpt;

use cli::{Args, Command};
use stowage::{PackageStore, PrefixPackageStore};

fn prefix_path(args: &Args) -> Result<PathBuf> {
    args.prefix
        .clone()
        .or_else(stowage::defaults::prefix_path)
        .context("No prefix path specified and no default could be determined")
}

fn store(prefix: &PathBuf) -> Result<Arc<dyn PackageStore>> {
    let store = PrefixPackageStore::open(prefix)
        .with_context(|| format!("Could not open prefix at {}", prefix.display()))?;
    Ok(Arc::new(store))
}

fn run(args: Args) -> Result<()> {
    let prefix = prefix_path(&args)?;

    match args.command {
        Command::Init => {
            PrefixPackageStore::create(&prefix)?;
            println!("Created prefix at {}", prefix.display());
        }
        Command::Install(a) => {
            let store = store(&prefix)?;
            install::install(store, &a)?;
        }
        Command::Uninstall(a) => {
            let store = store(&prefix)?;
            uninstall::uninstall(&*store, &a.packages)?;
        }
        Command::Status(a) => {
            let store = store(&prefix)?;
            status::status(&*store, &a.packages)?;
        }
        Command::List => {
            let store = store(&prefix)?;
            list::list(&*store)?;
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::from_args();
    log::debug!("{:?}", &args);

    if let Err(e) = run(args) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
