use std::path::Path;
use std::sync::Arc;

use stowage::transaction::TransactionEvent;
use stowage::{
    PackageAction, PackageKey, PackageStore, PackageTransaction, TransactionOpts,
};

use crate::cli::InstallArgs;

/// Turns each argument into a package key, importing archive paths into the
/// store cache on the way.
fn resolve_specs(
    store: &dyn PackageStore,
    packages: &[String],
) -> Result<Vec<PackageKey>, anyhow::Error> {
    packages
        .iter()
        .map(|spec| -> Result<PackageKey, anyhow::Error> {
            let path = Path::new(spec);
            if path.is_file() {
                let key = store.import(path)?;
                println!("Imported {}", &key);
                return Ok(key);
            }
            let key: PackageKey = spec.parse()?;
            Ok(key)
        })
        .collect()
}

pub fn install(store: Arc<dyn PackageStore>, args: &InstallArgs) -> Result<(), anyhow::Error> {
    let keys = resolve_specs(&*store, &args.packages)?;

    let opts = TransactionOpts {
        force_reinstall: args.force_reinstall,
        no_deps: args.no_deps,
    };

    let transaction = PackageTransaction::new(
        Arc::clone(&store),
        keys.into_iter().map(PackageAction::install).collect(),
        opts,
    )?;

    if transaction.is_empty() {
        println!("Nothing to do.");
        return Ok(());
    }

    transaction
        .process(|key, event| {
            match event {
                TransactionEvent::Installing => println!("Installing {}", &key),
                TransactionEvent::Uninstalling => println!("Uninstalling {}", &key),
            }
            true
        })
        .join()
        .map_err(|_| anyhow::anyhow!("Transaction worker panicked"))??;

    Ok(())
}
