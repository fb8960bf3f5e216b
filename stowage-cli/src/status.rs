use stowage::{PackageKey, PackageStore};

pub fn status(store: &dyn PackageStore, packages: &[String]) -> Result<(), anyhow::Error> {
    if packages.is_empty() {
        println!("No packages specified.");
        return Ok(());
    }

    for spec in packages {
        let key: PackageKey = spec.parse()?;
        match store.status(&key) {
            Ok(x) => println!("{}: {}", &key, x),
            Err(x) => println!("{}: {}", &key, x),
        }
    }

    Ok(())
}
