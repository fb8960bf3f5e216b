use stowage::{PackageKey, PackageStore};

pub fn uninstall(store: &dyn PackageStore, packages: &[String]) -> Result<(), anyhow::Error> {
    for spec in packages {
        let key: PackageKey = spec.parse()?;
        println!("Uninstalling {}", &key);
        let status = store.uninstall(&key)?;
        println!("{}", status);
    }
    Ok(())
}
