use stowage::PackageStore;

pub fn list(store: &dyn PackageStore) -> Result<(), anyhow::Error> {
    let packages = store.installed_packages();

    if packages.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    for pkg in packages {
        match pkg.installer {
            Some(installer) => println!("{} {} (installed by {})", pkg.name, pkg.version, installer),
            None => println!("{} {}", pkg.name, pkg.version),
        }
    }

    Ok(())
}
