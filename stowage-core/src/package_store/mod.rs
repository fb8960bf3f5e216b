pub mod prefix;

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::Config;
use crate::transaction::{install::InstallError, uninstall::UninstallError};
use crate::transaction::{PackageDependencyError, PackageStatus, PackageStatusError};
use crate::PackageKey;

pub type SharedStoreConfig = Arc<RwLock<Config>>;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not a package archive: {0}")]
    NotAnArchive(PathBuf),

    #[error("Could not determine package name and version from file name: {0}")]
    UnrecognizedFileName(PathBuf),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOpts {
    /// Overwrite an existing installation, even a broken one whose RECORD
    /// is missing.
    pub force: bool,
}

/// One installed package, as listed by `installed_packages`.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub installer: Option<String>,
}

pub trait PackageStore: Send + Sync {
    fn config(&self) -> SharedStoreConfig;

    /// Copies a local archive into the store cache so it can be installed
    /// by name.
    fn import(&self, archive_path: &Path) -> Result<PackageKey, ImportError>;

    /// Resolves a key against the cache, pinning the version that an
    /// install would use.
    fn resolve(&self, key: &PackageKey) -> Option<PackageKey>;

    /// Names of the packages an archive requires.
    fn dependencies(&self, key: &PackageKey) -> Result<Vec<String>, PackageDependencyError>;

    fn install(&self, key: &PackageKey, opts: InstallOpts)
        -> Result<PackageStatus, InstallError>;

    fn uninstall(&self, key: &PackageKey) -> Result<PackageStatus, UninstallError>;

    fn status(&self, key: &PackageKey) -> Result<PackageStatus, PackageStatusError>;

    fn installed_packages(&self) -> Vec<InstalledPackage>;
}
