use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use xz2::read::XzDecoder;

use crate::cache::ArchiveCache;
use crate::config::{Config, Permission};
use crate::dist_info::metadata::{ArchiveInfo, PackageMetadata};
use crate::dist_info::record::{self, Record, RecordEntry};
use crate::dist_info::DistInfo;
use crate::package_store::{
    ImportError, InstallOpts, InstalledPackage, PackageStore, SharedStoreConfig,
};
use crate::transaction::{
    install::InstallError, uninstall::UninstallError, PackageDependencyError, PackageStatus,
    PackageStatusError,
};
use crate::{cmp, PackageKey};

const STORE_DIR: &str = ".stowage";
const DIST_INFO_DIR: &str = "dist-info";
const LOCK_FILE: &str = ".lock";
const PKGINFO_ENTRY: &str = ".PKGINFO";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Provided path was not a valid prefix destination")]
    InvalidPrefixPath(#[source] std::io::Error),

    #[error("Not a stowage prefix: {0}")]
    NotAPrefix(PathBuf),

    #[error("Create directory failed")]
    CreateDirFailed(#[source] std::io::Error),

    #[error("Error creating or loading config")]
    Config(#[from] crate::config::Error),

    #[error("Error opening the store lock file")]
    Lock(#[source] std::io::Error),
}

/// A package store rooted at a filesystem prefix. Payload files unpack
/// directly under the prefix; bookkeeping lives in `<prefix>/.stowage/`.
pub struct PrefixPackageStore {
    prefix: PathBuf,
    cache: ArchiveCache,
    config: SharedStoreConfig,
    lock: Mutex<fd_lock::RwLock<File>>,
}

impl PrefixPackageStore {
    pub fn open_or_create<P: AsRef<Path>>(prefix_path: P) -> Result<PrefixPackageStore, Error> {
        match Self::open(prefix_path.as_ref()) {
            Ok(v) => return Ok(v),
            Err(e) => match e {
                Error::InvalidPrefixPath(_) | Error::NotAPrefix(_) => {}
                e => return Err(e),
            },
        };

        Self::create(prefix_path)
    }

    pub fn create<P: AsRef<Path>>(prefix_path: P) -> Result<PrefixPackageStore, Error> {
        fs::create_dir_all(&prefix_path).map_err(Error::CreateDirFailed)?;
        let prefix_path = prefix_path
            .as_ref()
            .canonicalize()
            .map_err(Error::InvalidPrefixPath)?;

        let store_dir = prefix_path.join(STORE_DIR);
        fs::create_dir_all(store_dir.join(DIST_INFO_DIR)).map_err(Error::CreateDirFailed)?;

        Self::load(prefix_path, store_dir)
    }

    pub fn open<P: AsRef<Path>>(prefix_path: P) -> Result<PrefixPackageStore, Error> {
        let prefix_path = prefix_path
            .as_ref()
            .canonicalize()
            .map_err(Error::InvalidPrefixPath)?;
        log::debug!("Opening prefix: {:?}", &prefix_path);

        let store_dir = prefix_path.join(STORE_DIR);
        if !store_dir.is_dir() {
            return Err(Error::NotAPrefix(prefix_path));
        }

        Self::load(prefix_path, store_dir)
    }

    fn load(prefix: PathBuf, store_dir: PathBuf) -> Result<PrefixPackageStore, Error> {
        let config = Config::load(&store_dir, Permission::ReadWrite)?;

        let cache =
            ArchiveCache::new(config.settings().cache_dir()).map_err(Error::CreateDirFailed)?;
        fs::create_dir_all(config.settings().tmp_dir()).map_err(Error::CreateDirFailed)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(store_dir.join(LOCK_FILE))
            .map_err(Error::Lock)?;

        Ok(PrefixPackageStore {
            prefix,
            cache,
            config: Arc::new(RwLock::new(config)),
            lock: Mutex::new(fd_lock::RwLock::new(lock_file)),
        })
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn dist_info_root(&self) -> PathBuf {
        self.prefix.join(STORE_DIR).join(DIST_INFO_DIR)
    }

    /// Maps a RECORD path onto the prefix, refusing anything that would
    /// escape it.
    fn record_path_on_disk(&self, rel: &str) -> Option<PathBuf> {
        let rel_path = Path::new(rel);
        if rel_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            log::warn!("Skipping suspicious RECORD path: {}", rel);
            return None;
        }
        Some(self.prefix.join(rel_path))
    }

    /// Best-effort removal of a previous installation's files, used when
    /// installing over an existing package. A missing RECORD does not stop
    /// the overwrite; that is what makes force-reinstall a usable recovery
    /// from a broken installation.
    fn remove_previous(&self, old: DistInfo) -> io::Result<()> {
        match old.record() {
            Ok(old_record) => {
                for entry in &old_record.entries {
                    let path = match self.record_path_on_disk(&entry.path) {
                        Some(p) => p,
                        None => continue,
                    };
                    if path.is_dir() {
                        continue;
                    }
                    match fs::remove_file(&path) {
                        Ok(_) => {}
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => log::warn!("Could not remove {:?}: {}", &path, e),
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "No usable RECORD for {} ({}); overwriting in place",
                    old.name(),
                    e
                );
            }
        }
        old.remove()
    }
}

impl PackageStore for PrefixPackageStore {
    fn config(&self) -> SharedStoreConfig {
        Arc::clone(&self.config)
    }

    fn import(&self, archive_path: &Path) -> Result<PackageKey, ImportError> {
        self.cache.import(archive_path)
    }

    fn resolve(&self, key: &PackageKey) -> Option<PackageKey> {
        let (_, version) = self.cache.find(key).ok().flatten()?;
        Some(PackageKey::new(key.name.clone(), Some(version)))
    }

    fn dependencies(&self, key: &PackageKey) -> Result<Vec<String>, PackageDependencyError> {
        let (archive_path, _) = self
            .cache
            .find(key)
            .map_err(|_| PackageDependencyError::ArchiveUnreadable(key.name.clone()))?
            .ok_or_else(|| PackageDependencyError::PackageNotFound(key.to_string()))?;

        let info = read_archive_info(&archive_path)
            .map_err(|_| PackageDependencyError::ArchiveUnreadable(key.name.clone()))?;

        Ok(info.map(|i| i.requires).unwrap_or_default())
    }

    fn install(
        &self,
        key: &PackageKey,
        _opts: InstallOpts,
    ) -> Result<PackageStatus, InstallError> {
        let mut lock = self.lock.lock().unwrap();
        let _flock = lock.write().map_err(InstallError::Lock)?;

        let (archive_path, version) = self
            .cache
            .find(key)
            .map_err(InstallError::Cache)?
            .ok_or(InstallError::PackageNotInCache)?;
        log::debug!("Installing {}: {:?}", &key, &archive_path);

        if let Some(old) = DistInfo::find(&self.dist_info_root(), &key.name)
            .map_err(InstallError::Metadata)?
        {
            log::debug!("Removing existing installation of {}", &key.name);
            self.remove_previous(old).map_err(InstallError::Metadata)?;
        }

        let file = File::open(&archive_path).map_err(|e| InstallError::InvalidArchive {
            path: archive_path.clone(),
            source: e,
        })?;
        let reader = XzDecoder::new(io::BufReader::new(file));
        let mut archive = tar::Archive::new(reader);

        let mut entries = vec![];
        let mut archive_info: Option<ArchiveInfo> = None;

        let tar_entries = archive.entries().map_err(|e| InstallError::InvalidArchive {
            path: archive_path.clone(),
            source: e,
        })?;

        for entry in tar_entries {
            let mut entry = entry.map_err(|e| InstallError::InvalidArchive {
                path: archive_path.clone(),
                source: e,
            })?;
            let entry_path = entry
                .path()
                .map_err(InstallError::UnpackFailed)?
                .into_owned();

            if entry_path == Path::new(PKGINFO_ENTRY) {
                let mut buf = String::new();
                entry
                    .read_to_string(&mut buf)
                    .map_err(InstallError::UnpackFailed)?;
                archive_info = Some(toml::from_str(&buf).map_err(InstallError::PkgInfo)?);
                continue;
            }

            if !entry
                .unpack_in(&self.prefix)
                .map_err(InstallError::UnpackFailed)?
            {
                continue;
            }

            let rel = normalize_entry_path(&entry_path);
            if rel.is_empty() {
                continue;
            }
            log::trace!("unpacked: {}", &rel);

            if entry.header().entry_type().is_dir() {
                entries.push(RecordEntry::directory(rel));
            } else {
                let on_disk = self.prefix.join(&entry_path);
                let hash = record::file_digest(&on_disk).ok();
                let size = entry.header().size().ok();
                entries.push(RecordEntry {
                    path: rel,
                    hash,
                    size,
                });
            }
        }

        let (name, version, requires) = match archive_info {
            Some(info) => (info.name, info.version, info.requires),
            None => (key.name.clone(), version, vec![]),
        };

        let meta = PackageMetadata {
            name,
            version,
            requires,
            installed_on: chrono::Utc::now(),
        };
        let record = Record { entries };

        DistInfo::create(
            &self.dist_info_root(),
            &meta,
            &record,
            crate::INSTALLER_NAME,
        )
        .map_err(InstallError::Metadata)?;

        Ok(PackageStatus::UpToDate)
    }

    fn uninstall(&self, key: &PackageKey) -> Result<PackageStatus, UninstallError> {
        let mut lock = self.lock.lock().unwrap();
        let _flock = lock.write().map_err(UninstallError::Lock)?;

        let di = DistInfo::find(&self.dist_info_root(), &key.name)
            .map_err(UninstallError::Io)?
            .ok_or(UninstallError::NotInstalled)?;

        if let Some(wanted) = &key.version {
            if di.version_string() != wanted.to_string() {
                return Err(UninstallError::NotInstalled);
            }
        }

        if !di.has_record() {
            let installer = di.installer();
            return Err(UninstallError::RecordMissing {
                name: di.name().to_string(),
                version: di.version_string().to_string(),
                installer,
            });
        }

        let record = di.record().map_err(UninstallError::RecordUnreadable)?;

        // Files first, then directories that emptied out.
        for entry in &record.entries {
            let path = match self.record_path_on_disk(&entry.path) {
                Some(p) => p,
                None => continue,
            };
            if path.is_dir() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(UninstallError::RemoveFailed { path, source: e }),
            }
        }

        let mut dirs: Vec<PathBuf> = record
            .entries
            .iter()
            .filter_map(|x| self.record_path_on_disk(&x.path))
            .filter(|x| x.is_dir())
            .collect();
        // Deepest first, so nested empty directories collapse upwards.
        dirs.sort_by_key(|x| std::cmp::Reverse(x.components().count()));

        for dir in dirs {
            let is_empty = match fs::read_dir(&dir) {
                Ok(mut entries) => entries.next().is_none(),
                Err(_) => false,
            };
            if !is_empty {
                continue;
            }
            fs::remove_dir(&dir)
                .map_err(|e| UninstallError::RemoveFailed { path: dir.clone(), source: e })?;
        }

        let di_path = di.path().to_path_buf();
        di.remove().map_err(|e| UninstallError::RemoveFailed {
            path: di_path,
            source: e,
        })?;

        Ok(PackageStatus::NotInstalled)
    }

    fn status(&self, key: &PackageKey) -> Result<PackageStatus, PackageStatusError> {
        let di = match DistInfo::find(&self.dist_info_root(), &key.name)? {
            Some(v) => v,
            None => return Ok(PackageStatus::NotInstalled),
        };

        let candidate = match self.cache.newest(&key.name)? {
            Some((_, version)) => version,
            // Installed, nothing newer known.
            None => return Ok(PackageStatus::UpToDate),
        };

        let status = cmp::cmp(di.version_string(), &candidate);
        log::debug!("Status for {}: {:?}", &key.name, &status);

        match status {
            Err(PackageStatusError::ParsingVersion) => {
                log::warn!(
                    "Unparseable installed version for {}; treating as up to date",
                    &key.name
                );
                Ok(PackageStatus::UpToDate)
            }
            other => other,
        }
    }

    fn installed_packages(&self) -> Vec<InstalledPackage> {
        let all = match DistInfo::all(&self.dist_info_root()) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Could not enumerate installed packages: {}", e);
                return vec![];
            }
        };

        all.into_iter()
            .map(|di| InstalledPackage {
                name: di.name().to_string(),
                version: di.version_string().to_string(),
                installer: di.installer(),
            })
            .collect()
    }
}

fn normalize_entry_path(path: &Path) -> String {
    let mut parts = vec![];
    for component in path.components() {
        if let Component::Normal(os) = component {
            parts.push(os.to_string_lossy().into_owned());
        }
    }
    parts.join("/")
}

/// Reads the `.PKGINFO` entry out of an archive without unpacking anything.
fn read_archive_info(archive_path: &Path) -> Result<Option<ArchiveInfo>, InstallError> {
    let file = File::open(archive_path).map_err(|e| InstallError::InvalidArchive {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let reader = XzDecoder::new(io::BufReader::new(file));
    let mut archive = tar::Archive::new(reader);

    let entries = archive.entries().map_err(|e| InstallError::InvalidArchive {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| InstallError::InvalidArchive {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        let entry_path = entry.path().map_err(InstallError::UnpackFailed)?;

        if entry_path == Path::new(PKGINFO_ENTRY) {
            let mut buf = String::new();
            entry
                .read_to_string(&mut buf)
                .map_err(InstallError::UnpackFailed)?;
            let info = toml::from_str(&buf).map_err(InstallError::PkgInfo)?;
            return Ok(Some(info));
        }
    }

    Ok(None)
}
