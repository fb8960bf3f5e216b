//! Local archive cache. Installs resolve their payloads from here; `import`
//! is how archives get in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use semver::Version;

use crate::package_key::{split_package_stem, PackageKey};
use crate::package_store::ImportError;

pub(crate) const ARCHIVE_EXT: &str = ".tar.xz";

#[derive(Debug)]
pub(crate) struct ArchiveCache {
    dir: PathBuf,
}

impl ArchiveCache {
    pub(crate) fn new<P: AsRef<Path>>(dir: P) -> io::Result<ArchiveCache> {
        fs::create_dir_all(&dir)?;
        Ok(ArchiveCache {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Copies a local archive into the cache under its canonical
    /// `<name>-<version>.tar.xz` name.
    pub(crate) fn import(&self, archive_path: &Path) -> Result<PackageKey, ImportError> {
        let (name, version) = parse_archive_file_name(archive_path)
            .ok_or_else(|| ImportError::UnrecognizedFileName(archive_path.to_path_buf()))?;

        if !archive_path.is_file() {
            return Err(ImportError::NotAnArchive(archive_path.to_path_buf()));
        }

        let dest = self.archive_path(&name, &version);
        log::debug!("Importing {:?} -> {:?}", archive_path, &dest);
        fs::copy(archive_path, &dest)?;

        Ok(PackageKey::new(name, Some(version)))
    }

    pub(crate) fn archive_path(&self, name: &str, version: &Version) -> PathBuf {
        self.dir.join(format!("{}-{}{}", name, version, ARCHIVE_EXT))
    }

    /// Resolves a key against the cache: the exact version when pinned,
    /// otherwise the newest archive for that name.
    pub(crate) fn find(&self, key: &PackageKey) -> io::Result<Option<(PathBuf, Version)>> {
        if let Some(version) = &key.version {
            let path = self.archive_path(&key.name, version);
            if path.is_file() {
                return Ok(Some((path, version.clone())));
            }
            return Ok(None);
        }

        self.newest(&key.name)
    }

    pub(crate) fn newest(&self, name: &str) -> io::Result<Option<(PathBuf, Version)>> {
        let mut best: Option<(PathBuf, Version)> = None;

        if !self.dir.is_dir() {
            return Ok(None);
        }

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let (entry_name, version) = match parse_archive_file_name(&path) {
                Some(v) => v,
                None => continue,
            };
            if entry_name != name {
                continue;
            }
            match &best {
                Some((_, v)) if *v >= version => {}
                _ => best = Some((path, version)),
            }
        }

        Ok(best)
    }
}

fn parse_archive_file_name(path: &Path) -> Option<(String, Version)> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(ARCHIVE_EXT)?;
    split_package_stem(stem)
}
