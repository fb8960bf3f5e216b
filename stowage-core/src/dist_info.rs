//! On-disk metadata for installed packages.
//!
//! Every installed package owns a `<name>-<version>.dist-info` directory
//! containing a `RECORD` file enumerating the files it installed, an
//! `INSTALLER` file naming the tool that performed the installation, and a
//! `METADATA` file with name, version and dependency information.

pub mod metadata;
pub mod record;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use semver::Version;

use crate::package_key::split_package_stem;
use metadata::PackageMetadata;
use record::{Record, RecordError};

pub const RECORD_FILE: &str = "RECORD";
pub const INSTALLER_FILE: &str = "INSTALLER";
pub const METADATA_FILE: &str = "METADATA";
pub const DIST_INFO_SUFFIX: &str = ".dist-info";

/// Handle to one `<name>-<version>.dist-info` directory.
#[derive(Debug, Clone)]
pub struct DistInfo {
    path: PathBuf,
    name: String,
    version: String,
}

impl DistInfo {
    pub fn dir_name(name: &str, version: &Version) -> String {
        format!("{}-{}{}", name, version, DIST_INFO_SUFFIX)
    }

    /// Interprets an existing directory as a dist-info directory, deriving
    /// name and version from the directory name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<DistInfo> {
        let path = path.as_ref();
        let dir_name = path.file_name()?.to_str()?;
        let stem = dir_name.strip_suffix(DIST_INFO_SUFFIX)?;

        let (name, version) = match split_package_stem(stem) {
            Some((name, version)) => (name, version.to_string()),
            // Keep whatever is on either side of the last hyphen so a
            // mangled directory still yields something to report.
            None => match stem.rfind('-') {
                Some(idx) => (stem[..idx].to_string(), stem[idx + 1..].to_string()),
                None => (stem.to_string(), String::new()),
            },
        };

        Some(DistInfo {
            path: path.to_path_buf(),
            name,
            version,
        })
    }

    /// Writes a complete dist-info directory: METADATA, RECORD and
    /// INSTALLER.
    pub fn create(
        root: &Path,
        meta: &PackageMetadata,
        record: &Record,
        installer: &str,
    ) -> io::Result<DistInfo> {
        let path = root.join(Self::dir_name(&meta.name, &meta.version));
        fs::create_dir_all(&path)?;

        meta.save(path.join(METADATA_FILE))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        record
            .save(path.join(RECORD_FILE))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(path.join(INSTALLER_FILE), format!("{}\n", installer))?;

        Ok(DistInfo {
            path,
            name: meta.name.clone(),
            version: meta.version.to_string(),
        })
    }

    /// Finds the dist-info directory for a package name, if any.
    pub fn find(root: &Path, name: &str) -> io::Result<Option<DistInfo>> {
        if !root.is_dir() {
            return Ok(None);
        }

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(di) = DistInfo::from_path(entry.path()) {
                if di.name == name {
                    return Ok(Some(di));
                }
            }
        }

        Ok(None)
    }

    /// Enumerates every dist-info directory under `root`.
    pub fn all(root: &Path) -> io::Result<Vec<DistInfo>> {
        let mut out = vec![];

        if !root.is_dir() {
            return Ok(out);
        }

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(di) = DistInfo::from_path(entry.path()) {
                out.push(di);
            }
        }

        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The installed version as recorded in the directory name. Survives a
    /// missing or unreadable METADATA file, which matters for diagnostics.
    pub fn version_string(&self) -> &str {
        &self.version
    }

    pub fn record_path(&self) -> PathBuf {
        self.path.join(RECORD_FILE)
    }

    pub fn has_record(&self) -> bool {
        self.record_path().is_file()
    }

    pub fn record(&self) -> Result<Record, RecordError> {
        Record::load(self.record_path())
    }

    pub fn metadata(&self) -> Result<PackageMetadata, metadata::MetadataError> {
        PackageMetadata::load(self.path.join(METADATA_FILE))
    }

    /// The recorded installer, if the INSTALLER file exists and is
    /// non-empty after trimming.
    pub fn installer(&self) -> Option<String> {
        let raw = fs::read_to_string(self.path.join(INSTALLER_FILE)).ok()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn remove(self) -> io::Result<()> {
        fs::remove_dir_all(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(name: &str, version: &str) -> PackageMetadata {
        PackageMetadata {
            name: name.to_string(),
            version: Version::parse(version).unwrap(),
            requires: vec![],
            installed_on: Utc::now(),
        }
    }

    #[test]
    fn create_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let record = Record::default();

        DistInfo::create(dir.path(), &meta("regex", "1.10.2"), &record, "stowage").unwrap();

        let di = DistInfo::find(dir.path(), "regex").unwrap().unwrap();
        assert_eq!(di.name(), "regex");
        assert_eq!(di.version_string(), "1.10.2");
        assert!(di.has_record());
        assert_eq!(di.installer().as_deref(), Some("stowage"));

        assert!(DistInfo::find(dir.path(), "other").unwrap().is_none());
    }

    #[test]
    fn blank_installer_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let di = DistInfo::create(dir.path(), &meta("foo", "1.0.0"), &Record::default(), "")
            .unwrap();
        assert_eq!(di.installer(), None);
    }

    #[test]
    fn version_survives_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken-2.1.0.dist-info");
        fs::create_dir_all(&path).unwrap();

        let di = DistInfo::find(dir.path(), "broken").unwrap().unwrap();
        assert_eq!(di.version_string(), "2.1.0");
        assert!(!di.has_record());
        assert!(di.installer().is_none());
    }

    #[test]
    fn hyphenated_names_resolve() {
        let dir = tempfile::tempdir().unwrap();
        DistInfo::create(
            dir.path(),
            &meta("typing-extensions", "4.9.0"),
            &Record::default(),
            "stowage",
        )
        .unwrap();

        let di = DistInfo::find(dir.path(), "typing-extensions")
            .unwrap()
            .unwrap();
        assert_eq!(di.version_string(), "4.9.0");
    }
}
