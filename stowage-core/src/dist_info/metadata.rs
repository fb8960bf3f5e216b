use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Could not read metadata file: {1}")]
    Read(#[source] std::io::Error, PathBuf),

    #[error("Could not write metadata file: {1}")]
    Write(#[source] std::io::Error, PathBuf),

    #[error("Could not convert from TOML format: {1}")]
    FromToml(#[source] toml::de::Error, PathBuf),

    #[error("Could not convert into TOML format: {1}")]
    ToToml(#[source] toml::ser::Error, PathBuf),
}

/// The METADATA file of an installed package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub requires: Vec<String>,
    pub installed_on: DateTime<Utc>,
}

impl PackageMetadata {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PackageMetadata, MetadataError> {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| MetadataError::Read(e, path.as_ref().to_path_buf()))?;
        toml::from_str(&text).map_err(|e| MetadataError::FromToml(e, path.as_ref().to_path_buf()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MetadataError> {
        let text = toml::to_string_pretty(&self)
            .map_err(|e| MetadataError::ToToml(e, path.as_ref().to_path_buf()))?;
        let mut file =
            File::create(&path).map_err(|e| MetadataError::Write(e, path.as_ref().to_path_buf()))?;
        file.write_all(text.as_bytes())
            .map_err(|e| MetadataError::Write(e, path.as_ref().to_path_buf()))?;
        Ok(())
    }
}

/// The `.PKGINFO` entry at the root of a package archive. Consumed during
/// install, never unpacked into the prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("METADATA");

        let meta = PackageMetadata {
            name: "regex".into(),
            version: Version::parse("1.10.2").unwrap(),
            requires: vec!["memchr".into()],
            installed_on: Utc::now(),
        };
        meta.save(&path).unwrap();

        let loaded = PackageMetadata::load(&path).unwrap();
        assert_eq!(loaded.name, "regex");
        assert_eq!(loaded.version, meta.version);
        assert_eq!(loaded.requires, vec!["memchr".to_string()]);
    }

    #[test]
    fn archive_info_defaults_requires() {
        let info: ArchiveInfo = toml::from_str("name = \"foo\"\nversion = \"1.0.0\"\n").unwrap();
        assert!(info.requires.is_empty());
    }
}
