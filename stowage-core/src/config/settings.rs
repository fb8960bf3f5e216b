use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::FileError;
use crate::config::Permission;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsData {
    /// Where imported package archives are kept. Relative to the store
    /// directory when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub tmp_dir: Option<PathBuf>,
}

impl SettingsData {
    fn load<P: AsRef<Path>>(path: P) -> Result<SettingsData, FileError> {
        let file = std::fs::read_to_string(&path)
            .map_err(|e| FileError::Read(e, path.as_ref().to_path_buf()))?;
        let file = toml::from_str(&file)
            .map_err(|e| FileError::FromToml(e, path.as_ref().to_path_buf()))?;
        Ok(file)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FileError> {
        let mut file =
            File::create(&path).map_err(|e| FileError::Write(e, path.as_ref().to_path_buf()))?;
        let b = toml::to_string_pretty(&self)
            .map_err(|e| FileError::ToToml(e, path.as_ref().to_path_buf()))?;
        file.write_all(b.as_bytes())
            .map_err(|e| FileError::Write(e, path.as_ref().to_path_buf()))?;
        Ok(())
    }

    fn create<P: AsRef<Path>>(path: P) -> Result<SettingsData, FileError> {
        let parent = path
            .as_ref()
            .parent()
            .ok_or_else(|| FileError::PathParent(path.as_ref().to_path_buf()))?;
        std::fs::create_dir_all(&parent)
            .map_err(|e| FileError::CreateParentDir(e, parent.to_path_buf()))?;

        let file = Self::default();
        file.save(path)?;
        Ok(file)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    data: SettingsData,
    permission: Permission,
}

impl Settings {
    pub fn read_only() -> Settings {
        Settings {
            path: PathBuf::from("/dev/null"),
            data: SettingsData::default(),
            permission: Permission::ReadOnly,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P, permission: Permission) -> Result<Settings, FileError> {
        let data = SettingsData::load(&path)?;
        Ok(Settings {
            path: path.as_ref().to_path_buf(),
            data,
            permission,
        })
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<Settings, FileError> {
        let data = SettingsData::create(&path)?;
        Ok(Settings {
            path: path.as_ref().to_path_buf(),
            data,
            permission: Permission::ReadWrite,
        })
    }

    pub fn save(&self) -> Result<(), FileError> {
        if self.permission == Permission::ReadOnly {
            return Err(FileError::ReadOnly(self.path.clone()));
        }
        self.data.save(&self.path)
    }

    fn store_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn cache_dir(&self) -> PathBuf {
        match &self.data.cache_dir {
            Some(v) => v.clone(),
            None => self.store_dir().join("cache"),
        }
    }

    pub fn tmp_dir(&self) -> PathBuf {
        match &self.data.tmp_dir {
            Some(v) => v.clone(),
            None => self.store_dir().join("tmp"),
        }
    }

    pub fn set_cache_dir(&mut self, path: Option<PathBuf>) -> Result<(), FileError> {
        self.data.cache_dir = path;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let settings = Settings::create(&path).unwrap();
        assert_eq!(settings.cache_dir(), dir.path().join("cache"));

        let loaded = Settings::load(&path, Permission::ReadOnly).unwrap();
        assert_eq!(loaded.cache_dir(), dir.path().join("cache"));
    }

    #[test]
    fn read_only_settings_refuse_to_save() {
        let mut settings = Settings::read_only();
        assert!(matches!(
            settings.set_cache_dir(Some(PathBuf::from("/tmp/x"))),
            Err(FileError::ReadOnly(_))
        ));
    }
}
