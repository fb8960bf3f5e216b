mod settings;

pub use settings::{Settings, SettingsData};

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No default prefix path found for this platform")]
    NoDefaultPrefixPath,

    #[error("Error loading settings.toml file")]
    SettingsFile(#[source] FileError),
}

#[derive(Debug, Error)]
pub enum FileError {
    #[error("The file {0} is read only and could not be written to.")]
    ReadOnly(PathBuf),

    #[error("Could not read file: {1}")]
    Read(#[source] std::io::Error, PathBuf),

    #[error("Could not write file: {1}")]
    Write(#[source] std::io::Error, PathBuf),

    #[error("Could not convert from TOML format: {1}")]
    FromToml(#[source] toml::de::Error, PathBuf),

    #[error("Could not convert into TOML format: {1}")]
    ToToml(#[source] toml::ser::Error, PathBuf),

    #[error("Could not get parent for path: {0}")]
    PathParent(PathBuf),

    #[error("Could not create directory: {1}")]
    CreateParentDir(#[source] std::io::Error, PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone)]
pub struct Config {
    settings: Settings,
}

impl Config {
    pub fn read_only() -> Config {
        Config {
            settings: Settings::read_only(),
        }
    }

    /// Loads the configuration stored inside a store directory, creating a
    /// default `settings.toml` when permitted and none exists.
    pub fn load<P: AsRef<Path>>(store_dir: P, permission: Permission) -> Result<Config, Error> {
        let settings_path = store_dir.as_ref().join("settings.toml");

        let settings = match Settings::load(&settings_path, permission) {
            Ok(v) => v,
            Err(_) if permission != Permission::ReadOnly => {
                Settings::create(&settings_path).map_err(Error::SettingsFile)?
            }
            Err(e) => return Err(Error::SettingsFile(e)),
        };

        let config = Config { settings };

        log::trace!("Config loaded: {:#?}", &config);

        Ok(config)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
