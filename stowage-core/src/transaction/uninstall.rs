use std::io;
use std::path::PathBuf;

use crate::dist_info::record::RecordError;

#[derive(Debug, thiserror::Error)]
pub enum UninstallError {
    #[error("Package is not installed")]
    NotInstalled,

    /// The dist-info directory exists but its RECORD file does not, so the
    /// set of installed files is unknown and nothing can be safely removed.
    #[error("{}", record_missing_message(.name, .version, .installer))]
    RecordMissing {
        name: String,
        version: String,
        installer: Option<String>,
    },

    #[error("Could not read RECORD file")]
    RecordUnreadable(#[source] RecordError),

    #[error("Could not remove {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not acquire the store lock")]
    Lock(#[source] io::Error),

    #[error("IO error")]
    Io(#[source] io::Error),
}

fn record_missing_message(name: &str, version: &str, installer: &Option<String>) -> String {
    match installer {
        Some(tool) if !tool.trim().is_empty() => format!(
            "Cannot uninstall {} {}, RECORD file not found. \
             Hint: The package was installed by {}.",
            name, version, tool
        ),
        _ => format!(
            "Cannot uninstall {} {}, RECORD file not found. \
             You might be able to recover from this via: \
             '{} install --force-reinstall --no-deps {}=={}'.",
            name,
            version,
            crate::INSTALLER_NAME,
            name,
            version
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_missing_without_installer_suggests_reinstall() {
        let err = UninstallError::RecordMissing {
            name: "regex".into(),
            version: "1.10.2".into(),
            installer: None,
        };
        assert_eq!(
            err.to_string(),
            "Cannot uninstall regex 1.10.2, RECORD file not found. \
             You might be able to recover from this via: \
             'stowage install --force-reinstall --no-deps regex==1.10.2'."
        );
    }

    #[test]
    fn record_missing_with_installer_names_it() {
        let err = UninstallError::RecordMissing {
            name: "regex".into(),
            version: "1.10.2".into(),
            installer: Some("conda".into()),
        };
        assert_eq!(
            err.to_string(),
            "Cannot uninstall regex 1.10.2, RECORD file not found. \
             Hint: The package was installed by conda."
        );
    }

    #[test]
    fn blank_installer_falls_back_to_reinstall_hint() {
        let err = UninstallError::RecordMissing {
            name: "regex".into(),
            version: "1.10.2".into(),
            installer: Some("   ".into()),
        };
        assert!(err.to_string().contains("--force-reinstall"));
    }
}
