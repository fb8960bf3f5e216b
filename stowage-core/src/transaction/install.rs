use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Package not found in cache (not imported?)")]
    PackageNotInCache,

    #[error("Could not read the archive cache")]
    Cache(#[source] io::Error),

    #[error("Invalid package archive: {path}")]
    InvalidArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid package info in archive")]
    PkgInfo(#[source] toml::de::Error),

    #[error("Could not unpack archive entry")]
    UnpackFailed(#[source] io::Error),

    #[error("Could not write package metadata")]
    Metadata(#[source] io::Error),

    #[error("Could not acquire the store lock")]
    Lock(#[source] io::Error),
}
