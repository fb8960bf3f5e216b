use std::path::PathBuf;

use directories::BaseDirs;

/// Default prefix used when none is given on the command line or via the
/// environment.
pub fn prefix_path() -> Option<PathBuf> {
    BaseDirs::new().map(|x| x.data_dir().join("Stowage").join("prefix"))
}
