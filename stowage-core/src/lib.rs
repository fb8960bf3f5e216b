#![deny(unused_must_use)]
#![deny(rust_2018_idioms)]

pub mod config;
pub mod defaults;
pub mod dist_info;
pub mod package_store;
pub mod transaction;

mod cache;
mod cmp;
mod package_key;

pub use self::config::{Config, Permission};
pub use self::package_key::{PackageKey, ParsePackageKeyError};
pub use self::package_store::prefix::PrefixPackageStore;
pub use self::package_store::{InstallOpts, InstalledPackage, PackageStore};
pub use self::transaction::{
    PackageAction, PackageActionType, PackageStatus, PackageTransaction, TransactionOpts,
};

/// Name this tool writes into the INSTALLER file of every package it
/// installs, and the name used in recovery hints.
pub const INSTALLER_NAME: &str = "stowage";
