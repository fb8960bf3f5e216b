use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::package_store::{InstallOpts, PackageStore};
use crate::PackageKey;

pub mod install;
pub mod uninstall;

use self::install::InstallError;
use self::uninstall::UninstallError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    NotInstalled,
    UpToDate,
    RequiresUpdate,
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                PackageStatus::NotInstalled => "Not installed",
                PackageStatus::UpToDate => "Up to date",
                PackageStatus::RequiresUpdate => "Requires update",
            }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PackageStatusError {
    #[error("Error parsing version")]
    ParsingVersion,

    #[error("Error reading installed package metadata")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PackageDependencyError {
    #[error("Package '{0}' not found")]
    PackageNotFound(String),

    #[error("Could not read dependency info for package '{0}'")]
    ArchiveUnreadable(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageAction {
    pub key: PackageKey,
    pub action: PackageActionType,
}

impl fmt::Display for PackageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageAction")
            .field("key", &self.key.to_string())
            .field("action", &self.action)
            .finish()
    }
}

impl PackageAction {
    pub fn install(key: PackageKey) -> PackageAction {
        PackageAction {
            key,
            action: PackageActionType::Install,
        }
    }

    pub fn uninstall(key: PackageKey) -> PackageAction {
        PackageAction {
            key,
            action: PackageActionType::Uninstall,
        }
    }

    #[inline]
    pub fn is_install(&self) -> bool {
        self.action == PackageActionType::Install
    }

    #[inline]
    pub fn is_uninstall(&self) -> bool {
        self.action == PackageActionType::Uninstall
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageActionType {
    Install,
    Uninstall,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionOpts {
    /// Reinstall even when the package is already up to date. Also the
    /// escape hatch for installations whose RECORD has gone missing.
    pub force_reinstall: bool,
    /// Do not collate dependencies of packages being installed.
    pub no_deps: bool,
}

#[derive(Debug)]
pub enum TransactionEvent {
    Uninstalling,
    Installing,
}

#[derive(Debug, thiserror::Error)]
pub enum PackageTransactionError {
    #[error("No package found in cache for key: {0}")]
    NoPackage(String),

    #[error(transparent)]
    Deps(#[from] PackageDependencyError),

    #[error("Package {0} cannot be both installed and uninstalled")]
    ActionContradiction(String),

    #[error("Could not determine status for a package in the transaction")]
    InvalidStatus(#[from] PackageStatusError),
}

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("User cancelled")]
    UserCancelled,

    #[error(transparent)]
    Uninstall(#[from] UninstallError),

    #[error(transparent)]
    Install(#[from] InstallError),
}

fn process_install_action(
    store: &Arc<dyn PackageStore>,
    action: &PackageAction,
    new_actions: &mut Vec<PackageAction>,
) -> Result<(), PackageTransactionError> {
    let dependencies = store.dependencies(&action.key)?;

    for dependency in dependencies.into_iter() {
        if new_actions.iter().any(|x| x.key.name == dependency) {
            continue;
        }

        let dep_key = store
            .resolve(&PackageKey::unversioned(&dependency))
            .ok_or_else(|| PackageDependencyError::PackageNotFound(dependency.clone()))?;

        let status = store.status(&dep_key)?;
        if status == PackageStatus::NotInstalled {
            new_actions.push(PackageAction::install(dep_key));
        }
    }

    Ok(())
}

pub struct PackageTransaction {
    store: Arc<dyn PackageStore>,
    actions: Arc<Vec<PackageAction>>,
    opts: TransactionOpts,
}

impl fmt::Debug for PackageTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageTransaction")
            .field("actions", &self.actions)
            .field("opts", &self.opts)
            .finish()
    }
}

impl PackageTransaction {
    pub fn new(
        store: Arc<dyn PackageStore>,
        actions: Vec<PackageAction>,
        opts: TransactionOpts,
    ) -> Result<PackageTransaction, PackageTransactionError> {
        let mut new_actions: Vec<PackageAction> = vec![];

        log::debug!("New transaction with actions: {:#?}", &actions);

        // Collate all dependencies
        for action in actions.into_iter() {
            let action = if action.is_install() {
                let key = store
                    .resolve(&action.key)
                    .ok_or_else(|| PackageTransactionError::NoPackage(action.key.to_string()))?;
                let action = PackageAction::install(key);
                if !opts.no_deps {
                    process_install_action(&store, &action, &mut new_actions)?;
                }
                action
            } else {
                action
            };

            if let Some(found_action) = new_actions.iter().find(|x| x.key.name == action.key.name) {
                if found_action.action != action.action {
                    return Err(PackageTransactionError::ActionContradiction(
                        action.key.to_string(),
                    ));
                }
            } else {
                new_actions.push(action);
            }
        }

        // Check for contradictions
        let mut installs = HashSet::new();
        let mut uninstalls = HashSet::new();

        for action in new_actions.iter() {
            if action.is_install() {
                installs.insert(&action.key.name);
            } else {
                uninstalls.insert(&action.key.name);
            }
        }

        let contradictions = installs.intersection(&uninstalls).collect::<HashSet<_>>();
        if !contradictions.is_empty() {
            return Err(PackageTransactionError::ActionContradiction(format!(
                "{:?}",
                contradictions
            )));
        }

        // Drop actions that are no-ops for the current status
        let new_actions = new_actions
            .into_iter()
            .try_fold(vec![], |mut out, action| {
                let status = store.status(&action.key)?;

                let is_valid = if action.is_install() {
                    opts.force_reinstall || status != PackageStatus::UpToDate
                } else {
                    status != PackageStatus::NotInstalled
                };

                if is_valid {
                    out.push(action);
                } else {
                    log::debug!("Skipping no-op action: {}", &action);
                }

                Ok::<_, PackageTransactionError>(out)
            })?;

        log::debug!("Processed actions: {:#?}", &new_actions);

        Ok(PackageTransaction {
            store,
            actions: Arc::new(new_actions),
            opts,
        })
    }

    pub fn actions(&self) -> Arc<Vec<PackageAction>> {
        Arc::clone(&self.actions)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs the transaction on a worker thread. The progress callback is
    /// invoked before each action; returning `false` cancels the
    /// transaction.
    pub fn process<F>(&self, progress: F) -> JoinHandle<Result<(), TransactionError>>
    where
        F: Fn(PackageKey, TransactionEvent) -> bool + 'static + Send,
    {
        log::debug!("beginning transaction process");
        let store = Arc::clone(&self.store);
        let actions: Arc<Vec<PackageAction>> = Arc::clone(&self.actions);
        let opts = self.opts;

        std::thread::spawn(move || {
            for action in actions.iter() {
                log::debug!("processing action: {}", &action);

                match action.action {
                    PackageActionType::Install => {
                        if !progress(action.key.clone(), TransactionEvent::Installing) {
                            return Err(TransactionError::UserCancelled);
                        }
                        let install_opts = InstallOpts {
                            force: opts.force_reinstall,
                        };
                        if let Err(e) = store.install(&action.key, install_opts) {
                            log::error!("{:?}", &e);
                            return Err(TransactionError::Install(e));
                        }
                    }
                    PackageActionType::Uninstall => {
                        if !progress(action.key.clone(), TransactionEvent::Uninstalling) {
                            return Err(TransactionError::UserCancelled);
                        }
                        if let Err(e) = store.uninstall(&action.key) {
                            log::error!("{:?}", &e);
                            return Err(TransactionError::Uninstall(e));
                        }
                    }
                }
            }

            Ok(())
        })
    }
}
