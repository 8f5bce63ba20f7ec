//! Decides which scope locks get written once every scope of a build was validated.

use log::{debug, info};
use thiserror::Error;

use crate::{
    exchanger::{LockFileHandling, LockingSession},
    model::{lock::LockRecord, ScopeName},
    storage::{LockStorage, StorageError},
    validation::ValidationState,
};

#[derive(Error, Debug)]
pub enum WriteBackError {
    #[error("Locking strict mode: no lock state for {}", join(.0))]
    NotLocked(Vec<ScopeName>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn join(scopes: &[ScopeName]) -> String {
    scopes
        .iter()
        .map(ScopeName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAction {
    /// The scope had no lock yet.
    Create(LockRecord),
    /// New modules were resolved next to a matching lock.
    Append(LockRecord),
    /// The lock is rebuilt from the resolution result.
    Regenerate(LockRecord),
    Untouched,
}

impl WriteAction {
    pub fn record(&self) -> Option<&LockRecord> {
        match self {
            WriteAction::Create(record)
            | WriteAction::Append(record)
            | WriteAction::Regenerate(record) => Some(record),
            WriteAction::Untouched => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBackPlan {
    actions: Vec<(ScopeName, WriteAction)>,
}

impl WriteBackPlan {
    /// Actions per scope, ordered by scope name.
    pub fn actions(&self) -> &[(ScopeName, WriteAction)] {
        &self.actions
    }

    pub fn pending_writes(&self) -> usize {
        self.actions
            .iter()
            .filter(|(_, action)| action.record().is_some())
            .count()
    }
}

/// Plans the lock writes for every scope reported to `session`.
///
/// Valid scopes resolving an upgrade module are rewritten so the lock picks up
/// the upgraded version. In strict mode, scopes without a lock fail the build
/// instead of getting one.
pub fn plan(session: &LockingSession) -> Result<WriteBackPlan, WriteBackError> {
    let reports = session.scope_reports();

    if session.is_strict() && session.lock_file_handling() == LockFileHandling::Default {
        let not_locked: Vec<ScopeName> = reports
            .iter()
            .filter(|(_, report)| report.state == ValidationState::NoLock)
            .map(|(scope, _)| scope.clone())
            .collect();
        if !not_locked.is_empty() {
            return Err(WriteBackError::NotLocked(not_locked));
        }
    }

    let actions = reports
        .into_iter()
        .map(|(scope, report)| {
            let action = match (session.lock_file_handling(), report.state) {
                (LockFileHandling::UpdateAll, _) => {
                    WriteAction::Regenerate(LockRecord::from_modules(&report.modules))
                }
                (LockFileHandling::Default, ValidationState::NoLock) => {
                    WriteAction::Create(LockRecord::from_modules(&report.modules))
                }
                (LockFileHandling::Default, ValidationState::ValidAppended) => {
                    WriteAction::Append(LockRecord::from_modules(&report.modules))
                }
                (LockFileHandling::Default, ValidationState::Valid)
                    if session
                        .upgrade_modules()
                        .iter()
                        .any(|coordinate| report.modules.contains(coordinate)) =>
                {
                    WriteAction::Regenerate(LockRecord::from_modules(&report.modules))
                }
                (LockFileHandling::Default, ValidationState::Valid | ValidationState::Invalid) => {
                    WriteAction::Untouched
                }
            };
            debug!("Lock write-back for {}: {:?}", scope, action);
            (scope, action)
        })
        .collect();

    Ok(WriteBackPlan { actions })
}

/// Writes every planned lock, returning how many were written.
pub fn apply(plan: &WriteBackPlan, storage: &dyn LockStorage) -> Result<usize, WriteBackError> {
    let mut written = 0;
    for (scope, action) in plan.actions() {
        if let Some(record) = action.record() {
            storage.write_lock(scope, record)?;
            written += 1;
        }
    }
    if written == 0 {
        info!("Lock files are up to date");
    }
    Ok(written)
}
