//! Reconciliation of a scope's lock record with its resolution result.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{
    exchanger::LockFileHandling,
    model::{
        lock::{LockEntry, LockRecord},
        resolved::ResolvedModules,
        ModuleCoordinate,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationState {
    /// The lock matches the resolution result.
    Valid,
    /// At least one lock entry disagrees with the resolution result.
    Invalid,
    /// The lock matches, but new modules were resolved that are not locked yet.
    ValidAppended,
    /// No lock exists for the scope.
    NoLock,
}

/// A lock entry that failed its check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockMismatch {
    #[error("lock contained '{entry}' but it is not part of the resolved modules")]
    Orphaned { entry: LockEntry },
    #[error(
        "lock expected '{entry}' but resolution result was '{}:{resolved_version}'",
        .entry.coordinate()
    )]
    VersionMismatch {
        entry: LockEntry,
        resolved_version: String,
    },
}

impl LockMismatch {
    pub fn entry(&self) -> &LockEntry {
        match self {
            LockMismatch::Orphaned { entry } => entry,
            LockMismatch::VersionMismatch { entry, .. } => entry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    state: ValidationState,
    errors: Vec<LockMismatch>,
    extra_modules: BTreeSet<ModuleCoordinate>,
}

impl ValidationResult {
    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Mismatches in lock record order. Empty unless the state is [`ValidationState::Invalid`].
    pub fn errors(&self) -> &[LockMismatch] {
        &self.errors
    }

    /// Resolved coordinates the lock record does not name.
    pub fn extra_modules(&self) -> &BTreeSet<ModuleCoordinate> {
        &self.extra_modules
    }

    pub fn into_errors(self) -> Vec<LockMismatch> {
        self.errors
    }
}

/// Classifies `modules` against the scope's lock record.
///
/// Modules in `upgrade_modules` are exempt from the version check only; a
/// locked upgrade module that is no longer resolved is still reported.
pub fn validate(
    mode: LockFileHandling,
    modules: &ResolvedModules,
    lock: Option<&LockRecord>,
    upgrade_modules: &BTreeSet<ModuleCoordinate>,
) -> ValidationResult {
    let mut extra_modules = modules.coordinate_set();

    let lock = match (lock, mode) {
        (None, _) => {
            return ValidationResult {
                state: ValidationState::NoLock,
                errors: Vec::new(),
                extra_modules,
            }
        }
        (Some(_), LockFileHandling::UpdateAll) => {
            return ValidationResult {
                state: ValidationState::Valid,
                errors: Vec::new(),
                extra_modules,
            }
        }
        (Some(lock), LockFileHandling::Default) => lock,
    };

    let mut errors = Vec::new();
    for entry in lock.iter() {
        let coordinate = entry.coordinate();
        extra_modules.remove(coordinate);
        match modules.get(coordinate) {
            None => errors.push(LockMismatch::Orphaned {
                entry: entry.clone(),
            }),
            Some(version)
                if !upgrade_modules.contains(coordinate) && !entry.matches_version(version) =>
            {
                errors.push(LockMismatch::VersionMismatch {
                    entry: entry.clone(),
                    resolved_version: version.to_string(),
                })
            }
            Some(_) => {}
        }
    }

    let state = if !errors.is_empty() {
        ValidationState::Invalid
    } else if modules.len() > lock.len() {
        ValidationState::ValidAppended
    } else {
        ValidationState::Valid
    };

    ValidationResult {
        state,
        errors,
        extra_modules,
    }
}
