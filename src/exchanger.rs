use std::collections::BTreeSet;

use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    model::{lock::LockRecord, resolved::ResolvedModules, ModuleCoordinate, ScopeName},
    validation::{self, ValidationResult, ValidationState},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockFileHandling {
    /// Validate against existing locks and append newly resolved modules.
    #[default]
    Default,
    /// Regenerate every lock from the current resolution without validating.
    UpdateAll,
}

/// Locking configuration of a build, fixed before any scope is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockingSettings {
    /// Fail scopes that have no lock instead of creating one.
    pub strict: bool,
    pub lock_file_handling: LockFileHandling,
    /// Modules exempt from the locked version check.
    pub upgrade_modules: BTreeSet<ModuleCoordinate>,
}

/// Outcome of one scope's validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeReport {
    pub modules: ResolvedModules,
    pub state: ValidationState,
}

/// Build-wide locking state shared by every scope resolved in the build.
///
/// Settings can only change through `&mut self`, so once the session is
/// shared they are read-only. Reports are accepted concurrently.
#[derive(Debug)]
pub struct LockingSession {
    settings: LockingSettings,
    reports: DashMap<ScopeName, ScopeReport>,
}

impl LockingSession {
    pub fn new(settings: LockingSettings) -> Self {
        Self {
            settings,
            reports: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &LockingSettings {
        &self.settings
    }

    pub fn lock_file_handling(&self) -> LockFileHandling {
        self.settings.lock_file_handling
    }

    pub fn upgrade_modules(&self) -> &BTreeSet<ModuleCoordinate> {
        &self.settings.upgrade_modules
    }

    pub fn is_strict(&self) -> bool {
        self.settings.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.settings.strict = strict;
    }

    /// Validates a scope with this session's lock handling and upgrade modules.
    pub fn validate(
        &self,
        modules: &ResolvedModules,
        lock: Option<&LockRecord>,
    ) -> ValidationResult {
        validation::validate(
            self.settings.lock_file_handling,
            modules,
            lock,
            &self.settings.upgrade_modules,
        )
    }

    pub fn report_scope_result(
        &self,
        scope: ScopeName,
        modules: ResolvedModules,
        state: ValidationState,
    ) {
        debug!("Scope {} resolved with lock state {:?}", scope, state);
        if let Some(previous) = self
            .reports
            .insert(scope.clone(), ScopeReport { modules, state })
        {
            warn!(
                "Scope {} was reported more than once, replacing earlier state {:?}",
                scope, previous.state
            );
        }
    }

    pub fn scope_report(&self, scope: &ScopeName) -> Option<ScopeReport> {
        self.reports.get(scope).map(|report| report.value().clone())
    }

    /// All reported scopes, ordered by name.
    pub fn scope_reports(&self) -> Vec<(ScopeName, ScopeReport)> {
        let mut reports: Vec<(ScopeName, ScopeReport)> = self
            .reports
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        reports.sort_by(|(a, _), (b, _)| a.cmp(b));
        reports
    }

    pub fn reported_scope_count(&self) -> usize {
        self.reports.len()
    }
}
