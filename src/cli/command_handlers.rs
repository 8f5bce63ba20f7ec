use std::sync::Arc;

use anyhow::Context;
use log::{debug, info};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::{
    exchanger::{LockingSession, LockingSettings},
    model::{
        lock::LockRecord,
        resolved::{ResolutionReport, ResolvedScope},
        ScopeName,
    },
    report::{format_new_modules_notice, LockOutOfDate, OutOfDateScopes},
    storage::{LockStorage, StorageError},
    validation::ValidationState,
    writeback::{self, WriteBackPlan},
};

#[derive(Error, Debug)]
enum ScopeError {
    #[error("Scope {scope}: lock out of date")]
    OutOfDate {
        scope: ScopeName,
        #[source]
        source: LockOutOfDate,
    },
    #[error("Scope {scope}: could not access its lock file")]
    Storage {
        scope: ScopeName,
        #[source]
        source: StorageError,
    },
}

/// Validates one resolved scope against its lock and reports the outcome to the session.
fn check_scope(
    session: &LockingSession,
    storage: &dyn LockStorage,
    scope: ResolvedScope,
) -> Result<ValidationState, ScopeError> {
    let modules = scope.modules();
    let lock = storage
        .read_lock(&scope.name)
        .map_err(|source| ScopeError::Storage {
            scope: scope.name.clone(),
            source,
        })?;

    let result = session.validate(&modules, lock.as_ref());
    let state = result.state();
    match state {
        ValidationState::Invalid => {
            return Err(ScopeError::OutOfDate {
                scope: scope.name,
                source: LockOutOfDate::new(result.into_errors()),
            })
        }
        ValidationState::ValidAppended => {
            info!(
                "Scope {}: {}",
                scope.name,
                format_new_modules_notice(result.extra_modules())
            );
        }
        ValidationState::Valid | ValidationState::NoLock => {
            debug!("Scope {} lock state is {:?}", scope.name, state);
        }
    }

    session.report_scope_result(scope.name, modules, state);
    Ok(state)
}

/// Handler to validate command
/// Validates every scope of the resolution report concurrently, fails with all
/// out-of-date scopes at once, then writes the lock files the session asks for.
pub async fn do_validate(
    settings: LockingSettings,
    storage: Arc<dyn LockStorage>,
    report: ResolutionReport,
    dry_run: bool,
) -> anyhow::Result<WriteBackPlan> {
    let session = Arc::new(LockingSession::new(settings));

    let mut tasks = JoinSet::new();
    for scope in report.scopes {
        let session = Arc::clone(&session);
        let storage = Arc::clone(&storage);
        tasks.spawn_blocking(move || check_scope(&session, storage.as_ref(), scope));
    }

    let mut out_of_date = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined.context("Scope validation task failed")? {
            Ok(_) => {}
            Err(ScopeError::OutOfDate { scope, source }) => out_of_date.push((scope, source)),
            Err(err @ ScopeError::Storage { .. }) => return Err(err.into()),
        }
    }

    if !out_of_date.is_empty() {
        out_of_date.sort_by(|(a, _), (b, _)| a.cmp(b));
        return Err(OutOfDateScopes(out_of_date).into());
    }

    let plan = writeback::plan(&session)?;
    if dry_run {
        for (scope, action) in plan.actions() {
            info!("Dry run, would apply {:?} to {}", action, scope);
        }
    } else {
        writeback::apply(&plan, storage.as_ref())?;
    }

    Ok(plan)
}

/// Handler to show command
pub fn do_show(storage: &dyn LockStorage, scope: &str) -> anyhow::Result<Option<LockRecord>> {
    let scope = ScopeName::new(scope)?;
    Ok(storage.read_lock(&scope)?)
}
