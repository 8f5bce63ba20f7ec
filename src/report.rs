use std::{
    collections::BTreeSet,
    fmt::{Display, Write},
};

use thiserror::Error;

use crate::{
    model::{ModuleCoordinate, ScopeName},
    validation::LockMismatch,
};

/// Builds the message of a failed lock validation, one indented line per error.
pub fn format_out_of_date_message<E: Display>(errors: &[E]) -> String {
    let mut message = String::from("Dependency lock out of date:");
    for error in errors {
        let _ = write!(message, "\n\t{error}");
    }
    message
}

pub fn format_new_modules_notice(extra_modules: &BTreeSet<ModuleCoordinate>) -> String {
    let mut notice = String::from("Dependency lock found new modules:");
    for module in extra_modules {
        let _ = write!(notice, "\n\t{module}");
    }
    notice.push_str("\n\tLock file has been updated with these entries.");
    notice
}

/// The lock of a scope no longer matches its resolution result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", format_out_of_date_message(.errors.as_slice()))]
pub struct LockOutOfDate {
    errors: Vec<LockMismatch>,
}

impl LockOutOfDate {
    pub fn new(errors: Vec<LockMismatch>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[LockMismatch] {
        &self.errors
    }
}

/// Every scope of a build whose lock is out of date.
#[derive(Error, Debug)]
#[error("{}", format_scopes(.0))]
pub struct OutOfDateScopes(pub Vec<(ScopeName, LockOutOfDate)>);

fn format_scopes(scopes: &[(ScopeName, LockOutOfDate)]) -> String {
    scopes
        .iter()
        .map(|(scope, error)| format!("Scope {scope}: {error}"))
        .collect::<Vec<_>>()
        .join("\n")
}
