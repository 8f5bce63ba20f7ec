pub mod cli;
pub mod config;
pub mod exchanger;
pub mod flock;
pub mod model;
pub mod report;
pub mod storage;
pub mod validation;
pub mod writeback;

mod api;

pub use api::{Deplock, DeplockBuilder};
pub use exchanger::{LockFileHandling, LockingSession, LockingSettings};
pub use validation::{validate, ValidationResult, ValidationState};
