use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    cli::command_handlers::{do_show, do_validate},
    exchanger::{LockFileHandling, LockingSettings},
    model::{lock::LockRecord, resolved::ResolutionReport},
    storage::DirectoryLockStorage,
    writeback::WriteBackPlan,
};

mod builder;

pub use builder::DeplockBuilder;

pub struct Deplock {
    storage: Arc<DirectoryLockStorage>,
    resolution_file: PathBuf,
    settings: LockingSettings,
}

impl Deplock {
    pub fn builder() -> DeplockBuilder {
        DeplockBuilder::default()
    }

    pub fn settings(&self) -> &LockingSettings {
        &self.settings
    }

    pub fn lock_directory(&self) -> &Path {
        self.storage.directory()
    }

    /// Validates every scope of the resolution report against its lock file,
    /// creating and appending lock files as needed.
    pub async fn validate(&self, dry_run: bool) -> anyhow::Result<WriteBackPlan> {
        self.run(self.settings.clone(), dry_run).await
    }

    /// Regenerates every scope's lock file from the resolution report without validating.
    pub async fn lock(&self, dry_run: bool) -> anyhow::Result<WriteBackPlan> {
        let settings = LockingSettings {
            lock_file_handling: LockFileHandling::UpdateAll,
            ..self.settings.clone()
        };
        self.run(settings, dry_run).await
    }

    /// Reads the lock record of a single scope, `None` if it is not locked.
    pub fn show(&self, scope: &str) -> anyhow::Result<Option<LockRecord>> {
        do_show(self.storage.as_ref(), scope)
    }

    async fn run(&self, settings: LockingSettings, dry_run: bool) -> anyhow::Result<WriteBackPlan> {
        let report = ResolutionReport::from_file(&self.resolution_file).with_context(|| {
            format!(
                "Could not read resolution report {}",
                self.resolution_file.display()
            )
        })?;
        do_validate(settings, self.storage.clone(), report, dry_run).await
    }
}
