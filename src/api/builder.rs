use std::{env, path::PathBuf, sync::Arc};

use crate::{
    config::{DeplockConfig, DEFAULT_CONFIG_FILE_NAME},
    exchanger::LockFileHandling,
    model::ModuleCoordinate,
    storage::DirectoryLockStorage,
    Deplock,
};

#[derive(Default)]
pub struct DeplockBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    config_file_name: Option<PathBuf>,
    lock_directory_name: Option<PathBuf>,
    resolution_file_name: Option<PathBuf>,

    // Override the loaded configuration
    strict: Option<bool>,
    lock_file_handling: Option<LockFileHandling>,
    upgrade_modules: Vec<ModuleCoordinate>,
}

impl DeplockBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Configuration file. A file set here must exist.
    ///
    /// Defaults to an optional `deplock.toml`.
    pub fn config_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file_name = Some(path.into());
        self
    }

    /// Directory holding one lock file per scope.
    /// It will override `lockfiles.dir` from the configuration.
    ///
    /// Defaults to `dependency-locks`.
    pub fn lock_directory_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_directory_name = Some(path.into());
        self
    }

    /// Resolution report produced by the dependency resolver.
    ///
    /// Defaults to `resolution.toml`.
    pub fn resolution_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolution_file_name = Some(path.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn lock_file_handling(mut self, lock_file_handling: LockFileHandling) -> Self {
        self.lock_file_handling = Some(lock_file_handling);
        self
    }

    /// Exempts a module from the locked version check, in addition to configured ones.
    pub fn upgrade_module(mut self, coordinate: ModuleCoordinate) -> Self {
        self.upgrade_modules.push(coordinate);
        self
    }

    pub fn try_build(self) -> anyhow::Result<Deplock> {
        let Self {
            root,
            config_file_name,
            lock_directory_name,
            resolution_file_name,
            strict,
            lock_file_handling,
            upgrade_modules,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let config = match config_file_name {
            Some(name) => DeplockConfig::load(&root.join(name), true)?,
            None => DeplockConfig::load(&root.join(DEFAULT_CONFIG_FILE_NAME), false)?,
        };

        let mut settings = config.settings;
        if let Some(strict) = strict {
            settings.strict = strict;
        }
        if let Some(lock_file_handling) = lock_file_handling {
            settings.lock_file_handling = lock_file_handling;
        }
        settings.upgrade_modules.extend(upgrade_modules);

        let lock_directory = root.join(
            lock_directory_name
                .or(config.lock_dir)
                .unwrap_or_else(|| PathBuf::from("dependency-locks")),
        );

        let resolution_file =
            root.join(resolution_file_name.unwrap_or_else(|| PathBuf::from("resolution.toml")));

        Ok(Deplock {
            storage: Arc::new(DirectoryLockStorage::new(lock_directory)),
            resolution_file,
            settings,
        })
    }
}
