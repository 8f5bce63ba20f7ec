use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::{
    exchanger::{LockFileHandling, LockingSettings},
    model::ModuleCoordinate,
};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "deplock.toml";

pub struct DeplockConfig {
    pub settings: LockingSettings,
    pub lock_dir: Option<PathBuf>,
}

impl DeplockConfig {
    /// Loads `config_file` if it exists, then `DEPLOCK_*` environment variables on top.
    pub fn load(config_file: &Path, required: bool) -> anyhow::Result<Self> {
        RawConfig::load(Some((config_file, required)), None)?.try_into()
    }
}

impl TryFrom<RawConfig> for DeplockConfig {
    type Error = anyhow::Error;

    fn try_from(raw_config: RawConfig) -> Result<Self, Self::Error> {
        let upgrade_modules = raw_config
            .locking
            .upgrade
            .iter()
            .map(|notation| ModuleCoordinate::from_notation(notation))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            settings: LockingSettings {
                strict: raw_config.locking.strict,
                lock_file_handling: raw_config.locking.mode,
                upgrade_modules,
            },
            lock_dir: raw_config.lockfiles.dir,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    locking: LockingConfig,
    #[serde(default)]
    lockfiles: LockfilesConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct LockingConfig {
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    mode: LockFileHandling,
    #[serde(default)]
    upgrade: Vec<String>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct LockfilesConfig {
    dir: Option<PathBuf>,
}

impl RawConfig {
    fn load(
        file: Option<(&Path, bool)>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some((path, required)) = file {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }
        builder
            .add_source(
                Environment::with_prefix("DEPLOCK")
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("locking.upgrade")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
