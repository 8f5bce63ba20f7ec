use clap::{Parser, Subcommand};

use crate::model::ModuleCoordinate;

/// Validates dependency lock files against a dependency resolution result.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Project root, all other paths are relative to it
    #[clap(short, long, default_value = ".")]
    pub root: String,
    /// Configuration file [default: deplock.toml if it exists]
    #[clap(short, long)]
    pub config_location: Option<String>,
    /// Directory with one lock file per scope [default: dependency-locks]
    #[clap(short, long)]
    pub lock_directory: Option<String>,
    /// Resolution report produced by the dependency resolver
    #[clap(long, default_value = "resolution.toml")]
    pub resolution_location: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validates every scope against its lock file and records newly resolved modules
    Validate {
        /// Fail scopes that have no lock file yet
        #[clap(long)]
        strict: bool,
        /// Module exempt from the locked version check, as group:artifact
        #[clap(short, long = "upgrade-module")]
        upgrade_modules: Vec<ModuleCoordinate>,
        /// Report what would be written without touching lock files
        #[clap(long)]
        dry_run: bool,
    },
    /// Regenerates every lock file from the resolution report without validating
    Lock {
        #[clap(long)]
        dry_run: bool,
    },
    /// Prints the locked modules of a scope
    Show { scope: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_validate() {
        let args = CliArgs::parse_from([
            "deplock",
            "--lock-directory",
            "locks",
            "validate",
            "--strict",
            "-u",
            "a:b",
            "--upgrade-module",
            "c:d",
        ]);
        assert_eq!(args.lock_directory.as_deref(), Some("locks"));
        match args.cmd {
            Command::Validate {
                strict,
                upgrade_modules,
                dry_run,
            } => {
                assert!(strict);
                assert!(!dry_run);
                assert_eq!(
                    upgrade_modules,
                    vec![ModuleCoordinate::new("a", "b"), ModuleCoordinate::new("c", "d")]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn reject_invalid_upgrade_module() {
        let result = CliArgs::try_parse_from(["deplock", "validate", "-u", "nope"]);
        assert!(result.is_err());
    }
}
