use std::process::ExitCode;

use clap::Parser;
use deplock::{
    cli::args::{CliArgs, Command},
    Deplock, DeplockBuilder,
};
use log::{error, info};

fn builder(cli_args: &CliArgs) -> DeplockBuilder {
    let mut builder = Deplock::builder()
        .root(&cli_args.root)
        .resolution_file_name(&cli_args.resolution_location);
    if let Some(config_location) = &cli_args.config_location {
        builder = builder.config_file_name(config_location);
    }
    if let Some(lock_directory) = &cli_args.lock_directory {
        builder = builder.lock_directory_name(lock_directory);
    }
    builder
}

async fn run() -> anyhow::Result<()> {
    let cli_args = CliArgs::parse();
    let builder = builder(&cli_args);

    match cli_args.cmd {
        Command::Validate {
            strict,
            upgrade_modules,
            dry_run,
        } => {
            let mut builder = builder;
            if strict {
                builder = builder.strict(true);
            }
            for module in upgrade_modules {
                builder = builder.upgrade_module(module);
            }
            let plan = builder.try_build()?.validate(dry_run).await?;
            info!("Validated {} scopes", plan.actions().len());
        }
        Command::Lock { dry_run } => {
            let plan = builder.try_build()?.lock(dry_run).await?;
            info!("Locked {} scopes", plan.pending_writes());
        }
        Command::Show { scope } => {
            let deplock = builder.try_build()?;
            match deplock.show(&scope)? {
                Some(record) => {
                    for entry in record.iter() {
                        println!("{entry}");
                    }
                }
                None => info!(
                    "Scope {} has no lock file in {}",
                    scope,
                    deplock.lock_directory().display()
                ),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
