use clap::Parser;
use eyre::eyre;
use regstore_store::{
    ConfigSource, RegisteredStore, StoreConfig, StoreConfigBuilder, UpdateStrategy,
};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "regstore")]
#[command(about = "Store values under ids and keep a registry of them", long_about = None)]
#[command(version)]
struct Cli {
    /// Storage root (defaults to $REGSTORE_ROOT, then the XDG data directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// How updates replace records (replace, delete-then-create)
    #[arg(long, global = true, value_name = "STRATEGY")]
    update_strategy: Option<UpdateStrategy>,

    /// Do not lock the root while writing
    #[arg(long, global = true)]
    no_coordinate: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> eyre::Result<StoreConfig> {
        let mut builder = StoreConfigBuilder::from_config(StoreConfig::from_env()?);
        let mut overridden = false;

        if let Some(root) = &self.root {
            builder = builder.with_root(root.clone());
            overridden = true;
        }
        if let Some(strategy) = self.update_strategy {
            builder = builder.with_update_strategy(strategy);
            overridden = true;
        }
        if self.no_coordinate {
            builder = builder.with_coordinate_writers(false);
            overridden = true;
        }
        if overridden {
            builder = builder.with_source(ConfigSource::CommandLine);
        }

        Ok(builder.build()?)
    }
}

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    regstore_utils::tracing::init().map_err(|e| eyre!("failed to initialise logging: {e}"))?;

    let cli = Cli::parse();
    let config = cli.config()?;
    tracing::debug!(?config, "opening store");

    let mut store = RegisteredStore::open(config)?;
    if cli.command.execute(&mut store)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
