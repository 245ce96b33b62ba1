use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use contractor_estimator::{
    domain::{FieldCatalog, FieldDefinition, Trade, TradeCriteria},
    util::{persistence, version},
    App, Config, ConfigOverrides, EstimateRequest,
};

const DEFAULT_LOG_FILTER: &str = "contractor_estimator=info,estimator=info";

#[derive(Parser)]
#[command(name = "estimator", version = env!("CARGO_PKG_VERSION"), about = "Contractor cost estimating engine")]
struct Cli {
    #[command(flatten)]
    overrides: ConfigOverrides,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Price a job for one trade at a ZIP code.
    Estimate {
        trade: String,
        zip: String,
        /// Criteria as key=value, e.g. `-f squareFeet=1800 -f tearOff=true`.
        #[arg(short = 'f', long = "field")]
        fields: Vec<String>,
        /// Read criteria from a JSON object instead.
        #[arg(long, conflicts_with = "fields")]
        criteria_file: Option<PathBuf>,
    },
    /// Resolve (and cache) the regional pricing profile for a ZIP code.
    Resolve { zip: String },
    /// Refresh every county-seat ZIP now.
    Refresh,
    /// Delete expired pricing profiles.
    Cleanup,
    /// Cache statistics.
    Stats,
    /// List input fields, for one trade or all of them.
    Fields { trade: Option<Trade> },
    /// Run the weekly refresh and daily cleanup until interrupted.
    Serve,
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings.
    Show,
    /// Write the effective settings to the config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.overrides).context("loading configuration")?;

    match cli.command {
        Command::Config(command) => run_config(command, config, cli.overrides.config),
        Command::Fields { trade } => list_fields(trade),
        Command::Estimate {
            trade,
            zip,
            fields,
            criteria_file,
        } => {
            let criteria = match criteria_file {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
                }
                None => TradeCriteria::from_pairs(&fields).map_err(anyhow::Error::msg)?,
            };
            let request = EstimateRequest {
                trade,
                zip_code: zip,
                criteria,
            };
            let app = App::build(config).await?;
            print_json(&app.engine.estimate(&request).await?)
        }
        Command::Resolve { zip } => {
            let app = App::build(config).await?;
            match app.resolver.resolve_pricing(&zip).await {
                Some(profile) => print_json(&profile),
                None => bail!("no pricing profile could be resolved for {zip}"),
            }
        }
        Command::Refresh => {
            let app = App::build(config).await?;
            print_json(&app.scheduler.refresh_county_seats().await?)
        }
        Command::Cleanup => {
            let app = App::build(config).await?;
            let removed = app.scheduler.clean_expired_cache().await?;
            println!("removed {removed} expired profiles");
            Ok(())
        }
        Command::Stats => {
            let app = App::build(config).await?;
            print_json(&app.resolver.cache().get_stats().await?)
        }
        Command::Serve => serve(App::build(config).await?).await,
    }
}

async fn serve(app: App) -> Result<()> {
    tracing::info!(
        version = %version::version_label(),
        cache = %app.config.cache_path.display(),
        "starting refresh and cleanup schedules"
    );
    let handles = app.scheduler.clone().spawn();
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    tracing::info!("shutting down");
    handles.abort();
    Ok(())
}

fn list_fields(trade: Option<Trade>) -> Result<()> {
    let catalog = FieldCatalog::embedded().context("loading field catalog")?;
    let trades = trade.map_or_else(|| Trade::ALL.to_vec(), |trade| vec![trade]);
    let listing: BTreeMap<Trade, Vec<&FieldDefinition>> = trades
        .into_iter()
        .map(|trade| (trade, catalog.for_trade(trade)))
        .collect();
    print_json(&listing)
}

fn run_config(command: ConfigCommand, config: Config, path: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show => print_json(&config),
        ConfigCommand::Init { force } => {
            let target = match path.or_else(persistence::config_file) {
                Some(target) => target,
                None => bail!("no platform config directory available"),
            };
            if target.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", target.display());
            }
            let written = config.save(Some(&target))?;
            println!("wrote {}", written.display());
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
