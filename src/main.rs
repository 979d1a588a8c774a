use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tic_etl::{Config, Pipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Build the TIC star schema from the eight survey charts.
#[derive(Parser, Debug)]
#[command(name = "tic-etl", version, about)]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding chart1.csv .. chart8.csv
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Directory for the unified intermediate table
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Directory for the dimension and fact CSVs
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory the Parquet sink writes into
    #[arg(long)]
    warehouse_dir: Option<PathBuf>,

    /// Build the tables but skip the sink
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(d) = self.source_dir {
            config.source_dir = d;
        }
        if let Some(d) = self.temp_dir {
            config.temp_dir = d;
        }
        if let Some(d) = self.output_dir {
            config.output_dir = d;
        }
        if let Some(d) = self.warehouse_dir {
            config.warehouse_dir = d;
        }
        if self.dry_run {
            config.ingest = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) resolve config ───────────────────────────────────────────
    let config = Cli::parse().into_config()?;
    info!(
        source = %config.source_dir.display(),
        ingest = config.ingest,
        "startup"
    );

    // ─── 3) run all stages ───────────────────────────────────────────
    let pipeline = Pipeline::new(config);
    match pipeline.run() {
        Ok(summary) => {
            info!(
                unified = summary.unified_rows,
                regions = summary.regions,
                responses = summary.responses,
                facts = summary.facts,
                ingested = summary.ingested,
                "all done"
            );
            Ok(())
        }
        Err(e) => {
            error!("pipeline failed: {}", e);
            Err(e).context("TIC pipeline run failed")
        }
    }
}
