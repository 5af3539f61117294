use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use heating_monitor::{config, register::ModbusRegisterClient, runtime::Monitor};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (JSON or TOML), defaults to the user config directory
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Log every register read
    #[arg(long)]
    verbose: bool,
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    let filter = filter::Targets::new().with_targets(vec![
        ("heating_monitor", level),
        ("monitor", level),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let config = config::load(args.file.as_deref())?;

    let client = ModbusRegisterClient::new(&config.controller);
    let monitor = Monitor::start(&config, client).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    info!("interrupt received, stopping");
    monitor.shutdown().await?;

    Ok(())
}
