// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use herald::config::ReporterConfig;
use herald::descriptor::{IdentityConfig, ProcessDescriptorFactory};
use herald::transport::http::{CollectorConfig, HttpTransport};
use herald::Reporter;

/// Report this agent's descriptor to a collector and keep it fresh.
#[derive(Debug, Parser)]
#[command(name = "herald", version)]
struct Cli {
    #[command(flatten)]
    collector: CollectorConfig,

    #[command(flatten)]
    identity: IdentityConfig,

    #[command(flatten)]
    reporter: ReporterConfig,

    /// Log filter directive.
    #[arg(long, default_value = "info", env = "HERALD_LOG_LEVEL")]
    log_level: String,

    /// Log output format: "text" or "json".
    #[arg(long, default_value = "text", env = "HERALD_LOG_FORMAT")]
    log_format: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.reporter.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match cli.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).init();
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let factory = ProcessDescriptorFactory::new(cli.identity)?;
    let transport = HttpTransport::new(&cli.collector)?;
    info!(agent_id = factory.agent_id(), collector = transport.url(), "herald starting");

    let reporter = Reporter::new(&cli.reporter, Arc::new(factory), Arc::new(transport))?;
    reporter.start();

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            _ = hangup.recv() => {
                info!("SIGHUP received, refreshing descriptor");
                reporter.refresh();
            }
        }
    }

    reporter.stop();
    reporter.stopped().await;
    Ok(())
}
