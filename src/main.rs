//! Fakegen - resumable batch generation of synthetic image datasets.

mod adapters;
mod batch;
mod cassette;
mod cli;
mod config;
mod context;
mod error;
mod model;
mod output;
mod ports;
mod prompts;
mod safety;

use std::io::IsTerminal;
use std::path::Path;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::batch::{BatchGenerator, PromptStatus};
use crate::cli::Cli;
use crate::config::{BatchConfig, Config};
use crate::context::ServiceContext;
use crate::error::ImageError;
use crate::prompts::load_prompts;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,fakegen=debug" } else { "warn,fakegen=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<(), ImageError> {
    // A local .env only fills in variables the environment doesn't already set
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(ImageError::Config)?;
    let batch_config = BatchConfig::resolve(&cli, &config)?;
    tracing::debug!("Model: {}", batch_config.model);
    tracing::debug!(
        "Delays: {}s standard, {}s after rate limiting",
        batch_config.delay.as_secs(),
        batch_config.rate_limit_delay.as_secs()
    );

    let ctx = if let Ok(cassette_path) = std::env::var("FAKEGEN_REPLAY") {
        tracing::debug!("Replaying from: {cassette_path}");
        ServiceContext::replaying(Path::new(&cassette_path))?
    } else {
        ServiceContext::live(&config)?
    };

    let prompts = load_prompts(&batch_config.prompts_path)?;
    tracing::info!("Loaded {} prompts.", prompts.len());

    let batch = BatchGenerator::new(
        &batch_config,
        ctx.generator.as_ref(),
        ctx.store.as_ref(),
        ctx.pacer.as_ref(),
    );
    let report = batch.run(&prompts).await?;

    for pending in report.results.iter().filter(|r| {
        matches!(r.status, PromptStatus::FailedEmpty | PromptStatus::FailedError { .. })
    }) {
        tracing::debug!("Left for next run: #{} {}", pending.ordinal, pending.path.display());
    }

    Ok(())
}
