//! proxy-bench - latency benchmark for a chat-completion proxy against the direct API

use anyhow::{Context, Result};
use clap::Parser;
use proxy_bench_core::{run_benchmark, RunConfig};
use proxy_bench_report::{load_report, render_report, write_report};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Some(path) = &cli.show {
        let report = load_report(path)
            .with_context(|| format!("Failed to load report {}", path.display()))?;
        print!("{}", render_report(&report));
        return Ok(());
    }

    let config = RunConfig::from_file(&cli.config)
        .with_context(|| format!("Invalid configuration in {}", cli.config.display()))?;

    if cli.check {
        tracing::info!(
            config = %cli.config.display(),
            mode = %config.mode,
            "Configuration is valid"
        );
        return Ok(());
    }

    tracing::info!(
        mode = %config.mode,
        model = %config.model,
        concurrency = config.concurrency,
        max_requests = ?config.max_requests,
        test_duration_secs = ?config.test_duration,
        "proxy-bench starting"
    );

    let completers = proxy_bench_vendors::build_completers(&config)
        .context("Failed to build API clients")?;

    let report = run_benchmark(&config, &completers)
        .await
        .context("Benchmark failed")?;

    print!("{}", render_report(&report));

    if !cli.no_save {
        let path = write_report(&report, &cli.output_dir).with_context(|| {
            format!("Failed to save report to {}", cli.output_dir.display())
        })?;
        println!("Results saved to {}", path.display());
    }

    Ok(())
}
