use anyhow::{Context, Result};
use clap::Parser;
use http_benchmark::{report, run, CancelSignal, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let run_config = config.validate().context("Invalid arguments, see --help")?;

    // Print banner
    info!("════════════════════════════════════════════════════════════");
    info!("           HTTP BENCHMARK");
    info!("════════════════════════════════════════════════════════════");
    info!("URL:         {}", run_config.target);
    info!("Concurrency: {}", run_config.concurrency);
    info!("Requests:    {}", run_config.requests);
    info!("Timeout:     {:?}", run_config.request_timeout);
    info!("════════════════════════════════════════════════════════════");

    let cancel = CancelSignal::new();
    let interrupt = cancel.listen_for_interrupt();

    let result = run(run_config, cancel).await;
    interrupt.abort();

    report::print_summary(&result, config.histogram);

    if config.json {
        let json = report::to_json(&result).context("Failed to render report as JSON")?;
        println!("{}", json);
    }

    Ok(())
}
