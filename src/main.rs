//! Main entry point for the bunny-logpull CLI application.

use anyhow::{Context, Result};
use clap::Parser;

use bunny_logpull::cli::Command;
use bunny_logpull::{Cli, HttpLogSource, LogProgress, init_logging, pull};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; flags and the real environment still apply.
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Download(args) => {
            let config = args.into_config();
            let source = HttpLogSource::new(config.logging_host.clone(), config.token.clone())
                .context("create HTTP client")?;

            let summary = pull::run(&config, &source, &mut LogProgress)
                .await
                .with_context(|| {
                    format!(
                        "download logs for pull zone {} on {}",
                        config.zone_id, config.day
                    )
                })?;

            tracing::info!(
                bytes = summary.bytes_written,
                batches = summary.batches,
                path = %config.output_path().display(),
                "download complete"
            );
            println!("Downloaded all logs");
        }
    }

    Ok(())
}
