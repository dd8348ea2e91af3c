//! Resource Analyzer - describe web resources as JSON
//!
//! Prints one JSON document per URL argument. Configuration is read from the
//! environment, see [`AnalyzerConfig`].

use clap::Parser;
use resource_analyzer::{Analyzer, AnalyzerConfig};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "resource-analyzer",
    about = "Describe web resources as JSON",
    version
)]
struct Args {
    /// URLs to analyze
    #[arg(required = true)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("resource_analyzer=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json; stdout
    // carries the results
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let config = AnalyzerConfig::from_env();
    info!(
        files_path = ?config.files_path,
        video_services = config.video_service_keys.len(),
        timeout_secs = config.http_timeout_secs,
        "Starting resource analyzer"
    );
    let analyzer = Analyzer::from_config(&config).await?;

    let mut failed = false;
    for url in &args.urls {
        match analyzer.analyze(url).await {
            Ok(resource) => {
                println!("{}", serde_json::to_string_pretty(&resource.to_json(None))?);
            }
            Err(e) => {
                error!(url = %url, code = e.code(), error = %e, "Analysis failed");
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
