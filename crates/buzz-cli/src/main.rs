//! buzz-cli: Social buzz and short-term price direction for one or more tickers.
//!
//! Each input file holds one request object or an array of them:
//! `{"symbol": "AAPL", "posts": [...], "bars": [...], "snapshot": {...}}`.
//! Estimates are printed to stdout as a JSON array.
//!
//! Usage:
//!   cargo run -p buzz-cli -- --input requests.json
//!   cargo run -p buzz-cli -- --input aapl.json --input msft.json --summary --pretty
//!   cargo run -p buzz-cli -- --input watchlist.json --concurrency 8

use analysis_core::Direction;
use anyhow::Context;
use buzz_estimator::{BuzzEstimator, EstimateRequest, EstimatorConfig};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Max concurrent symbol estimates
const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Deserialize)]
#[serde(untagged)]
enum RequestFile {
    Many(Vec<EstimateRequest>),
    One(EstimateRequest),
}

struct CliArgs {
    inputs: Vec<String>,
    summary: bool,
    pretty: bool,
    concurrency: usize,
}

fn parse_args(args: &[String]) -> CliArgs {
    let inputs = args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "--input")
        .filter_map(|(i, _)| args.get(i + 1))
        .filter(|v| !v.starts_with("--"))
        .cloned()
        .collect();

    let concurrency: usize = args
        .iter()
        .position(|a| a == "--concurrency")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CONCURRENCY);

    CliArgs {
        inputs,
        summary: args.iter().any(|a| a == "--summary"),
        pretty: args.iter().any(|a| a == "--pretty"),
        concurrency,
    }
}

fn parse_requests(raw: &str) -> serde_json::Result<Vec<EstimateRequest>> {
    Ok(match serde_json::from_str::<RequestFile>(raw)? {
        RequestFile::Many(requests) => requests,
        RequestFile::One(request) => vec![request],
    })
}

fn load_requests(path: &Path) -> anyhow::Result<Vec<EstimateRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_requests(&raw).with_context(|| format!("invalid request JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "buzz_cli=info,buzz_estimator=info,sentiment_analysis=warn,llm_client=warn".into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args);

    if cli.inputs.is_empty() {
        eprintln!("Usage:");
        eprintln!("  buzz-cli --input FILE [--input FILE ...]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --summary          Write a narrative report for requests with a snapshot");
        eprintln!("  --concurrency N    Max parallel symbols (default: {})", DEFAULT_CONCURRENCY);
        eprintln!("  --pretty           Pretty-print the JSON output");
        std::process::exit(1);
    }

    let mut requests = Vec::new();
    for input in &cli.inputs {
        requests.extend(load_requests(Path::new(input))?);
    }
    if !cli.summary {
        for request in &mut requests {
            request.snapshot = None;
        }
    }

    let config = EstimatorConfig::from_env();
    tracing::info!(
        "buzz-cli: {} symbols, model={}, summary={}, concurrency={}",
        requests.len(),
        config.llm.as_ref().map(|l| l.model.as_str()).unwrap_or("none"),
        cli.summary,
        cli.concurrency
    );

    let estimator = Arc::new(BuzzEstimator::from_config(&config));
    let estimates = estimator.estimate_many(requests, cli.concurrency).await;

    let bullish = estimates
        .iter()
        .filter(|e| e.prediction.direction == Direction::Bullish)
        .count();
    let bearish = estimates
        .iter()
        .filter(|e| e.prediction.direction == Direction::Bearish)
        .count();
    tracing::info!(
        "Done: {} estimates ({} bullish, {} bearish, {} neutral)",
        estimates.len(),
        bullish,
        bearish,
        estimates.len() - bullish - bearish
    );

    let output = if cli.pretty {
        serde_json::to_string_pretty(&estimates)?
    } else {
        serde_json::to_string(&estimates)?
    };
    println!("{}", output);

    Ok(())
}
