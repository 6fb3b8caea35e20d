//! Game review CLI
//!
//! Reads a PGN file, reviews every move of the main line against a local
//! UCI engine, and prints the analysis as JSON.

use tracing::info;

use review_engine::config::ReviewConfig;
use review_engine::review::review_game;

/// Parse `--pgn <file>` and `--engine <path>` from CLI args
fn parse_args() -> (Option<String>, Option<String>) {
    let args: Vec<String> = std::env::args().collect();
    let mut pgn_path = None;
    let mut engine_path = None;
    for i in 0..args.len() {
        if args[i] == "--pgn" {
            pgn_path = args.get(i + 1).cloned();
        }
        if args[i] == "--engine" {
            engine_path = args.get(i + 1).cloned();
        }
    }
    (pgn_path, engine_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let (pgn_path, engine_path) = parse_args();
    let pgn_path = pgn_path.ok_or_else(|| anyhow::anyhow!("usage: review-engine --pgn <file> [--engine <path>]"))?;

    let mut config = ReviewConfig::load();
    if let Some(path) = engine_path {
        config.engine_path = path;
    }
    info!(engine = %config.engine_path, pgn = %pgn_path, "Review config loaded");

    let pgn = std::fs::read_to_string(&pgn_path)
        .map_err(|e| anyhow::anyhow!("cannot read {pgn_path}: {e}"))?;

    let analysis = review_game(&config, &pgn).await;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
