use std::sync::Arc;

use google_fit_bridge::events::ChannelEventSink;
use google_fit_bridge::{FitBridge, FitManager, serve};
use google_fit_client::auth::{OAuthAuthorizer, TokenStore};
use google_fit_client::config::Config;
use google_fit_client::http_client::RestHistoryClient;
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure logging from env var `GOOGLE_FIT_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("GOOGLE_FIT_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Keep HTTP internals quiet by default
    let combined_filter = format!("{},hyper=warn,reqwest=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn"));
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("google_fit_bridge: log filter: {}", log_env);

    let cfg = Config::from_env()?;
    let tokens = Arc::new(TokenStore::new(cfg.access_token.clone()));
    let client = RestHistoryClient::from_config(&cfg, tokens.clone())?;
    let authorizer = OAuthAuthorizer::from_config(&cfg, tokens);

    let (tx, rx) = mpsc::unbounded_channel();
    let manager = FitManager::new(
        Arc::new(client),
        Arc::new(authorizer),
        Arc::new(ChannelEventSink::new(tx.clone())),
    )
    .with_query_timeout(cfg.query_timeout);
    let bridge = FitBridge::new(Arc::new(manager), tx);

    tracing::info!(base_url = %cfg.base_url, "google_fit_bridge: serving on stdio");
    serve(bridge, rx, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    tracing::info!("google_fit_bridge: shut down");

    Ok(())
}
