use chrono::Utc;
use google_fit_client::auth::TokenStore;
use google_fit_client::config::Config;
use google_fit_client::http_client::RestHistoryClient;
use google_fit_client::{DailyAggregator, MetricFamily};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects GOOGLE_FIT_CLIENT_ID, GOOGLE_FIT_REDIRECT_URI and GOOGLE_FIT_ACCESS_TOKEN in env
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let tokens = Arc::new(TokenStore::new(cfg.access_token.clone()));
    let client = RestHistoryClient::from_config(&cfg, tokens)?;
    let daily = DailyAggregator::new(Arc::new(client), MetricFamily::Steps)
        .with_timeout(cfg.query_timeout);

    let end = Utc::now().timestamp_millis();
    let start = end - 7 * 86_400_000;
    for record in daily.aggregate_by_date_blocking(start, end)? {
        println!("{} {:>8.0} steps", record.day, record.value);
    }
    Ok(())
}
