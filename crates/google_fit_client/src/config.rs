use crate::FitError;
use crate::aggregator::DEFAULT_QUERY_TIMEOUT;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/fitness/v1";

#[derive(Clone, Debug)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: String,
    pub access_token: Option<SecretString>,
    pub base_url: String,
    pub query_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, FitError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function, so tests never touch the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, FitError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client_id = get("GOOGLE_FIT_CLIENT_ID")
            .ok_or_else(|| FitError::Config("GOOGLE_FIT_CLIENT_ID missing".into()))?;
        let redirect_uri = get("GOOGLE_FIT_REDIRECT_URI")
            .ok_or_else(|| FitError::Config("GOOGLE_FIT_REDIRECT_URI missing".into()))?;
        let access_token = get("GOOGLE_FIT_ACCESS_TOKEN")
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::new(t.into()));
        let base_url = get("GOOGLE_FIT_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let query_timeout = match get("GOOGLE_FIT_QUERY_TIMEOUT_SECS") {
            None => DEFAULT_QUERY_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(FitError::Config(format!(
                        "GOOGLE_FIT_QUERY_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    )));
                }
            },
        };
        Ok(Self {
            client_id,
            redirect_uri,
            access_token,
            base_url,
            query_timeout,
        })
    }
}
