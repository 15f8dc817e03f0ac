//! OAuth authorization for history reads.
//!
//! The translation core never consults authorization; the bridge checks
//! [`Authorizer::is_authorized`] and triggers a consent prompt when needed.

use crate::FitError;
use crate::config::Config;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, RwLock};

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

pub const READ_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/fitness.activity.read",
    "https://www.googleapis.com/auth/fitness.body.read",
    "https://www.googleapis.com/auth/fitness.location.read",
];

/// Access token shared between the authorizer and the REST client.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<SecretString>>,
}

impl TokenStore {
    pub fn new(initial: Option<SecretString>) -> Self {
        Self {
            token: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> Option<SecretString> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, token: SecretString) {
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }

    pub fn clear(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

/// Consent prompt the host shows to the user.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AuthorizationPrompt {
    pub url: String,
    pub state: String,
}

pub trait Authorizer: Send + Sync + 'static {
    fn is_authorized(&self) -> bool;

    /// Start a consent flow. The returned prompt's `state` must come back
    /// with the token in [`complete_authorization`](Self::complete_authorization).
    fn request_authorization(&self) -> Result<AuthorizationPrompt, FitError>;

    fn complete_authorization(&self, state: &str, token: SecretString) -> Result<(), FitError>;

    /// Forget any granted token.
    fn revoke(&self);
}

pub struct OAuthAuthorizer {
    client_id: String,
    redirect_uri: String,
    auth_url: String,
    tokens: Arc<TokenStore>,
    pending_state: Mutex<Option<String>>,
}

impl OAuthAuthorizer {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: AUTH_URL.to_string(),
            tokens,
            pending_state: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> Self {
        Self::new(config.client_id.clone(), config.redirect_uri.clone(), tokens)
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    fn set_pending(&self, state: Option<String>) {
        match self.pending_state.lock() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }

    fn take_pending(&self) -> Option<String> {
        match self.pending_state.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Authorizer for OAuthAuthorizer {
    fn is_authorized(&self) -> bool {
        let authorized = self.tokens.is_present();
        tracing::info!(authorized, "is_authorized");
        authorized
    }

    fn request_authorization(&self) -> Result<AuthorizationPrompt, FitError> {
        let state = format!("{:032x}", rand::random::<u128>());
        let scope = READ_SCOPES.join(" ");
        let url = reqwest::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "token"),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| FitError::Config(format!("invalid auth url {}: {e}", self.auth_url)))?;
        self.set_pending(Some(state.clone()));
        tracing::info!("authorization requested");
        Ok(AuthorizationPrompt {
            url: url.into(),
            state,
        })
    }

    fn complete_authorization(&self, state: &str, token: SecretString) -> Result<(), FitError> {
        match self.take_pending() {
            Some(expected) if expected == state => {
                self.tokens.set(token);
                tracing::info!("authorization completed");
                Ok(())
            }
            Some(_) => Err(FitError::Unauthorized("authorization state mismatch".into())),
            None => Err(FitError::Unauthorized(
                "no authorization request in progress".into(),
            )),
        }
    }

    fn revoke(&self) {
        self.tokens.clear();
        self.set_pending(None);
        tracing::info!("authorization revoked");
    }
}
