//! Wiring between the host, the authorizer and the per-metric histories.

use crate::error::{BridgeError, BridgeResult};
use crate::events::{Event, EventSink, RESULT_CANCELED};
use crate::history::MetricHistory;
use google_fit_client::auth::{AuthorizationPrompt, Authorizer};
use google_fit_client::{DEFAULT_QUERY_TIMEOUT, FitError, HistoryClient, MetricFamily};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

/// What the host reports back after showing the consent prompt.
pub enum AuthorizationOutcome {
    Granted { state: String, token: SecretString },
    Canceled,
}

pub struct FitManager {
    client: Arc<dyn HistoryClient>,
    authorizer: Arc<dyn Authorizer>,
    events: Arc<dyn EventSink>,
    query_timeout: Duration,
}

impl FitManager {
    pub fn new(
        client: Arc<dyn HistoryClient>,
        authorizer: Arc<dyn Authorizer>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            client,
            authorizer,
            events,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn is_authorized(&self) -> bool {
        self.authorizer.is_authorized()
    }

    /// Emit success right away when already authorized; otherwise hand back
    /// the consent prompt for the host to show.
    pub fn authorize(&self) -> BridgeResult<Option<AuthorizationPrompt>> {
        if self.authorizer.is_authorized() {
            tracing::info!("authorization - connected");
            self.events.emit(Event::authorize_success());
            return Ok(None);
        }
        tracing::info!("authorization - requesting permissions");
        Ok(Some(self.authorizer.request_authorization()?))
    }

    pub fn on_authorization_result(&self, outcome: AuthorizationOutcome) -> BridgeResult<()> {
        match outcome {
            AuthorizationOutcome::Granted { state, token } => {
                match self.authorizer.complete_authorization(&state, token) {
                    Ok(()) => {
                        self.events.emit(Event::authorize_success());
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "authorization result rejected");
                        self.events.emit(Event::authorize_failure(e.to_string()));
                        Err(e.into())
                    }
                }
            }
            AuthorizationOutcome::Canceled => {
                tracing::error!("authorization - cancel");
                self.events.emit(Event::authorize_failure(RESULT_CANCELED));
                Ok(())
            }
        }
    }

    pub fn disconnect(&self) {
        self.authorizer.revoke();
    }

    pub fn history(&self, metric: MetricFamily) -> MetricHistory {
        MetricHistory::new(self.client.clone(), metric, self.query_timeout)
    }

    pub fn distance_history(&self) -> MetricHistory {
        self.history(MetricFamily::Distance)
    }

    pub fn step_history(&self) -> MetricHistory {
        self.history(MetricFamily::Steps)
    }

    pub fn calorie_history(&self) -> MetricHistory {
        self.history(MetricFamily::Calories)
    }

    pub fn activity_history(&self) -> MetricHistory {
        self.history(MetricFamily::ActivitySegments)
    }

    /// Body composition history; `kind` must be weight or height.
    pub fn body_history(&self, kind: MetricFamily) -> BridgeResult<MetricHistory> {
        match kind {
            MetricFamily::Weight | MetricFamily::Height => Ok(self.history(kind)),
            other => Err(BridgeError::Fit(FitError::InvalidInput(format!(
                "{other} is not a body measurement"
            )))),
        }
    }
}
