//! Host-runtime bridge for Google Fit history reads.
//!
//! The host talks line-delimited JSON over a byte stream (stdio for the
//! binary). Requests are dispatched to a [`FitManager`]; history reads run on
//! the tokio runtime and answer through one-shot callbacks, authorization
//! changes are pushed as events.

pub mod callbacks;
pub mod error;
pub mod events;
pub mod history;
pub mod manager;
pub mod protocol;

use std::sync::Arc;

use google_fit_client::{IntervalRecord, MetricFamily};
use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

pub use error::{BridgeError, BridgeResult, ErrorInfo};
pub use manager::{AuthorizationOutcome, FitManager};

use callbacks::Callbacks;
use protocol::{AuthorizationResultParams, Call, Outbound, Request, Response};

/// Dispatches host requests to the manager and queues replies.
#[derive(Clone)]
pub struct FitBridge {
    manager: Arc<FitManager>,
    out: mpsc::UnboundedSender<Outbound>,
}

impl FitBridge {
    pub fn new(manager: Arc<FitManager>, out: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { manager, out }
    }

    fn send(&self, response: Response) {
        if self.out.send(response.into()).is_err() {
            tracing::warn!("response dropped: host channel closed");
        }
    }

    /// Handle one request line. Replies are queued on the outbound channel,
    /// possibly after this returns for history reads.
    pub fn handle_line(&self, line: &str) {
        let request = match Request::parse(line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting request line");
                self.send(Response::err(Value::Null, ErrorInfo::from(&e)));
                return;
            }
        };
        let id = request.id.clone();
        match request.call() {
            Ok(call) => self.dispatch(id, call),
            Err(e) => self.send(Response::err(id, ErrorInfo::from(&e))),
        }
    }

    fn dispatch(&self, id: Value, call: Call) {
        tracing::debug!(?id, ?call, "dispatch");
        match call {
            Call::IsAuthorized => {
                self.send(Response::ok(id, json!(self.manager.is_authorized())));
            }
            Call::Authorize => match self.manager.authorize() {
                Ok(Some(prompt)) => self.send(Response::ok(id, json!({ "prompt": prompt }))),
                Ok(None) => self.send(Response::ok(id, json!({ "authorized": true }))),
                Err(e) => self.send(Response::err(id, ErrorInfo::from(&e))),
            },
            Call::AuthorizationResult(params) => {
                let result = authorization_outcome(params)
                    .and_then(|outcome| self.manager.on_authorization_result(outcome));
                match result {
                    Ok(()) => self.send(Response::ok(id, json!(self.manager.is_authorized()))),
                    Err(e) => self.send(Response::err(id, ErrorInfo::from(&e))),
                }
            }
            Call::Disconnect => {
                self.manager.disconnect();
                self.send(Response::ok(id, Value::Null));
            }
            Call::AggregateByInterval(p) => {
                let history = match p.metric.parse::<MetricFamily>() {
                    Ok(m) => self.manager.history(m),
                    Err(e) => return self.send(Response::err(id, ErrorInfo::from(&e))),
                };
                let (ok_bridge, err_bridge) = (self.clone(), self.clone());
                let (ok_id, err_id) = (id.clone(), id);
                let callbacks = Callbacks::new(
                    move |records: Vec<IntervalRecord>| {
                        ok_bridge.send(records_response(ok_id, &records));
                    },
                    move |error: ErrorInfo| {
                        err_bridge.send(Response::err(err_id, error));
                    },
                );
                history.aggregate_by_interval_with(
                    p.bucket_minutes,
                    p.start_time,
                    p.end_time,
                    callbacks,
                );
            }
            Call::AggregateByDate(p) => {
                let history = match p.metric.parse::<MetricFamily>() {
                    Ok(m) => self.manager.history(m),
                    Err(e) => return self.send(Response::err(id, ErrorInfo::from(&e))),
                };
                let bridge = self.clone();
                tokio::spawn(async move {
                    let response = match history.aggregate_by_date(p.start_time, p.end_time).await
                    {
                        Ok(records) => records_response(id, &records),
                        Err(e) => Response::err(id, ErrorInfo::from(&e)),
                    };
                    bridge.send(response);
                });
            }
        }
    }
}

/// Successful read reply; a record set that fails to serialize is reported as
/// an internal error, never as an empty result.
fn records_response<T: Serialize>(id: Value, records: &T) -> Response {
    match serde_json::to_value(records) {
        Ok(v) => Response::ok(id, v),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize records");
            Response::err(id, ErrorInfo::from(&BridgeError::from(e)))
        }
    }
}

fn authorization_outcome(params: AuthorizationResultParams) -> BridgeResult<AuthorizationOutcome> {
    if params.canceled {
        return Ok(AuthorizationOutcome::Canceled);
    }
    match (params.state, params.access_token) {
        (Some(state), Some(token)) => Ok(AuthorizationOutcome::Granted {
            state,
            token: SecretString::new(token.into()),
        }),
        _ => Err(BridgeError::Protocol(
            "authorizationResult needs state and accessToken unless canceled".into(),
        )),
    }
}

/// Run the bridge over a reader/writer pair until the reader hits EOF and
/// every in-flight request has been answered.
pub async fn serve<R, W>(
    bridge: FitBridge,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    reader: R,
    mut writer: W,
) -> BridgeResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let read_loop = async move {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            bridge.handle_line(line);
        }
        tracing::info!("host closed input");
        drop(bridge);
        Ok::<(), BridgeError>(())
    };

    let write_loop = async move {
        while let Some(message) = outbound.recv().await {
            let mut line = serde_json::to_vec(&message)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<(), BridgeError>(())
    };

    let (read, write) = tokio::join!(read_loop, write_loop);
    read?;
    write
}
