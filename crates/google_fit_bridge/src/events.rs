//! Events pushed to the host outside of request/response pairs.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

pub const AUTHORIZE_SUCCESS: &str = "GoogleFitAuthorizeSuccess";
pub const AUTHORIZE_FAILURE: &str = "GoogleFitAuthorizeFailure";

/// Message used when the user dismisses the consent prompt.
pub const RESULT_CANCELED: &str = "RESULT_CANCELED";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub event: &'static str,
    pub payload: Option<Value>,
}

impl Event {
    pub fn authorize_success() -> Self {
        Self {
            event: AUTHORIZE_SUCCESS,
            payload: None,
        }
    }

    pub fn authorize_failure(message: impl Into<String>) -> Self {
        Self {
            event: AUTHORIZE_FAILURE,
            payload: Some(serde_json::json!({ "message": message.into() })),
        }
    }
}

pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: Event);
}

/// Forwards events into an unbounded channel, converting them to the
/// channel's message type.
pub struct ChannelEventSink<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> ChannelEventSink<T> {
    pub fn new(tx: mpsc::UnboundedSender<T>) -> Self {
        Self { tx }
    }
}

impl<T> EventSink for ChannelEventSink<T>
where
    T: From<Event> + Send + 'static,
{
    fn emit(&self, event: Event) {
        tracing::info!(event = event.event, "emitting event");
        if self.tx.send(T::from(event)).is_err() {
            tracing::warn!("event dropped: host channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_payload_carries_message() {
        let e = Event::authorize_failure(RESULT_CANCELED);
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            serde_json::json!({
                "event": "GoogleFitAuthorizeFailure",
                "payload": {"message": "RESULT_CANCELED"}
            })
        );
    }

    #[tokio::test]
    async fn channel_sink_forwards() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let sink = ChannelEventSink::new(tx);
        sink.emit(Event::authorize_success());
        assert_eq!(rx.recv().await.unwrap().event, AUTHORIZE_SUCCESS);
    }
}
