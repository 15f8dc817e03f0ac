//! Line-delimited JSON messages exchanged with the host runtime.
//!
//! Requests: `{"id": .., "method": "aggregateByInterval", "params": {..}}`.
//! Replies carry the same `id` with either `result` or `error`; events are
//! `{"event": .., "payload": ..}` and carry no id.

use crate::error::{BridgeError, BridgeResult, ErrorInfo};
use crate::events::Event;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Decoded request body.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    IsAuthorized,
    Authorize,
    AuthorizationResult(AuthorizationResultParams),
    Disconnect,
    AggregateByInterval(IntervalParams),
    AggregateByDate(DateParams),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalParams {
    pub metric: String,
    pub bucket_minutes: u32,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateParams {
    pub metric: String,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResultParams {
    #[serde(default)]
    pub canceled: bool,
    pub state: Option<String>,
    pub access_token: Option<String>,
}

fn params<T: DeserializeOwned>(method: &str, value: Value) -> BridgeResult<T> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::Protocol(format!("invalid params for {method}: {e}")))
}

impl Request {
    pub fn parse(line: &str) -> BridgeResult<Self> {
        serde_json::from_str(line).map_err(|e| BridgeError::Protocol(format!("bad request: {e}")))
    }

    pub fn call(&self) -> BridgeResult<Call> {
        let p = self.params.clone();
        match self.method.as_str() {
            "isAuthorized" => Ok(Call::IsAuthorized),
            "authorize" => Ok(Call::Authorize),
            "disconnect" => Ok(Call::Disconnect),
            "authorizationResult" => Ok(Call::AuthorizationResult(params(&self.method, p)?)),
            "aggregateByInterval" => Ok(Call::AggregateByInterval(params(&self.method, p)?)),
            "aggregateByDate" => Ok(Call::AggregateByDate(params(&self.method, p)?)),
            other => Err(BridgeError::Protocol(format!("unknown method: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Response {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, error: ErrorInfo) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Anything written to the host.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Response(Response),
    Event(Event),
}

impl From<Event> for Outbound {
    fn from(event: Event) -> Self {
        Outbound::Event(event)
    }
}

impl From<Response> for Outbound {
    fn from(response: Response) -> Self {
        Outbound::Response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_interval_call() {
        let req = Request::parse(
            r#"{"id":1,"method":"aggregateByInterval","params":{"metric":"steps","bucketMinutes":30,"startTime":0,"endTime":3600000}}"#,
        )
        .unwrap();
        assert_eq!(
            req.call().unwrap(),
            Call::AggregateByInterval(IntervalParams {
                metric: "steps".into(),
                bucket_minutes: 30,
                start_time: 0,
                end_time: 3_600_000,
            })
        );
    }

    #[test]
    fn parameterless_methods_need_no_params() {
        let req = Request::parse(r#"{"id":"a","method":"isAuthorized"}"#).unwrap();
        assert_eq!(req.call().unwrap(), Call::IsAuthorized);
    }

    #[test]
    fn unknown_method_and_bad_params_are_protocol_errors() {
        let req = Request::parse(r#"{"id":1,"method":"startRecording"}"#).unwrap();
        assert!(matches!(req.call(), Err(BridgeError::Protocol(_))));
        let req =
            Request::parse(r#"{"id":1,"method":"aggregateByDate","params":{"metric":"steps"}}"#)
                .unwrap();
        assert!(matches!(req.call(), Err(BridgeError::Protocol(_))));
        assert!(Request::parse("{not json").is_err());
    }

    #[test]
    fn outbound_serializes_flat() {
        let r: Outbound = Response::ok(json!(3), json!([])).into();
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"id": 3, "result": []}));
        let e: Outbound = Response::err(json!(4), ErrorInfo::new(ErrorInfo::QUERY_TIMEOUT, "t")).into();
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({"id": 4, "error": {"code": "QUERY_TIMEOUT", "message": "t"}})
        );
    }
}
