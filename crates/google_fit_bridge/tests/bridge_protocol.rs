use async_trait::async_trait;
use google_fit_bridge::events::ChannelEventSink;
use google_fit_bridge::{FitBridge, FitManager, serve};
use google_fit_client::auth::{OAuthAuthorizer, TokenStore};
use google_fit_client::model::{Bucket, DataPoint, DataSet, PlatformValue};
use google_fit_client::{FitError, HistoryClient, ReadRequest, ReadResult};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::mpsc;

const DISTANCE: &str = "com.google.distance.delta";

/// Answers by data type: distance has one bucketed point, calories fails,
/// steps hangs, everything else is empty.
struct Scripted;

#[async_trait]
impl HistoryClient for Scripted {
    async fn read_data(&self, request: &ReadRequest) -> Result<ReadResult, FitError> {
        match request.data_types.source {
            DISTANCE => Ok(ReadResult::Buckets(vec![Bucket {
                start_ms: 0,
                end_ms: 86_400_000,
                data_sets: vec![DataSet::new(
                    DISTANCE,
                    vec![
                        DataPoint::new(DISTANCE, 0, 86_400_000)
                            .with_field("distance", PlatformValue::Float(1234.5)),
                    ],
                )],
            }])),
            "com.google.calories.expended" => Err(FitError::QueryFailed {
                status: Some(500),
                message: "backend error".into(),
            }),
            "com.google.step_count.delta" => std::future::pending().await,
            _ => Ok(ReadResult::empty()),
        }
    }
}

/// Feed `input` to a bridge and collect every line it writes.
async fn run(input: &str, token: Option<&str>) -> Vec<Value> {
    let tokens = Arc::new(TokenStore::new(
        token.map(|t| SecretString::new(t.to_string().into())),
    ));
    let (tx, rx) = mpsc::unbounded_channel();
    let manager = FitManager::new(
        Arc::new(Scripted),
        Arc::new(OAuthAuthorizer::new("cid", "http://localhost/cb", tokens)),
        Arc::new(ChannelEventSink::new(tx.clone())),
    )
    .with_query_timeout(Duration::from_millis(50));
    let bridge = FitBridge::new(Arc::new(manager), tx);

    let (writer, mut out) = tokio::io::duplex(64 * 1024);
    let reader = BufReader::new(input.as_bytes());
    let (served, text) = tokio::join!(serve(bridge, rx, reader, writer), async move {
        let mut s = String::new();
        out.read_to_string(&mut s).await.expect("read output");
        s
    });
    served.expect("serve");
    text.lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect()
}

fn by_id(lines: &[Value], id: i64) -> &Value {
    lines
        .iter()
        .find(|l| l["id"] == json!(id))
        .unwrap_or_else(|| panic!("no reply for id {id} in {lines:?}"))
}

#[tokio::test]
async fn daily_read_returns_distance_records() {
    let lines = run(
        r#"{"id":1,"method":"aggregateByDate","params":{"metric":"distance","startTime":0,"endTime":86400000}}"#,
        Some("tok"),
    )
    .await;
    let reply = by_id(&lines, 1);
    let records = reply["result"].as_array().expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["distance"], 1234.5);
    assert_eq!(records[0]["startDate"], 0);
    assert_eq!(records[0]["endDate"], 86_400_000);
    assert!(records[0]["day"].as_str().unwrap().len() == 3);
}

#[tokio::test]
async fn interval_read_answers_through_callbacks() {
    let lines = run(
        concat!(
            r#"{"id":1,"method":"aggregateByInterval","params":{"metric":"distance","bucketMinutes":60,"startTime":0,"endTime":86400000}}"#,
            "\n",
            r#"{"id":2,"method":"aggregateByInterval","params":{"metric":"weight","bucketMinutes":60,"startTime":0,"endTime":86400000}}"#,
        ),
        Some("tok"),
    )
    .await;
    let first = by_id(&lines, 1);
    assert_eq!(first["result"][0]["value"], 1234.5);
    assert!(first["result"][0]["startDate"].is_string());
    let second = by_id(&lines, 2);
    assert_eq!(second["result"], json!([]));
    assert!(second.get("error").is_none());
}

#[tokio::test]
async fn failure_and_empty_are_distinguishable() {
    let lines = run(
        concat!(
            r#"{"id":1,"method":"aggregateByInterval","params":{"metric":"calories","bucketMinutes":15,"startTime":0,"endTime":3600000}}"#,
            "\n",
            r#"{"id":2,"method":"aggregateByDate","params":{"metric":"height","startTime":0,"endTime":86400000}}"#,
        ),
        Some("tok"),
    )
    .await;
    let failed = by_id(&lines, 1);
    assert_eq!(failed["error"]["code"], "QUERY_FAILED");
    assert!(failed.get("result").is_none());
    let empty = by_id(&lines, 2);
    assert_eq!(empty["result"], json!([]));
}

#[tokio::test]
async fn daily_read_past_deadline_reports_timeout() {
    let lines = run(
        r#"{"id":9,"method":"aggregateByDate","params":{"metric":"steps","startTime":0,"endTime":86400000}}"#,
        Some("tok"),
    )
    .await;
    assert_eq!(by_id(&lines, 9)["error"]["code"], "QUERY_TIMEOUT");
}

#[tokio::test]
async fn authorize_flow_emits_events() {
    let lines = run(
        concat!(
            r#"{"id":1,"method":"isAuthorized"}"#,
            "\n",
            r#"{"id":2,"method":"authorize"}"#,
            "\n",
            r#"{"id":3,"method":"authorizationResult","params":{"canceled":true}}"#,
        ),
        None,
    )
    .await;
    assert_eq!(by_id(&lines, 1)["result"], false);
    let prompt = &by_id(&lines, 2)["result"]["prompt"];
    assert!(
        prompt["url"]
            .as_str()
            .unwrap()
            .starts_with("https://accounts.google.com/")
    );
    assert_eq!(by_id(&lines, 3)["result"], false);
    let event = lines
        .iter()
        .find(|l| l.get("event").is_some())
        .expect("event line");
    assert_eq!(event["event"], "GoogleFitAuthorizeFailure");
    assert_eq!(event["payload"]["message"], "RESULT_CANCELED");
}

#[tokio::test]
async fn authorize_when_connected_emits_success() {
    let lines = run(r#"{"id":1,"method":"authorize"}"#, Some("tok")).await;
    assert_eq!(by_id(&lines, 1)["result"]["authorized"], true);
    assert!(
        lines
            .iter()
            .any(|l| l["event"] == "GoogleFitAuthorizeSuccess")
    );
}

#[tokio::test]
async fn malformed_requests_get_error_replies() {
    let lines = run(
        concat!(
            "not json\n",
            r#"{"id":2,"method":"aggregateByDate","params":{"metric":"heart_rate","startTime":0,"endTime":1}}"#,
            "\n",
            r#"{"id":3,"method":"aggregateByInterval","params":{"metric":"steps","bucketMinutes":0,"startTime":0,"endTime":1}}"#,
        ),
        Some("tok"),
    )
    .await;
    assert!(
        lines
            .iter()
            .any(|l| l["id"].is_null() && l["error"]["code"] == "INVALID_INPUT")
    );
    assert_eq!(by_id(&lines, 2)["error"]["code"], "INVALID_INPUT");
    assert_eq!(by_id(&lines, 3)["error"]["code"], "INVALID_INPUT");
}
