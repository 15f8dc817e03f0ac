//! REST implementation of the [`HistoryClient`](crate::HistoryClient) trait.
//!
//! Bucketed reads go through `dataset:aggregate`; unbucketed reads fetch the
//! merged data source's raw data set. Both responses are converted into a
//! [`ReadResult`] here, which is where the aggregated-vs-raw path is chosen.

use crate::auth::TokenStore;
use crate::config::Config;
use crate::metric::field_name;
use crate::model::{Bucket, DataPoint, DataSet, FieldValue, PlatformValue, ReadResult};
use crate::retry::RetryPolicy;
use crate::{FitError, HistoryClient, ReadRequest};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// History client for the platform's REST API, authenticated with the bearer
/// token held in a shared [`TokenStore`].
#[derive(Clone, Debug)]
pub struct RestHistoryClient {
    base_url: String,
    tokens: Arc<TokenStore>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl RestHistoryClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. "https://www.googleapis.com/fitness/v1"
    /// * `tokens` - where the current access token is read from on every call
    pub fn new(base_url: &str, tokens: Arc<TokenStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Client with the configured base URL and a per-request timeout matching
    /// the query timeout.
    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> Result<Self, FitError> {
        let client = reqwest::Client::builder()
            .timeout(config.query_timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn bearer(&self) -> Result<secrecy::SecretString, FitError> {
        self.tokens
            .get()
            .ok_or_else(|| FitError::Unauthorized("no access token; authorize first".into()))
    }

    /// Send once, mapping non-success statuses to typed errors.
    async fn send_text(&self, request: reqwest::RequestBuilder) -> Result<String, FitError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        Ok(resp.text().await?)
    }

    async fn error_from_response(resp: reqwest::Response) -> FitError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        match status {
            401 | 403 => FitError::Unauthorized(body_snippet),
            _ => FitError::QueryFailed {
                status: Some(status),
                message: body_snippet,
            },
        }
    }

    async fn aggregate(
        &self,
        request: &ReadRequest,
        duration_ms: i64,
    ) -> Result<ReadResult, FitError> {
        let token = self.bearer()?;
        let url = format!("{}/users/me/dataset:aggregate", self.base_url);
        let body = AggregateRequestBody {
            aggregate_by: vec![AggregateBy {
                data_type_name: request.data_types.source,
            }],
            bucket_by_time: BucketByTime {
                duration_millis: duration_ms,
            },
            start_time_millis: request.start_ms,
            end_time_millis: request.end_ms,
        };
        let (client, url, token, body) =
            (&self.client, url.as_str(), token.expose_secret(), &body);
        let text = self
            .retry
            .retry_async(
                move || self.send_text(client.post(url).bearer_auth(token).json(body)),
                FitError::is_transient,
            )
            .await?;
        let payload: AggregateResponse = decode(&text)?;
        tracing::debug!(
            buckets = payload.bucket.len(),
            data_sets = payload.dataset.len(),
            "aggregate response"
        );
        Ok(payload.into_read_result(request.data_types.aggregate))
    }

    async fn raw(&self, request: &ReadRequest) -> Result<ReadResult, FitError> {
        let token = self.bearer()?;
        let url = format!(
            "{}/users/me/dataSources/{}/datasets/{}-{}",
            self.base_url,
            merged_data_source(request.data_types.source),
            request.start_ms.saturating_mul(NANOS_PER_MILLI),
            request.end_ms.saturating_mul(NANOS_PER_MILLI),
        );
        let (client, url, token) = (&self.client, url.as_str(), token.expose_secret());
        let text = self
            .retry
            .retry_async(
                move || self.send_text(client.get(url).bearer_auth(token)),
                FitError::is_transient,
            )
            .await?;
        let payload: WireDataSet = decode(&text)?;
        Ok(ReadResult::from_parts(
            Vec::new(),
            vec![payload.into_data_set(request.data_types.source)],
        ))
    }
}

#[async_trait]
impl HistoryClient for RestHistoryClient {
    async fn read_data(&self, request: &ReadRequest) -> Result<ReadResult, FitError> {
        tracing::info!(
            data_type = request.data_types.source,
            bucket = ?request.bucket,
            start_ms = request.start_ms,
            end_ms = request.end_ms,
            "history read"
        );
        match request.bucket {
            Some(bucket) => self.aggregate(request, bucket.as_millis()).await,
            None => self.raw(request).await,
        }
    }
}

/// Merged platform data source for a source data type.
pub fn merged_data_source(source_type: &str) -> String {
    let stream = match source_type {
        "com.google.step_count.delta" => "estimated_steps",
        "com.google.distance.delta" => "merge_distance_delta",
        "com.google.calories.expended" => "merge_calories_expended",
        "com.google.weight" => "merge_weight",
        "com.google.height" => "merge_height",
        "com.google.activity.segment" => "merge_activity_segments",
        _ => "merged",
    };
    format!("derived:{source_type}:com.google.android.gms:{stream}")
}

/// Data type named inside a data source id (`derived:<type>:<app>:<stream>`).
fn data_type_of_source(source_id: &str) -> Option<&str> {
    source_id.split(':').nth(1).filter(|s| !s.is_empty())
}

fn decode<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, FitError> {
    serde_json::from_str(text).map_err(|e| {
        let body_snippet: String = text.chars().take(512).collect();
        FitError::Decode(format!("{e} - body: {body_snippet}"))
    })
}

/// Epoch values arrive as JSON strings (int64 encoding) or plain numbers.
fn deserialize_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| D::Error::custom(format!("invalid int64 {s:?}: {e}"))),
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {n}"))),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateRequestBody<'a> {
    aggregate_by: Vec<AggregateBy<'a>>,
    bucket_by_time: BucketByTime,
    start_time_millis: i64,
    end_time_millis: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateBy<'a> {
    data_type_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketByTime {
    duration_millis: i64,
}

#[derive(Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    bucket: Vec<WireBucket>,
    #[serde(default)]
    dataset: Vec<WireDataSet>,
}

impl AggregateResponse {
    fn into_read_result(self, fallback_type: &str) -> ReadResult {
        let buckets = self
            .bucket
            .into_iter()
            .map(|b| Bucket {
                start_ms: b.start_time_millis,
                end_ms: b.end_time_millis,
                data_sets: b
                    .dataset
                    .into_iter()
                    .map(|d| d.into_data_set(fallback_type))
                    .collect(),
            })
            .collect();
        let data_sets = self
            .dataset
            .into_iter()
            .map(|d| d.into_data_set(fallback_type))
            .collect();
        ReadResult::from_parts(buckets, data_sets)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBucket {
    #[serde(deserialize_with = "deserialize_i64")]
    start_time_millis: i64,
    #[serde(deserialize_with = "deserialize_i64")]
    end_time_millis: i64,
    #[serde(default)]
    dataset: Vec<WireDataSet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDataSet {
    #[serde(default)]
    data_source_id: String,
    #[serde(default)]
    point: Vec<WirePoint>,
}

impl WireDataSet {
    fn into_data_set(self, fallback_type: &str) -> DataSet {
        let data_type = data_type_of_source(&self.data_source_id)
            .unwrap_or(fallback_type)
            .to_string();
        let points = self
            .point
            .into_iter()
            .map(|p| p.into_data_point(&data_type))
            .collect();
        DataSet { data_type, points }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePoint {
    #[serde(deserialize_with = "deserialize_i64")]
    start_time_nanos: i64,
    #[serde(deserialize_with = "deserialize_i64")]
    end_time_nanos: i64,
    #[serde(default)]
    data_type_name: String,
    #[serde(default)]
    value: Vec<WireValue>,
}

impl WirePoint {
    fn into_data_point(self, set_type: &str) -> DataPoint {
        let data_type = if self.data_type_name.is_empty() {
            set_type.to_string()
        } else {
            self.data_type_name
        };
        let fields = self
            .value
            .into_iter()
            .enumerate()
            .map(|(i, v)| FieldValue {
                name: field_name(&data_type, i),
                value: v.into_platform_value(),
            })
            .collect();
        DataPoint {
            data_type,
            start_ms: self.start_time_nanos / NANOS_PER_MILLI,
            end_ms: self.end_time_nanos / NANOS_PER_MILLI,
            fields,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireValue {
    int_val: Option<i64>,
    fp_val: Option<f64>,
    string_val: Option<String>,
    #[serde(default)]
    map_val: Vec<WireMapEntry>,
}

impl WireValue {
    fn into_platform_value(self) -> PlatformValue {
        if let Some(i) = self.int_val {
            PlatformValue::Int(i)
        } else if let Some(f) = self.fp_val {
            PlatformValue::Float(f)
        } else if let Some(s) = self.string_val {
            PlatformValue::Text(s)
        } else if !self.map_val.is_empty() {
            PlatformValue::Map(
                self.map_val
                    .into_iter()
                    .filter_map(|e| e.value.fp_val.map(|v| (e.key, v)))
                    .collect(),
            )
        } else {
            PlatformValue::Absent
        }
    }
}

#[derive(Deserialize)]
struct WireMapEntry {
    key: String,
    value: WireMapValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMapValue {
    fp_val: Option<f64>,
}
