//! History reads against the Google Fit platform, normalized into flat records.
//!
//! The [`HistoryClient`] trait is the query collaborator: anything that can turn a
//! [`ReadRequest`] into a [`model::ReadResult`]. The aggregators in [`aggregator`]
//! drive one query each and hand the result to the [`translate`] engine.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod aggregator;
pub mod auth;
pub mod config;
pub mod format;
pub mod http_client;
pub mod metric;
pub mod model;
pub mod observability;
pub mod record;
pub mod retry;
pub mod translate;

pub use aggregator::{DEFAULT_QUERY_TIMEOUT, DailyAggregator, IntervalAggregator};
pub use metric::{DataTypePair, MetricFamily};
pub use model::ReadResult;
pub use record::{DailyRecord, IntervalRecord};

#[derive(Debug, Error)]
pub enum FitError {
    #[error("query failed{}: {message}", status_suffix(.status))]
    QueryFailed {
        status: Option<u16>,
        message: String,
    },
    #[error("query timed out after {0:?}")]
    QueryTimeout(Duration),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl FitError {
    pub fn query_failed(message: impl Into<String>) -> Self {
        FitError::QueryFailed {
            status: None,
            message: message.into(),
        }
    }

    /// Whether the query collaborator may retry after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            FitError::QueryFailed {
                status: Some(s), ..
            } => *s == 429 || *s >= 500,
            FitError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Width of one bucket in a bucketed read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketSize {
    Minutes(u32),
    Days(u32),
}

impl BucketSize {
    pub fn as_millis(&self) -> i64 {
        match *self {
            BucketSize::Minutes(m) => i64::from(m) * 60_000,
            BucketSize::Days(d) => i64::from(d) * 86_400_000,
        }
    }
}

/// One history query: which data types, how to bucket, and over which range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadRequest {
    pub data_types: DataTypePair,
    pub bucket: Option<BucketSize>,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl ReadRequest {
    pub fn new(data_types: DataTypePair, start_ms: i64, end_ms: i64) -> Self {
        Self {
            data_types,
            bucket: None,
            start_ms,
            end_ms,
        }
    }

    pub fn bucket_by(mut self, bucket: BucketSize) -> Self {
        self.bucket = Some(bucket);
        self
    }
}

#[async_trait]
pub trait HistoryClient: Send + Sync + 'static {
    /// Execute a history read. Failures and platform errors come back as `Err`;
    /// a range with no data is `Ok` with an empty result.
    async fn read_data(&self, request: &ReadRequest) -> Result<ReadResult, FitError>;
}
