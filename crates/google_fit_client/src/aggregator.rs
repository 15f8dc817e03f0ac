//! Interval and daily aggregators.
//!
//! Each aggregator issues exactly one history query through an injected
//! [`HistoryClient`] and translates the result. Neither retries: retry policy
//! belongs to the collaborator or the caller.

use crate::metric::MetricFamily;
use crate::observability;
use crate::record::{DailyRecord, IntervalRecord};
use crate::translate::{DailyShape, IntervalShape, translate};
use crate::{BucketSize, FitError, HistoryClient, ReadRequest};
use chrono::{Local, TimeZone};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Ceiling for the bounded-wait daily read.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

fn validate_range(start_ms: i64, end_ms: i64) -> Result<(), FitError> {
    if start_ms < 0 {
        return Err(FitError::InvalidInput(format!(
            "start time must be >= 0, got {start_ms}"
        )));
    }
    if end_ms < start_ms {
        return Err(FitError::InvalidInput(format!(
            "end time {end_ms} precedes start time {start_ms}"
        )));
    }
    Ok(())
}

/// Collaborator errors reach the caller as query failures, keeping
/// timeouts and authorization problems distinguishable.
fn as_query_failure(err: FitError) -> FitError {
    match err {
        e @ (FitError::QueryFailed { .. }
        | FitError::QueryTimeout(_)
        | FitError::Unauthorized(_)) => e,
        other => FitError::query_failed(other.to_string()),
    }
}

/// Fixed-width time series (e.g. steps per 30 minutes) with ISO timestamps.
#[derive(Clone)]
pub struct IntervalAggregator<Tz = Local> {
    client: Arc<dyn HistoryClient>,
    metric: MetricFamily,
    tz: Tz,
}

impl IntervalAggregator<Local> {
    pub fn new(client: Arc<dyn HistoryClient>, metric: MetricFamily) -> Self {
        Self {
            client,
            metric,
            tz: Local,
        }
    }
}

impl<Tz> IntervalAggregator<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Format timestamps in `tz` instead of the local zone.
    pub fn with_time_zone<T: TimeZone>(self, tz: T) -> IntervalAggregator<T> {
        IntervalAggregator {
            client: self.client,
            metric: self.metric,
            tz,
        }
    }

    pub fn metric(&self) -> MetricFamily {
        self.metric
    }

    pub async fn aggregate_by_interval(
        &self,
        bucket_minutes: u32,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<IntervalRecord>, FitError> {
        if bucket_minutes == 0 {
            return Err(FitError::InvalidInput(
                "bucket size must be at least one minute".into(),
            ));
        }
        validate_range(start_ms, end_ms)?;

        let request = ReadRequest::new(self.metric.data_types(), start_ms, end_ms)
            .bucket_by(BucketSize::Minutes(bucket_minutes));
        tracing::info!(
            metric = %self.metric,
            bucket_minutes,
            start_ms,
            end_ms,
            "aggregate by interval"
        );

        let result = self.client.read_data(&request).await;
        observability::record_query(self.metric, &result);
        let result = result.map_err(|e| {
            tracing::warn!(metric = %self.metric, error = %e, "interval query failed");
            as_query_failure(e)
        })?;
        tracing::info!(
            metric = %self.metric,
            aggregated = result.is_aggregated(),
            "interval query returned"
        );

        let shape = IntervalShape {
            tz: self.tz.clone(),
        };
        let records = translate(&result, &shape)?;
        observability::record_translated(self.metric, "interval", records.len());
        Ok(records)
    }
}

/// One record per day bucket, labelled with the weekday.
#[derive(Clone)]
pub struct DailyAggregator<Tz = Local> {
    client: Arc<dyn HistoryClient>,
    metric: MetricFamily,
    timeout: Duration,
    tz: Tz,
}

impl DailyAggregator<Local> {
    pub fn new(client: Arc<dyn HistoryClient>, metric: MetricFamily) -> Self {
        Self {
            client,
            metric,
            timeout: DEFAULT_QUERY_TIMEOUT,
            tz: Local,
        }
    }
}

impl<Tz> DailyAggregator<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Derive weekday labels in `tz` instead of the local zone.
    pub fn with_time_zone<T: TimeZone>(self, tz: T) -> DailyAggregator<T> {
        DailyAggregator {
            client: self.client,
            metric: self.metric,
            timeout: self.timeout,
            tz,
        }
    }

    pub fn metric(&self) -> MetricFamily {
        self.metric
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Daily read bounded by the configured timeout. Requires a tokio runtime
    /// with the time driver enabled.
    pub async fn aggregate_by_date(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<DailyRecord>, FitError> {
        validate_range(start_ms, end_ms)?;

        let request = ReadRequest::new(self.metric.data_types(), start_ms, end_ms)
            .bucket_by(BucketSize::Days(1));
        tracing::info!(metric = %self.metric, start_ms, end_ms, "aggregate by date");

        let result = match tokio::time::timeout(self.timeout, self.client.read_data(&request)).await
        {
            Ok(r) => r,
            Err(_) => Err(FitError::QueryTimeout(self.timeout)),
        };
        observability::record_query(self.metric, &result);
        let result = result.map_err(|e| {
            tracing::warn!(metric = %self.metric, error = %e, "daily query failed");
            as_query_failure(e)
        })?;
        tracing::info!(
            metric = %self.metric,
            aggregated = result.is_aggregated(),
            "daily query returned"
        );

        let shape = DailyShape {
            metric: self.metric,
            tz: self.tz.clone(),
        };
        let records = translate(&result, &shape)?;
        observability::record_translated(self.metric, "daily", records.len());
        Ok(records)
    }

    /// Blocking form of [`aggregate_by_date`](Self::aggregate_by_date).
    ///
    /// Drives the query on a private current-thread runtime, so it must not be
    /// called from within an async context.
    pub fn aggregate_by_date_blocking(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<DailyRecord>, FitError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FitError::Config(format!("building runtime: {e}")))?;
        rt.block_on(self.aggregate_by_date(start_ms, end_ms))
    }
}
