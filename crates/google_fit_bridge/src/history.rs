//! Per-metric history reads exposed to the host.

use crate::callbacks::{Callbacks, spawn_with_callbacks};
use google_fit_client::{
    DailyAggregator, DailyRecord, FitError, HistoryClient, IntervalAggregator, IntervalRecord,
    MetricFamily,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Interval and daily reads for one metric family.
#[derive(Clone)]
pub struct MetricHistory {
    interval: IntervalAggregator,
    daily: DailyAggregator,
}

impl MetricHistory {
    pub fn new(client: Arc<dyn HistoryClient>, metric: MetricFamily, timeout: Duration) -> Self {
        Self {
            interval: IntervalAggregator::new(client.clone(), metric),
            daily: DailyAggregator::new(client, metric).with_timeout(timeout),
        }
    }

    pub fn metric(&self) -> MetricFamily {
        self.interval.metric()
    }

    pub async fn aggregate_by_interval(
        &self,
        bucket_minutes: u32,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<IntervalRecord>, FitError> {
        self.interval
            .aggregate_by_interval(bucket_minutes, start_ms, end_ms)
            .await
    }

    /// Callback form: spawns the read and fires exactly one of the callbacks.
    pub fn aggregate_by_interval_with(
        &self,
        bucket_minutes: u32,
        start_ms: i64,
        end_ms: i64,
        callbacks: Callbacks<Vec<IntervalRecord>>,
    ) -> JoinHandle<()> {
        let interval = self.interval.clone();
        spawn_with_callbacks(
            async move {
                interval
                    .aggregate_by_interval(bucket_minutes, start_ms, end_ms)
                    .await
            },
            callbacks,
        )
    }

    pub async fn aggregate_by_date(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<DailyRecord>, FitError> {
        self.daily.aggregate_by_date(start_ms, end_ms).await
    }

    /// Bounded synchronous wait; see [`DailyAggregator::aggregate_by_date_blocking`].
    pub fn aggregate_by_date_blocking(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<DailyRecord>, FitError> {
        self.daily.aggregate_by_date_blocking(start_ms, end_ms)
    }
}
