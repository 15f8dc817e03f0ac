//! Query and record counters. No exporter is installed here; the host
//! process decides where metrics go.

use crate::FitError;
use crate::metric::MetricFamily;

pub const QUERIES_TOTAL: &str = "google_fit_queries_total";
pub const RECORDS_TOTAL: &str = "google_fit_records_total";

fn outcome<T>(result: &Result<T, FitError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(FitError::QueryTimeout(_)) => "timeout",
        Err(FitError::Unauthorized(_)) => "unauthorized",
        Err(_) => "failed",
    }
}

pub fn record_query<T>(metric: MetricFamily, result: &Result<T, FitError>) {
    metrics::counter!(
        QUERIES_TOTAL,
        "metric" => metric.name(),
        "outcome" => outcome(result)
    )
    .increment(1);
}

pub fn record_translated(metric: MetricFamily, form: &'static str, count: usize) {
    metrics::counter!(RECORDS_TOTAL, "metric" => metric.name(), "form" => form)
        .increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn outcome_labels() {
        assert_eq!(outcome(&Ok::<(), FitError>(())), "ok");
        assert_eq!(
            outcome::<()>(&Err(FitError::QueryTimeout(Duration::from_secs(1)))),
            "timeout"
        );
        assert_eq!(outcome::<()>(&Err(FitError::query_failed("x"))), "failed");
    }
}
