//! Read-result translation: one engine for both record shapes.
//!
//! [`translate`] walks a [`ReadResult`] in platform order and asks a
//! [`RecordShape`] to render one record per numeric field. The aggregated and
//! raw paths only differ in how data sets are discovered
//! ([`ReadResult::data_sets`]); rendering is shared.

use crate::FitError;
use crate::format::{format_timestamp, weekday_label};
use crate::metric::MetricFamily;
use crate::model::{DataPoint, ReadResult};
use crate::record::{DailyRecord, IntervalRecord};
use chrono::TimeZone;
use std::fmt::Display;

/// Renders one (data point, field value) pair into an output record.
pub trait RecordShape {
    type Record;

    fn shape(&self, point: &DataPoint, value: f32) -> Result<Self::Record, FitError>;
}

/// Flatten `result` into records, one per (point, numeric field) pair.
///
/// Fields without a numeric value are skipped; the rest of the point's
/// fields are still emitted.
pub fn translate<S: RecordShape>(
    result: &ReadResult,
    shape: &S,
) -> Result<Vec<S::Record>, FitError> {
    let mut records = Vec::new();
    for data_set in result.data_sets() {
        tracing::trace!(
            data_type = %data_set.data_type,
            points = data_set.points.len(),
            "translating data set"
        );
        for point in &data_set.points {
            for field in &point.fields {
                let Some(value) = field.value.coerce_f32() else {
                    tracing::debug!(
                        data_type = %point.data_type,
                        field = %field.name,
                        start_ms = point.start_ms,
                        "skipping field without numeric value"
                    );
                    continue;
                };
                records.push(shape.shape(point, value)?);
            }
        }
    }
    Ok(records)
}

/// `{startDate, endDate, value}` with ISO-8601 timestamps in `tz`.
#[derive(Clone, Debug)]
pub struct IntervalShape<Tz> {
    pub tz: Tz,
}

impl<Tz> RecordShape for IntervalShape<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    type Record = IntervalRecord;

    fn shape(&self, point: &DataPoint, value: f32) -> Result<IntervalRecord, FitError> {
        Ok(IntervalRecord {
            start_time: format_timestamp(point.start_ms, &self.tz)?,
            end_time: format_timestamp(point.end_ms, &self.tz)?,
            value: f64::from(value),
        })
    }
}

/// `{day, startDate, endDate, <metric key>}` with epoch-ms timestamps.
#[derive(Clone, Debug)]
pub struct DailyShape<Tz> {
    pub metric: MetricFamily,
    pub tz: Tz,
}

impl<Tz> RecordShape for DailyShape<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    type Record = DailyRecord;

    fn shape(&self, point: &DataPoint, value: f32) -> Result<DailyRecord, FitError> {
        Ok(DailyRecord {
            metric: self.metric,
            day: weekday_label(point.start_ms, &self.tz)?,
            start_time: point.start_ms,
            end_time: point.end_ms,
            value: f64::from(value),
        })
    }
}
