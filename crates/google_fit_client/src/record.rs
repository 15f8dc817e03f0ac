//! Flat records handed to callers.

use crate::metric::MetricFamily;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One fixed-width interval. Timestamps are formatted with
/// [`format::TIMESTAMP_PATTERN`](crate::format::TIMESTAMP_PATTERN).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct IntervalRecord {
    #[serde(rename = "startDate")]
    pub start_time: String,
    #[serde(rename = "endDate")]
    pub end_time: String,
    pub value: f64,
}

/// One day-bucket value labelled with its weekday. The value key depends on
/// the metric family (`distance`, `steps`, `calorie`, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct DailyRecord {
    pub metric: MetricFamily,
    pub day: String,
    pub start_time: i64,
    pub end_time: i64,
    pub value: f64,
}

impl Serialize for DailyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("day", &self.day)?;
        map.serialize_entry("startDate", &self.start_time)?;
        map.serialize_entry("endDate", &self.end_time)?;
        map.serialize_entry(self.metric.daily_value_key(), &self.value)?;
        map.end()
    }
}
