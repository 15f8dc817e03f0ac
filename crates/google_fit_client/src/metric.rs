//! Metric families and the platform data types behind them.

use crate::FitError;
use std::fmt;
use std::str::FromStr;

/// Source data type plus the aggregate type the platform produces from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataTypePair {
    pub source: &'static str,
    pub aggregate: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    Distance,
    Steps,
    Calories,
    Weight,
    Height,
    ActivitySegments,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 6] = [
        MetricFamily::Distance,
        MetricFamily::Steps,
        MetricFamily::Calories,
        MetricFamily::Weight,
        MetricFamily::Height,
        MetricFamily::ActivitySegments,
    ];

    pub fn data_types(&self) -> DataTypePair {
        let (source, aggregate) = match self {
            MetricFamily::Distance => ("com.google.distance.delta", "com.google.distance.delta"),
            MetricFamily::Steps => ("com.google.step_count.delta", "com.google.step_count.delta"),
            MetricFamily::Calories => (
                "com.google.calories.expended",
                "com.google.calories.expended",
            ),
            MetricFamily::Weight => ("com.google.weight", "com.google.weight.summary"),
            MetricFamily::Height => ("com.google.height", "com.google.height.summary"),
            MetricFamily::ActivitySegments => {
                ("com.google.activity.segment", "com.google.activity.summary")
            }
        };
        DataTypePair { source, aggregate }
    }

    /// Key holding the value in daily records, as existing callers read it.
    pub fn daily_value_key(&self) -> &'static str {
        match self {
            MetricFamily::Distance => "distance",
            MetricFamily::Steps => "steps",
            MetricFamily::Calories => "calorie",
            MetricFamily::Weight | MetricFamily::Height => "value",
            MetricFamily::ActivitySegments => "activity",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricFamily::Distance => "distance",
            MetricFamily::Steps => "steps",
            MetricFamily::Calories => "calories",
            MetricFamily::Weight => "weight",
            MetricFamily::Height => "height",
            MetricFamily::ActivitySegments => "activity",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricFamily {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        MetricFamily::ALL
            .into_iter()
            .find(|m| m.name() == lowered)
            .ok_or_else(|| FitError::InvalidInput(format!("unknown metric: {s}")))
    }
}

/// Ordered field names of a platform data type. Values in a point are
/// positional and line up with this list.
pub fn field_names(data_type: &str) -> &'static [&'static str] {
    match data_type {
        "com.google.distance.delta" => &["distance"],
        "com.google.step_count.delta" => &["steps"],
        "com.google.calories.expended" => &["calories"],
        "com.google.weight" => &["weight"],
        "com.google.height" => &["height"],
        "com.google.weight.summary" | "com.google.height.summary" => {
            &["average", "max", "min"]
        }
        "com.google.activity.segment" => &["activity"],
        "com.google.activity.summary" => &["activity", "duration", "num_segments"],
        _ => &[],
    }
}

/// Name of the field at `index`, falling back to `field_<index>` past the known list.
pub fn field_name(data_type: &str, index: usize) -> String {
    field_names(data_type)
        .get(index)
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| format!("field_{index}"))
}
