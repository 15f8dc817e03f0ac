//! In-memory shape of a platform read result.
//!
//! A result arrives either bucketed (aggregated reads) or as bare data sets
//! (raw samples). Both carry the same [`DataSet`]s; only discovery differs.

/// Platform read result. Built fresh per query and dropped after translation.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadResult {
    /// Aggregated path: data sets nested inside time buckets.
    Buckets(Vec<Bucket>),
    /// Raw path: unaggregated data sets.
    DataSets(Vec<DataSet>),
}

impl ReadResult {
    pub fn empty() -> Self {
        ReadResult::DataSets(Vec::new())
    }

    /// Pick the path for a result that came back with both collections.
    /// Non-empty buckets win; otherwise the bare data sets are used.
    pub fn from_parts(buckets: Vec<Bucket>, data_sets: Vec<DataSet>) -> Self {
        if !buckets.is_empty() {
            if !data_sets.is_empty() {
                tracing::debug!(
                    ignored = data_sets.len(),
                    "read result carried buckets and bare data sets; using buckets"
                );
            }
            ReadResult::Buckets(buckets)
        } else {
            ReadResult::DataSets(data_sets)
        }
    }

    pub fn is_aggregated(&self) -> bool {
        matches!(self, ReadResult::Buckets(_))
    }

    /// Data sets in bucket-then-dataset order.
    pub fn data_sets(&self) -> Box<dyn Iterator<Item = &DataSet> + '_> {
        match self {
            ReadResult::Buckets(buckets) => {
                Box::new(buckets.iter().flat_map(|b| b.data_sets.iter()))
            }
            ReadResult::DataSets(sets) => Box::new(sets.iter()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ReadResult::Buckets(b) => b.is_empty(),
            ReadResult::DataSets(d) => d.is_empty(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub start_ms: i64,
    pub end_ms: i64,
    pub data_sets: Vec<DataSet>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataSet {
    pub data_type: String,
    pub points: Vec<DataPoint>,
}

impl DataSet {
    pub fn new(data_type: impl Into<String>, points: Vec<DataPoint>) -> Self {
        Self {
            data_type: data_type.into(),
            points,
        }
    }
}

/// One measurement over `[start_ms, end_ms)`.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint {
    pub data_type: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub fields: Vec<FieldValue>,
}

impl DataPoint {
    pub fn new(data_type: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            data_type: data_type.into(),
            start_ms,
            end_ms,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: PlatformValue) -> Self {
        self.fields.push(FieldValue {
            name: name.into(),
            value,
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: PlatformValue,
}

/// Scalar as stored by the platform; the variant depends on the field's format.
#[derive(Clone, Debug, PartialEq)]
pub enum PlatformValue {
    Int(i64),
    Float(f64),
    Text(String),
    Map(Vec<(String, f64)>),
    Absent,
}

impl PlatformValue {
    /// Numeric view of the value, or `None` when it has no finite float form.
    /// Doubles outside the f32 range count as unrepresentable.
    pub fn coerce_f32(&self) -> Option<f32> {
        let v = match self {
            PlatformValue::Int(i) => *i as f32,
            PlatformValue::Float(f) => *f as f32,
            PlatformValue::Text(_) | PlatformValue::Map(_) | PlatformValue::Absent => return None,
        };
        v.is_finite().then_some(v)
    }
}
