use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DatapointValue – a single named value inside a reading
// ---------------------------------------------------------------------------

/// A datapoint value as delivered by the pipeline: integer, float or text.
/// Serialized untagged so plain JSON numbers and strings map straight in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatapointValue {
    Integer(i64),
    /// Integers above `i64::MAX`, kept exact.
    UInteger(u64),
    Float(f64),
    String(String),
}

impl fmt::Display for DatapointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatapointValue::Integer(i) => write!(f, "{i}"),
            DatapointValue::UInteger(u) => write!(f, "{u}"),
            DatapointValue::Float(v) => write!(f, "{v}"),
            DatapointValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for DatapointValue {
    fn from(v: i64) -> Self {
        DatapointValue::Integer(v)
    }
}

impl From<i32> for DatapointValue {
    fn from(v: i32) -> Self {
        DatapointValue::Integer(v.into())
    }
}

impl From<f64> for DatapointValue {
    fn from(v: f64) -> Self {
        DatapointValue::Float(v)
    }
}

impl From<&str> for DatapointValue {
    fn from(v: &str) -> Self {
        DatapointValue::String(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// Reading – one record of a batch
// ---------------------------------------------------------------------------

/// A single reading: the asset it belongs to plus its named datapoints.
///
/// `id`, `ts` and `user_ts` are carried through untouched so the pipeline
/// can rebuild its own reading objects after filtering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Datapoint name → value.
    #[serde(default)]
    pub reading: BTreeMap<String, DatapointValue>,
    /// Empty when the pipeline supplied no asset code.
    #[serde(default)]
    pub asset_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ts: Option<u64>,
}

impl Reading {
    pub fn new<K, V, I>(asset_code: &str, datapoints: I) -> Self
    where
        K: Into<String>,
        V: Into<DatapointValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Reading {
            reading: datapoints
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            asset_code: asset_code.to_string(),
            ..Default::default()
        }
    }

    /// Number of datapoints.
    pub fn len(&self) -> usize {
        self.reading.len()
    }

    /// Whether the reading carries no datapoints.
    pub fn is_empty(&self) -> bool {
        self.reading.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ReadingBatch – what the pipeline hands over per call
// ---------------------------------------------------------------------------

/// An ordered batch of readings.
pub type ReadingBatch = Vec<Reading>;
