use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use super::model::{DatapointValue, Reading};
use crate::error::{FilterError, Result};

/// Added to every datapoint of an allow-listed reading.
pub const OFFSET: i64 = 5000;

// ---------------------------------------------------------------------------
// Filter configuration: allow-list plus optional clamp bound
// ---------------------------------------------------------------------------

/// Typed form of the JSON object carried in the configuration envelope.
///
/// ```json
/// { "asset_code": ["lab1", "lab2"], "max_value": 10000 }
/// ```
///
/// `max_value` is the canonical bound. The older layout, where `max_value`
/// is only a boolean marker and the bound sits in `fixed`, is still read:
///
/// ```json
/// { "asset_code": ["lab1"], "max_value": true, "fixed": 10000 }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Allow-list. Absent means nothing matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<BTreeSet<String>>,
    /// Clamp bound, or a marker enabling the `fixed` bound. The outer
    /// `Option` is key presence: `"max_value": null` still switches
    /// clamping on.
    #[serde(
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_value: Option<Option<BoundValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<BoundValue>,
}

/// Maps a present key to `Some`, whatever its value, `null` included.
fn present_key<'de, D>(deserializer: D) -> Result<Option<Option<BoundValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BoundValue>::deserialize(deserializer).map(Some)
}

/// Whatever JSON scalar was written in a bound field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl BoundValue {
    /// Read the value as an integer bound, truncating floats toward zero.
    fn as_bound(&self, field: &str) -> Result<i64> {
        match self {
            BoundValue::Integer(n) => Ok(*n),
            BoundValue::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                Ok(f.trunc() as i64)
            }
            BoundValue::Float(f) => Err(FilterError::InvalidBound(format!(
                "'{field}' value {f} does not fit an integer"
            ))),
            BoundValue::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                FilterError::InvalidBound(format!("'{field}' value {s:?} is not an integer"))
            }),
            BoundValue::Flag(b) => Err(FilterError::InvalidBound(format!(
                "'{field}' holds the boolean {b}, expected an integer"
            ))),
        }
    }
}

impl FilterConfig {
    /// Decode the JSON object carried in an envelope's `config` string.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether readings of `asset_code` are eligible for the offset.
    /// An empty asset code never matches.
    pub fn allows(&self, asset_code: &str) -> bool {
        !asset_code.is_empty()
            && self
                .asset_code
                .as_ref()
                .is_some_and(|codes| codes.contains(asset_code))
    }

    /// Whether clamping is switched on.
    pub fn clamps(&self) -> bool {
        self.max_value.is_some()
    }

    /// Resolve the clamp bound, `None` when clamping is off.
    pub fn clamp_bound(&self) -> Result<Option<i64>> {
        match &self.max_value {
            None => Ok(None),
            Some(None | Some(BoundValue::Flag(_))) => match &self.fixed {
                Some(fixed) => fixed.as_bound("fixed").map(Some),
                None => Err(FilterError::InvalidBound(
                    "'max_value' is a marker but 'fixed' is missing".to_string(),
                )),
            },
            Some(Some(bound)) => bound.as_bound("max_value").map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch transform
// ---------------------------------------------------------------------------

/// Offset (and optionally clamp) every datapoint of the allow-listed readings
/// in place. Returns how many readings were modified.
///
/// Readings are processed in order and the first failure stops the pass.
/// A failing reading is left as it was: its new values are only written
/// once all of them have been computed.
///
/// The clamp bound is resolved on first use, so a batch without matches
/// never fails on a bad bound.
pub fn apply_offset(config: &FilterConfig, readings: &mut [Reading]) -> Result<usize> {
    let mut bound: Option<Option<i64>> = None;
    let mut modified = 0;

    for elem in readings.iter_mut() {
        if !config.allows(&elem.asset_code) || elem.is_empty() {
            continue;
        }

        let limit = match bound {
            Some(limit) => limit,
            None => *bound.insert(config.clamp_bound()?),
        };

        let updated = offset_reading(elem, limit)?;
        for (slot, value) in elem.reading.values_mut().zip(updated) {
            *slot = value;
        }
        modified += 1;
    }

    Ok(modified)
}

/// New values for every datapoint of `elem`, in map order.
fn offset_reading(elem: &Reading, limit: Option<i64>) -> Result<Vec<DatapointValue>> {
    elem.reading
        .iter()
        .map(|(name, value)| {
            let overflow = || FilterError::Overflow {
                asset_code: elem.asset_code.clone(),
                datapoint: name.clone(),
            };
            let shifted = match value {
                DatapointValue::Integer(i) => i
                    .checked_add(OFFSET)
                    .map(DatapointValue::Integer)
                    .ok_or_else(overflow)?,
                DatapointValue::UInteger(u) => u
                    .checked_add(OFFSET as u64)
                    .map(DatapointValue::UInteger)
                    .ok_or_else(overflow)?,
                DatapointValue::Float(f) => DatapointValue::Float(f + OFFSET as f64),
                DatapointValue::String(_) => {
                    return Err(FilterError::TypeMismatch {
                        asset_code: elem.asset_code.clone(),
                        datapoint: name.clone(),
                        found: value.to_string(),
                    })
                }
            };
            Ok(clamp(shifted, limit, &elem.asset_code, name))
        })
        .collect()
}

fn clamp(value: DatapointValue, limit: Option<i64>, asset_code: &str, name: &str) -> DatapointValue {
    let Some(max) = limit else {
        return value;
    };
    let exceeds = match &value {
        DatapointValue::Integer(i) => *i > max,
        DatapointValue::UInteger(u) => i128::from(*u) > i128::from(max),
        DatapointValue::Float(f) => *f > max as f64,
        DatapointValue::String(_) => false,
    };
    if exceeds {
        log::trace!("{asset_code}.{name}: {value} clamped to {max}");
        DatapointValue::Integer(max)
    } else {
        value
    }
}
