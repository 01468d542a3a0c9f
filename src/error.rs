use thiserror::Error;

/// Failures surfaced by the configuration store and the batch transformer.
///
/// Nothing here is recovered locally: every variant propagates to whoever
/// called `update` or `transform`.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The `config` string is not valid JSON or does not fit the schema.
    #[error("invalid filter configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A datapoint of a matching reading holds a non-numeric value.
    #[error("asset '{asset_code}', datapoint '{datapoint}': expected a number, found {found}")]
    TypeMismatch {
        asset_code: String,
        datapoint: String,
        found: String,
    },

    /// Clamping is enabled but the bound is missing or not an integer.
    #[error("invalid clamp bound: {0}")]
    InvalidBound(String),

    #[error("asset '{asset_code}', datapoint '{datapoint}': offset overflows i64")]
    Overflow {
        asset_code: String,
        datapoint: String,
    },
}

pub type Result<T, E = FilterError> = std::result::Result<T, E>;
