use serde::{Deserialize, Serialize};

use crate::data::filter::{apply_offset, FilterConfig};
use crate::data::model::{Reading, ReadingBatch};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Configuration envelope
// ---------------------------------------------------------------------------

/// What the pipeline passes on every configuration change: the filter
/// configuration as a JSON object encoded in a string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigEnvelope {
    /// Absent is treated as `"{}"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl ConfigEnvelope {
    pub fn new(config: impl Into<String>) -> Self {
        Self {
            config: Some(config.into()),
        }
    }

    fn config_text(&self) -> &str {
        self.config.as_deref().unwrap_or("{}")
    }
}

// ---------------------------------------------------------------------------
// Filter store
// ---------------------------------------------------------------------------

/// Active filter configuration, owned by the host pipeline.
///
/// Starts unconfigured (empty allow-list, so every batch passes through)
/// and is replaced wholesale by each successful [`FilterStore::update`].
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    config: FilterConfig,
    configured: bool,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration with the one carried in `envelope`.
    ///
    /// Nothing is merged with the previous configuration. On a parse error
    /// the previous configuration stays active.
    pub fn update(&mut self, envelope: &ConfigEnvelope) -> Result<bool> {
        let config = FilterConfig::from_json(envelope.config_text())?;
        log::debug!(
            "filter configuration replaced: {} asset code(s), clamp {}",
            config.asset_code.as_ref().map_or(0, |codes| codes.len()),
            if config.clamps() { "on" } else { "off" }
        );
        self.config = config;
        self.configured = true;
        Ok(true)
    }

    /// The configuration every following batch is filtered with.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Whether `update` has succeeded at least once.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Filter a batch in place. Returns how many readings were modified.
    pub fn apply(&self, readings: &mut [Reading]) -> Result<usize> {
        let modified = apply_offset(&self.config, readings)?;
        log::debug!("{modified} of {} reading(s) offset", readings.len());
        Ok(modified)
    }

    /// Filter a batch, handing the same readings back in the same order.
    pub fn transform(&self, mut readings: ReadingBatch) -> Result<ReadingBatch> {
        self.apply(&mut readings)?;
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DatapointValue;
    use crate::error::FilterError;
    use assert_matches::assert_matches;

    fn lab1_batch() -> ReadingBatch {
        vec![Reading::new("lab1", [("power_set1", 5980)])]
    }

    #[test]
    fn starts_unconfigured_and_passes_everything() {
        let store = FilterStore::new();
        assert!(!store.is_configured());
        assert_eq!(store.transform(lab1_batch()).unwrap(), lab1_batch());
    }

    #[test]
    fn update_reports_success() {
        let mut store = FilterStore::new();
        let ok = store
            .update(&ConfigEnvelope::new(r#"{"asset_code": ["lab1"]}"#))
            .unwrap();
        assert!(ok);
        assert!(store.is_configured());
    }

    #[test]
    fn update_replaces_instead_of_merging() {
        let mut store = FilterStore::new();
        store
            .update(&ConfigEnvelope::new(r#"{"asset_code": ["lab1"], "max_value": 6000}"#))
            .unwrap();
        store
            .update(&ConfigEnvelope::new(r#"{"asset_code": ["lab1"]}"#))
            .unwrap();

        assert!(!store.config().clamps());
        let out = store.transform(lab1_batch()).unwrap();
        assert_eq!(out[0].reading["power_set1"], DatapointValue::Integer(10980));
    }

    #[test]
    fn missing_config_field_means_empty_object() {
        let mut store = FilterStore::new();
        store
            .update(&ConfigEnvelope::new(r#"{"asset_code": ["lab1"]}"#))
            .unwrap();
        store.update(&ConfigEnvelope::default()).unwrap();

        assert_eq!(store.config(), &FilterConfig::default());
    }

    #[test]
    fn invalid_json_keeps_previous_config() {
        let mut store = FilterStore::new();
        store
            .update(&ConfigEnvelope::new(r#"{"asset_code": ["lab1"]}"#))
            .unwrap();

        assert_matches!(
            store.update(&ConfigEnvelope::new("{not json")),
            Err(FilterError::ConfigParse(_))
        );
        assert!(store.config().allows("lab1"));
    }

    #[test]
    fn envelope_decodes_from_pipeline_json() {
        let env: ConfigEnvelope =
            serde_json::from_str(r#"{"config": "{\"asset_code\": [\"lab1\"]}"}"#).unwrap();
        assert_eq!(env.config_text(), r#"{"asset_code": ["lab1"]}"#);
    }
}
