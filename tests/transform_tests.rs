//! Integration tests for the readings filter.
//!
//! Drives [`FilterStore`] the way a pipeline host does: configuration
//! envelopes in through `update`, JSON batches in through `transform`.

use assert_matches::assert_matches;
use serde_json::json;

use asset_offset_filter::{ConfigEnvelope, FilterError, FilterStore, ReadingBatch};

fn configured(config: serde_json::Value) -> FilterStore {
    let mut store = FilterStore::new();
    let ok = store
        .update(&ConfigEnvelope::new(config.to_string()))
        .expect("configuration should parse");
    assert!(ok);
    store
}

fn batch(value: serde_json::Value) -> ReadingBatch {
    serde_json::from_value(value).expect("batch should decode")
}

fn run(store: &FilterStore, input: serde_json::Value) -> serde_json::Value {
    let out = store.transform(batch(input)).expect("transform should succeed");
    serde_json::to_value(out).expect("batch should serialize")
}

// ---------------------------------------------------------------------------
// Pipeline scenarios
// ---------------------------------------------------------------------------

/// Allow-listed reading without a bound gets the plain offset.
#[test]
fn matching_reading_is_offset() {
    let store = configured(json!({"asset_code": ["lab1"]}));
    let out = run(
        &store,
        json!([{"reading": {"power_set1": 5980}, "asset_code": "lab1"}]),
    );
    assert_eq!(
        out,
        json!([{"reading": {"power_set1": 10980}, "asset_code": "lab1"}])
    );
}

/// Marker plus `fixed` bound clamps the offset value.
#[test]
fn matching_reading_is_clamped_by_fixed_bound() {
    let store = configured(json!({"asset_code": ["lab1"], "max_value": true, "fixed": 10000}));
    let out = run(
        &store,
        json!([{"reading": {"power_set1": 5980}, "asset_code": "lab1"}]),
    );
    assert_eq!(out[0]["reading"]["power_set1"], 10000);
}

/// Reading of an asset that is not allow-listed is untouched.
#[test]
fn other_asset_passes_through() {
    let store = configured(json!({"asset_code": ["lab2"]}));
    let input = json!([{"reading": {"power_set1": 5980}, "asset_code": "lab1"}]);
    assert_eq!(run(&store, input.clone()), input);
}

/// An empty batch comes back empty, even with an unusable bound.
#[test]
fn empty_batch_stays_empty() {
    let store = configured(json!({"asset_code": ["lab1"], "max_value": true}));
    assert_eq!(run(&store, json!([])), json!([]));
}

/// An empty asset code never matches, even if listed.
#[test]
fn empty_asset_code_passes_through() {
    let store = configured(json!({"asset_code": ["", "lab1"]}));
    let input = json!([{"reading": {"power_set1": 5980}, "asset_code": ""}]);
    assert_eq!(run(&store, input.clone()), input);
}

/// A `max_value` key set to null still enables the `fixed` bound.
#[test]
fn null_max_value_clamps_to_fixed() {
    let store = configured(json!({"asset_code": ["lab1"], "max_value": null, "fixed": 10000}));
    let out = run(
        &store,
        json!([{"reading": {"p": 5980}, "asset_code": "lab1"}]),
    );
    assert_eq!(out, json!([{"reading": {"p": 10000}, "asset_code": "lab1"}]));
}

/// Integers beyond i64 on an unlisted asset come back exactly as sent.
#[test]
fn large_integer_on_other_asset_is_unchanged() {
    let store = configured(json!({"asset_code": ["lab2"]}));
    let input = r#"[{"reading":{"p":18446744073709551615},"asset_code":"lab1"}]"#;
    let out = store
        .transform(serde_json::from_str(input).expect("batch should decode"))
        .expect("transform should succeed");
    assert_eq!(serde_json::to_string(&out).expect("serialize"), input);
}

// ---------------------------------------------------------------------------
// Batch-wide properties
// ---------------------------------------------------------------------------

/// Order, count and untouched fields survive a mixed batch.
#[test]
fn mixed_batch_keeps_order_and_metadata() {
    let store = configured(json!({"asset_code": ["lab1", "lab3"], "max_value": 9000}));
    let out = run(
        &store,
        json!([
            {"reading": {"a": 100, "b": 7000}, "asset_code": "lab1", "id": 1, "ts": 10},
            {"reading": {"a": 100}, "asset_code": "lab2", "id": 2, "ts": 11},
            {"reading": {"t": 1.5}, "asset_code": "lab3", "id": 3, "user_ts": 12}
        ]),
    );
    assert_eq!(
        out,
        json!([
            {"reading": {"a": 5100, "b": 9000}, "asset_code": "lab1", "id": 1, "ts": 10},
            {"reading": {"a": 100}, "asset_code": "lab2", "id": 2, "ts": 11},
            {"reading": {"t": 5001.5}, "asset_code": "lab3", "id": 3, "user_ts": 12}
        ])
    );
}

/// Before any update nothing matches.
#[test]
fn unconfigured_store_is_identity() {
    let store = FilterStore::new();
    let input = json!([
        {"reading": {"power_set1": 5980}, "asset_code": "lab1"},
        {"reading": {"power_set1": 211}, "asset_code": "lab2"}
    ]);
    assert_eq!(run(&store, input.clone()), input);
}

/// Repeating the same update changes nothing.
#[test]
fn repeated_update_is_idempotent() {
    let config = json!({"asset_code": ["lab1"], "max_value": 10500});
    let once = configured(config.clone());
    let mut twice = configured(config.clone());
    twice
        .update(&ConfigEnvelope::new(config.to_string()))
        .expect("second update");

    let input = json!([{"reading": {"x": 5980, "y": 1}, "asset_code": "lab1"}]);
    assert_eq!(run(&once, input.clone()), run(&twice, input));
}

/// Every datapoint of a matching reading is updated.
#[test]
fn all_datapoints_of_a_match_are_updated() {
    let store = configured(json!({"asset_code": ["lab1"]}));
    let out = run(
        &store,
        json!([{"reading": {"a": 0, "b": -5000, "c": 2.5}, "asset_code": "lab1"}]),
    );
    assert_eq!(out[0]["reading"], json!({"a": 5000, "b": 0, "c": 5002.5}));
}

// ---------------------------------------------------------------------------
// Error propagation
// ---------------------------------------------------------------------------

/// Malformed configuration JSON surfaces as a parse error.
#[test]
fn malformed_config_is_rejected() {
    let mut store = FilterStore::new();
    assert_matches!(
        store.update(&ConfigEnvelope::new("{\"asset_code\": [")),
        Err(FilterError::ConfigParse(_))
    );
    assert!(!store.is_configured());
}

/// Text datapoint on a matching reading fails the whole call.
#[test]
fn text_datapoint_fails_transform() {
    let store = configured(json!({"asset_code": ["lab1"]}));
    let result = store.transform(batch(json!([
        {"reading": {"state": "running"}, "asset_code": "lab1"}
    ])));
    assert_matches!(result, Err(FilterError::TypeMismatch { .. }));
}

/// Text datapoint on a non-matching reading is fine.
#[test]
fn text_datapoint_on_other_asset_is_ignored() {
    let store = configured(json!({"asset_code": ["lab1"]}));
    let input = json!([{"reading": {"state": "running"}, "asset_code": "lab2"}]);
    assert_eq!(run(&store, input.clone()), input);
}

/// A non-integer bound fails once a reading needs clamping.
#[test]
fn non_integer_bound_fails_transform() {
    let store = configured(json!({"asset_code": ["lab1"], "max_value": true, "fixed": "lots"}));
    let result = store.transform(batch(json!([
        {"reading": {"power_set1": 1}, "asset_code": "lab1"}
    ])));
    assert_matches!(result, Err(FilterError::InvalidBound(_)));
}
