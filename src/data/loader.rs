use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{DatapointValue, Reading, ReadingBatch};
use crate::state::ConfigEnvelope;

/// Columns of a CSV batch that are not datapoints.
const ASSET_COLUMN: &str = "asset_code";
const ID_COLUMNS: [&str; 3] = ["id", "ts", "user_ts"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a reading batch from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `[{ "asset_code": "lab1", "reading": { "power": 5980 } }, ...]`
/// * `.csv`  – `asset_code` column, optional `id` / `ts` / `user_ts`,
///   every other column is a datapoint
pub fn load_batch(path: &Path) -> Result<ReadingBatch> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load a configuration envelope.
///
/// Accepts either the envelope itself (`{"config": "<json string>"}`) or a
/// bare filter configuration object, which is wrapped as-is.
pub fn load_envelope(path: &Path) -> Result<ConfigEnvelope> {
    let text = std::fs::read_to_string(path).context("reading configuration file")?;
    envelope_from_str(&text)
}

fn envelope_from_str(text: &str) -> Result<ConfigEnvelope> {
    let root: JsonValue = serde_json::from_str(text).context("parsing configuration JSON")?;
    let obj = root
        .as_object()
        .context("Expected top-level JSON object")?;

    match obj.get("config") {
        Some(JsonValue::String(config)) => Ok(ConfigEnvelope::new(config.as_str())),
        Some(other) => bail!("'config' must be a JSON string, got {other}"),
        None => Ok(ConfigEnvelope::new(text.trim())),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<ReadingBatch> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            Reading::deserialize(rec).with_context(|| format!("Row {i} is not a valid reading"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names.
///   `asset_code,id,ts,power_set1,state`
///   `lab1,1,1700000000,5980,on`
/// Empty cells are skipped, so rows of one file may carry different
/// datapoints.
fn load_csv(path: &Path) -> Result<ReadingBatch> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<ReadingBatch> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let asset_idx = headers
        .iter()
        .position(|h| h == ASSET_COLUMN)
        .context("CSV missing 'asset_code' column")?;

    let mut readings = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut reading = Reading {
            asset_code: record.get(asset_idx).unwrap_or("").to_string(),
            ..Default::default()
        };
        let mut datapoints = BTreeMap::new();

        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == asset_idx || value.is_empty() {
                continue;
            }
            let col_name = headers[col_idx].as_str();
            match col_name {
                name if ID_COLUMNS.contains(&name) => {
                    let parsed = value.trim().parse::<u64>().with_context(|| {
                        format!("CSV row {row_no}, {col_name}: '{value}' is not an unsigned integer")
                    })?;
                    match col_name {
                        "id" => reading.id = Some(parsed),
                        "ts" => reading.ts = Some(parsed),
                        _ => reading.user_ts = Some(parsed),
                    }
                }
                _ => {
                    datapoints.insert(col_name.to_string(), guess_value_type(value));
                }
            }
        }

        reading.reading = datapoints;
        readings.push(reading);
    }

    Ok(readings)
}

fn guess_value_type(s: &str) -> DatapointValue {
    if let Ok(i) = s.trim().parse::<i64>() {
        return DatapointValue::Integer(i);
    }
    if let Ok(u) = s.trim().parse::<u64>() {
        return DatapointValue::UInteger(u);
    }
    if let Ok(f) = s.trim().parse::<f64>() {
        return DatapointValue::Float(f);
    }
    DatapointValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Write a batch in the layout [`load_batch`] reads back: `asset_code`,
/// `id`, `ts`, `user_ts`, then one column per datapoint name seen anywhere.
pub fn write_csv(path: &Path, readings: &[Reading]) -> Result<()> {
    let writer = csv::Writer::from_path(path).context("creating CSV")?;
    write_csv_to(writer, readings)
}

fn write_csv_to<W: std::io::Write>(mut writer: csv::Writer<W>, readings: &[Reading]) -> Result<()> {
    let names: BTreeSet<&str> = readings
        .iter()
        .flat_map(|r| r.reading.keys().map(String::as_str))
        .collect();

    let mut header = vec![ASSET_COLUMN];
    header.extend(ID_COLUMNS);
    header.extend(names.iter().copied());
    writer.write_record(&header).context("writing CSV header")?;

    let optional = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_default();
    for (row_no, r) in readings.iter().enumerate() {
        let mut row = vec![
            r.asset_code.clone(),
            optional(r.id),
            optional(r.ts),
            optional(r.user_ts),
        ];
        row.extend(names.iter().map(|name| match r.reading.get(*name) {
            Some(value) => csv_cell(value),
            None => String::new(),
        }));
        writer
            .write_record(&row)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Floats always keep a fractional part so they read back as floats.
fn csv_cell(value: &DatapointValue) -> String {
    match value {
        DatapointValue::Float(v) => format!("{v:?}"),
        DatapointValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
