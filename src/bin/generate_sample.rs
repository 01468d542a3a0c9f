use std::path::Path;

use asset_offset_filter::data::loader::write_csv;
use asset_offset_filter::{BoundValue, ConfigEnvelope, DatapointValue, FilterConfig, Reading};

/// splitmix64 stream, seeded for reproducible samples.
struct SampleRng(u64);

impl SampleRng {
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        ((z ^ (z >> 31)) >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, low: i64, high: i64) -> i64 {
        low + (self.next_f64() * (high - low) as f64) as i64
    }
}

fn main() {
    let mut rng = SampleRng(42);

    // lab1 / lab2 are allow-listed below, lab3 carries a text datapoint and is not
    let assets = ["lab1", "lab2", "lab3"];
    let base_ts: u64 = 1_700_000_000;

    let mut readings = Vec::new();
    let mut id: u64 = 0;
    for step in 0..20u64 {
        for &asset in &assets {
            let mut reading = Reading::new(
                asset,
                [
                    ("power_set1", DatapointValue::Integer(rng.range(0, 8000))),
                    (
                        "temperature",
                        DatapointValue::Float((rng.next_f64() * 400.0).round() / 10.0),
                    ),
                ],
            );
            if asset == "lab3" {
                let state = if rng.next_f64() < 0.5 { "idle" } else { "running" };
                reading.reading.insert("state".to_string(), state.into());
            }
            reading.id = Some(id);
            reading.ts = Some(base_ts + step);
            reading.user_ts = Some(base_ts + step);
            readings.push(reading);
            id += 1;
        }
    }

    // JSON batch
    let json_path = "sample_readings.json";
    let json = serde_json::to_string_pretty(&readings).expect("Failed to serialize readings");
    std::fs::write(json_path, json).expect("Failed to write JSON batch");

    // CSV batch
    let csv_path = "sample_readings.csv";
    write_csv(Path::new(csv_path), &readings).expect("Failed to write CSV batch");

    // Configuration envelope
    let config_path = "sample_config.json";
    let config = FilterConfig {
        asset_code: Some(["lab1", "lab2"].iter().map(|s| s.to_string()).collect()),
        max_value: Some(Some(BoundValue::Integer(10000))),
        fixed: None,
    };
    let envelope = ConfigEnvelope::new(
        serde_json::to_string(&config).expect("Failed to serialize config"),
    );
    let envelope_json =
        serde_json::to_string_pretty(&envelope).expect("Failed to serialize envelope");
    std::fs::write(config_path, envelope_json).expect("Failed to write config");

    println!(
        "Wrote {} readings ({} assets) to {json_path} and {csv_path}, config to {config_path}",
        readings.len(),
        assets.len()
    );
}
