use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use asset_offset_filter::data::loader::{load_batch, load_envelope};
use asset_offset_filter::FilterStore;

const USAGE: &str = "usage: asset-offset-filter <config.json> <readings.json|readings.csv>";

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(config_path), Some(readings_path), None) = (args.next(), args.next(), args.next())
    else {
        bail!("{USAGE}");
    };

    let envelope = load_envelope(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let mut store = FilterStore::new();
    store
        .update(&envelope)
        .with_context(|| format!("applying {}", config_path.display()))?;

    let batch = load_batch(&readings_path)
        .with_context(|| format!("loading {}", readings_path.display()))?;
    log::info!("loaded {} reading(s) from {}", batch.len(), readings_path.display());

    let filtered = store.transform(batch).context("filtering readings")?;

    let out = serde_json::to_string_pretty(&filtered).context("serializing readings")?;
    println!("{out}");
    Ok(())
}
