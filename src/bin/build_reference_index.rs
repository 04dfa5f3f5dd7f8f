//! Import a directory of package photos into a reference index snapshot.
//!
//! ```text
//! build_reference_index <image_dir> <snapshot.json> [--append] [--allow-duplicates]
//! ```
//!
//! With `--append` an existing snapshot is loaded first and the new images
//! are added to it; otherwise the snapshot is rebuilt from scratch.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use medpack_vision::features::FeatureExtractor;
use medpack_vision::index::{
    load_snapshot, save_snapshot, InMemoryReferenceStore, ReferenceStore, VisualMatchIndex,
};
use medpack_vision::{observability, AppConfig};

struct Args {
    image_dir: PathBuf,
    snapshot: PathBuf,
    append: bool,
    allow_duplicates: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut append = false;
    let mut allow_duplicates = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--append" => append = true,
            "--allow-duplicates" => allow_duplicates = true,
            flag if flag.starts_with("--") => bail!("Unknown flag: {}", flag),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [image_dir, snapshot]: [PathBuf; 2] = positional.try_into().map_err(|_| {
        anyhow::anyhow!(
            "Usage: build_reference_index <image_dir> <snapshot.json> [--append] [--allow-duplicates]"
        )
    })?;

    Ok(Args {
        image_dir,
        snapshot,
        append,
        allow_duplicates,
    })
}

fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let args = parse_args()?;

    let mut config = AppConfig::from_env()?;
    config.index.allow_duplicates |= args.allow_duplicates;
    config.validate()?;

    observability::init_observability_with_config(config.observability.clone())?;
    info!("{}", config.summary());

    let store = if args.append && args.snapshot.exists() {
        load_snapshot(&args.snapshot)
            .with_context(|| format!("Failed to load {}", args.snapshot.display()))?
    } else {
        InMemoryReferenceStore::new()
    };
    let store: Arc<dyn ReferenceStore> = Arc::new(store);
    info!(existing_items = store.len()?, "Reference store ready");

    let extractor = FeatureExtractor::with_config(config.features.clone())?;
    let index = VisualMatchIndex::new(Arc::clone(&store), extractor, config.index.clone())?;

    let report = index
        .import_directory(&args.image_dir)
        .with_context(|| format!("Failed to import {}", args.image_dir.display()))?;
    for (path, reason) in &report.failed {
        tracing::warn!(path = %path.display(), reason = %reason, "Image skipped");
    }

    let saved = save_snapshot(store.as_ref(), &args.snapshot)
        .with_context(|| format!("Failed to write {}", args.snapshot.display()))?;

    info!(
        imported = report.imported.len(),
        duplicates = report.duplicates,
        failed = report.failed.len(),
        total = saved,
        snapshot = %args.snapshot.display(),
        "Reference index snapshot written"
    );
    Ok(())
}
