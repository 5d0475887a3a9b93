//! Deployment verification
//!
//! A deployment pins the model it expects:
//!
//! ```toml
//! [model]
//! path = "models/activity/model.bin"
//! expected_hash = "5f1c..."
//! ```

use crate::commands::load;
use activity_tree_core::codec::artifact_hash_hex;
use activity_tree_core::EngineConfig;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;
use tracing::info;

pub const DEFAULT_DEPLOY_CONFIG: &str = "config/deploy.toml";

#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub model_path: PathBuf,
    pub hash: String,
    pub nodes: usize,
}

/// Read `[model] path` and `[model] expected_hash`
pub fn parse_model_entry(config_path: &Path) -> Result<(PathBuf, String)> {
    let contents = fs::read_to_string(config_path)
        .with_context(|| format!("Unable to read config file at {}", config_path.display()))?;

    let value: Value = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse TOML at {}", config_path.display()))?;

    let model_table = value
        .get("model")
        .and_then(Value::as_table)
        .context("Missing [model] section with path and expected_hash")?;

    let model_path = model_table
        .get("path")
        .and_then(Value::as_str)
        .context("Missing model.path entry")?;

    let expected_hash = model_table
        .get("expected_hash")
        .and_then(Value::as_str)
        .context("Missing model.expected_hash entry")?
        .trim()
        .to_ascii_lowercase();

    Ok((PathBuf::from(model_path), expected_hash))
}

/// Check the deployed artifact against its pinned hash, then make sure it
/// decodes under the engine limits.
pub fn verify(config_path: &Path, engine: &EngineConfig) -> Result<Verification> {
    let (model_path, expected_hash) = parse_model_entry(config_path)?;

    let bytes = fs::read(&model_path)
        .with_context(|| format!("Failed to read model at {}", model_path.display()))?;
    let actual_hash = artifact_hash_hex(&bytes);

    if actual_hash != expected_hash {
        bail!(
            "Model hash mismatch for {}: expected {}, got {}",
            model_path.display(),
            expected_hash,
            actual_hash
        );
    }

    let (model, _) = load(&model_path, engine)?;
    info!(
        "Model {} verified (hash {})",
        model_path.display(),
        actual_hash
    );

    Ok(Verification {
        model_path,
        hash: actual_hash,
        nodes: model.table().len(),
    })
}
