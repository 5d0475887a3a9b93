//! Subcommand implementations
//!
//! Each command returns a report; `main` decides how to print it.

use activity_tree_core::codec::{artifact_hash_hex, binary, Encoding, FORMAT_VERSION};
use activity_tree_core::storage::decode_any;
use activity_tree_core::{
    EngineConfig, Model, ModelBuilder, SklearnTree, Trace, TrainedModel,
};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Shape of the trained-tree document handed to `build`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Nested `{"split": ...}` / `{"leaf": ...}` document
    Nested,
    /// scikit-learn `tree_` arrays
    Sklearn,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub model_path: PathBuf,
    pub hash_path: PathBuf,
    pub hash: String,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    pub bytes: usize,
}

/// Build a trained tree into `model.bin` + `model.hash` under `output`
pub fn build(
    input: &Path,
    format: InputFormat,
    output: &Path,
    config: &EngineConfig,
) -> Result<BuildReport> {
    let builder = ModelBuilder::from_config(config);
    let model = match format {
        InputFormat::Nested => {
            let trained = TrainedModel::from_json_file(input)
                .with_context(|| format!("Failed to read trained tree {}", input.display()))?;
            builder.build(&trained)
        }
        InputFormat::Sklearn => {
            let tree = SklearnTree::from_json_file(input)
                .with_context(|| format!("Failed to read scikit-learn tree {}", input.display()))?;
            builder.build_sklearn(tree)
        }
    }
    .context("Model build failed")?;

    fs::create_dir_all(output).context("Failed to create output directory")?;

    let bytes = binary::encode(&model, &config.codec);
    let hash = artifact_hash_hex(&bytes);

    let model_path = output.join("model.bin");
    fs::write(&model_path, &bytes).context("Failed to write model file")?;

    let hash_path = output.join("model.hash");
    fs::write(&hash_path, &hash).context("Failed to write hash file")?;

    info!(
        nodes = model.table().len(),
        depth = model.table().depth(),
        hash = %hash,
        "Model written to {}",
        model_path.display()
    );

    Ok(BuildReport {
        model_path,
        hash_path,
        hash,
        nodes: model.table().len(),
        leaves: model.table().leaf_count(),
        depth: model.table().depth(),
        bytes: bytes.len(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub path: PathBuf,
    pub encoding: &'static str,
    pub format_version: u16,
    /// Binary header flags; JSON documents carry none
    pub flags: Option<u16>,
    pub num_features: usize,
    pub num_classes: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    pub root_index: u32,
    pub model_hash: String,
    pub artifact_hash: String,
    pub class_names: Option<Vec<String>>,
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model:         {} ({})", self.path.display(), self.encoding)?;
        match self.flags {
            Some(flags) => writeln!(
                f,
                "Format:        v{} (flags {:#06x})",
                self.format_version, flags
            )?,
            None => writeln!(f, "Format:        v{}", self.format_version)?,
        }
        writeln!(f, "Features:      {}", self.num_features)?;
        writeln!(f, "Classes:       {}", self.num_classes)?;
        if let Some(names) = &self.class_names {
            writeln!(f, "Class names:   {}", names.join(", "))?;
        }
        writeln!(f, "Nodes:         {} ({} leaves)", self.nodes, self.leaves)?;
        writeln!(f, "Depth:         {}", self.depth)?;
        writeln!(f, "Root index:    {}", self.root_index)?;
        writeln!(f, "Model hash:    {}", self.model_hash)?;
        write!(f, "Artifact hash: {}", self.artifact_hash)
    }
}

/// Read and validate a model file in either encoding
pub fn load(path: &Path, config: &EngineConfig) -> Result<(Model, Vec<u8>)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let model = decode_any(&bytes, &config.limits)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    debug!(path = %path.display(), nodes = model.table().len(), "Model loaded");
    Ok((model, bytes))
}

pub fn inspect(path: &Path, config: &EngineConfig) -> Result<Inspection> {
    let (model, bytes) = load(path, config)?;
    let (encoding, format_version, flags) = match Encoding::sniff(&bytes) {
        Encoding::Binary => {
            let header = binary::read_header(&bytes)
                .with_context(|| format!("Failed to read header of {}", path.display()))?;
            ("binary", header.version, Some(header.flags))
        }
        Encoding::Json => ("json", FORMAT_VERSION, None),
    };

    Ok(Inspection {
        path: path.to_path_buf(),
        encoding,
        format_version,
        flags,
        num_features: model.num_features(),
        num_classes: model.num_classes(),
        nodes: model.table().len(),
        leaves: model.table().leaf_count(),
        depth: model.table().depth(),
        root_index: model.table().root_index(),
        model_hash: model.hash_hex(),
        artifact_hash: artifact_hash_hex(&bytes),
        class_names: model.descriptor().class_names.clone(),
    })
}

/// Parse a comma separated feature vector.
///
/// Positions are preserved: an empty field is an error, except a single
/// trailing one (`"1,2,"`).
pub fn parse_features(csv: &str) -> Result<Vec<f32>> {
    let fields: Vec<&str> = csv.split(',').map(str::trim).collect();
    let last = fields.len() - 1;

    fields
        .iter()
        .enumerate()
        .filter(|&(i, field)| !(i == last && field.is_empty()))
        .map(|(i, field)| {
            if field.is_empty() {
                bail!("Feature {} is empty", i);
            }
            field
                .parse::<f32>()
                .with_context(|| format!("Feature {} is not a number: {:?}", i, field))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub class_index: usize,
    pub class_name: Option<String>,
    pub trace: Option<Trace>,
}

pub fn classify(
    path: &Path,
    features: &[f32],
    with_trace: bool,
    config: &EngineConfig,
) -> Result<Classification> {
    let (model, _) = load(path, config)?;

    let (class_index, trace) = if with_trace {
        let trace = model.trace(features).context("Classification failed")?;
        (trace.class_index, Some(trace))
    } else {
        (model.classify(features).context("Classification failed")?, None)
    };

    Ok(Classification {
        class_index,
        class_name: model.class_name(class_index).map(str::to_owned),
        trace,
    })
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(trace) = &self.trace {
            for step in &trace.path {
                writeln!(
                    f,
                    "node {:>4}: f[{}] = {} {} {} -> {}",
                    step.node,
                    step.feature_index,
                    step.value,
                    if step.went_left { "<=" } else { ">" },
                    step.threshold,
                    if step.went_left { "left" } else { "right" },
                )?;
            }
            writeln!(f, "leaf {:>4}", trace.leaf)?;
        }
        match &self.class_name {
            Some(name) => write!(f, "class {} ({})", self.class_index, name),
            None => write!(f, "class {}", self.class_index),
        }
    }
}

/// Write the canonical JSON form of a model
pub fn export_json(path: &Path, output: &Path, config: &EngineConfig) -> Result<String> {
    let (model, _) = load(path, config)?;
    let json = model
        .to_canonical_json()
        .context("Failed to serialize model")?;
    fs::write(output, &json)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Exported {} to {}", path.display(), output.display());
    Ok(json)
}
