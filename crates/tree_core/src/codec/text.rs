//! Canonical JSON model format
//!
//! Object keys are sorted recursively and the output is pretty-printed with a
//! fixed indent, so identical models always produce identical text:
//!
//! ```json
//! {
//!   "descriptor": { "num_classes": 2, "num_features": 1 },
//!   "format_version": 1,
//!   "nodes": [
//!     { "split": { "feature_index": 0, "left": 1, "right": 2, "threshold": 0.5 } },
//!     { "leaf": { "class_index": 0 } },
//!     { "leaf": { "class_index": 1 } }
//!   ],
//!   "root_index": 0
//! }
//! ```

use super::FORMAT_VERSION;
use crate::descriptor::ModelDescriptor;
use crate::errors::{Result, TreeError};
use crate::model::Model;
use crate::tree::Node;
use crate::validation::ValidationLimits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct ModelDocument {
    format_version: u16,
    descriptor: ModelDescriptor,
    root_index: u32,
    nodes: Vec<Node>,
}

/// Serialize a model to canonical JSON
pub fn encode(model: &Model) -> Result<String> {
    let document = ModelDocument {
        format_version: FORMAT_VERSION,
        descriptor: model.descriptor().clone(),
        root_index: model.table().root_index(),
        nodes: model.table().nodes().to_vec(),
    };
    let value = sorted(serde_json::to_value(&document)?);
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Parse and validate a JSON model; every failure is `CorruptModel`
pub fn decode(json: &str, limits: &ValidationLimits) -> Result<Model> {
    let result = serde_json::from_str::<ModelDocument>(json)
        .map_err(|e| e.to_string())
        .and_then(|document| {
            if document.format_version != FORMAT_VERSION {
                return Err(format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    document.format_version
                ));
            }
            Model::assemble(document.descriptor, document.nodes, document.root_index, limits)
                .map_err(|v| v.to_string())
        });

    match result {
        Ok(model) => {
            debug!(nodes = model.table().len(), "Decoded JSON model");
            Ok(model)
        }
        Err(reason) => {
            warn!(%reason, "Rejected JSON model");
            Err(TreeError::CorruptModel(reason))
        }
    }
}

/// Rebuild `value` with every object's keys in byte order, independent of
/// how `serde_json` orders maps.
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key, sorted(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        scalar => scalar,
    }
}
