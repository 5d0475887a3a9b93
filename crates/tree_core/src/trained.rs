//! Trained-tree input adapters
//!
//! The offline training process hands over a tree in its own shape. Two
//! shapes are accepted:
//!
//! - [`TrainedModel`]: a nested JSON document, one object per node
//!   (`{"split": {...}}` / `{"leaf": {"class": n}}`).
//! - [`SklearnTree`]: the parallel arrays of a fitted scikit-learn tree
//!   (`children_left`, `children_right`, `feature`, `threshold`, `value`).
//!
//! Both end up as a [`TrainedModel`], which the
//! [`ModelBuilder`](crate::builder::ModelBuilder) flattens into a node table.

use crate::errors::{Result, TreeError};
use crate::validation::{ValidationLimits, HARD_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// scikit-learn's marker for "no child"
pub const TREE_LEAF: i64 = -1;

/// JSON nesting a document may reach: two levels per split
/// (`{"split": {...}}`), two for the deepest leaf, one for the top object.
const MAX_DOCUMENT_NESTING: usize = 2 * HARD_MAX_DEPTH + 3;

/// One node of a nested trained tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainedNode {
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TrainedNode>,
        right: Box<TrainedNode>,
    },
    Leaf {
        class: usize,
    },
}

impl TrainedNode {
    pub fn split(feature: usize, threshold: f32, left: TrainedNode, right: TrainedNode) -> Self {
        TrainedNode::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn leaf(class: usize) -> Self {
        TrainedNode::Leaf { class }
    }
}

/// Trained tree plus the descriptor fields it was trained with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub num_features: usize,
    pub num_classes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub tree: TrainedNode,
}

impl TrainedModel {
    pub fn new(num_features: usize, num_classes: usize, tree: TrainedNode) -> Self {
        Self {
            num_features,
            num_classes,
            class_names: None,
            feature_names: None,
            tree,
        }
    }

    /// Parse a nested trained-tree document.
    ///
    /// Nesting is bounded by the deepest tree any configuration accepts,
    /// checked before parsing; the configured depth limit itself is applied
    /// by the builder.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let nesting = json_nesting(json);
        if nesting > MAX_DOCUMENT_NESTING {
            return Err(TreeError::InvalidModel(format!(
                "trained tree nests {nesting} levels, deeper than the limit of {HARD_MAX_DEPTH} splits allows"
            )));
        }

        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let trained = Self::deserialize(&mut deserializer)
            .and_then(|trained| deserializer.end().map(|()| trained))
            .map_err(|e| TreeError::InvalidModel(e.to_string()))?;
        Ok(trained)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Deepest object/array nesting of a JSON text; brackets inside strings
/// do not count.
fn json_nesting(json: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Flat arrays of a fitted scikit-learn decision tree.
///
/// `value[i]` holds the per-class weights of node `i` (the single-output
/// slice of `tree_.value`). Leaves are nodes whose `children_left` is
/// [`TREE_LEAF`]; their class is the first index of the largest weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SklearnTree {
    pub num_features: usize,
    /// Defaults to the width of `value`
    #[serde(default)]
    pub num_classes: Option<usize>,
    #[serde(default)]
    pub class_names: Option<Vec<String>>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl SklearnTree {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TreeError::InvalidModel(e.to_string()))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rebuild the nested tree rooted at node 0.
    ///
    /// Thresholds are narrowed to `f32`, the precision the device compares
    /// in. Depth is checked against `limits` while walking, so malformed
    /// arrays cannot recurse without bound.
    pub fn into_trained(self, limits: &ValidationLimits) -> Result<TrainedModel> {
        let n = self.children_left.len();
        if n == 0 {
            return Err(TreeError::InvalidModel("scikit-learn tree has no nodes".into()));
        }
        for (name, len) in [
            ("children_right", self.children_right.len()),
            ("feature", self.feature.len()),
            ("threshold", self.threshold.len()),
            ("value", self.value.len()),
        ] {
            if len != n {
                return Err(TreeError::InvalidModel(format!(
                    "{name} has {len} entries, children_left has {n}"
                )));
            }
        }

        let num_classes = match self.num_classes {
            Some(count) => count,
            None => self.value[0].len(),
        };

        let mut visited = vec![false; n];
        let tree = self.convert(0, 0, &mut visited, limits)?;

        if let Some(orphan) = visited.iter().position(|seen| !seen) {
            return Err(TreeError::InvalidModel(format!(
                "scikit-learn node {orphan} is not reachable from the root"
            )));
        }

        Ok(TrainedModel {
            num_features: self.num_features,
            num_classes,
            class_names: self.class_names,
            feature_names: self.feature_names,
            tree,
        })
    }

    fn convert(
        &self,
        idx: usize,
        depth: usize,
        visited: &mut [bool],
        limits: &ValidationLimits,
    ) -> Result<TrainedNode> {
        if depth > limits.max_depth {
            return Err(TreeError::InvalidModel(format!(
                "scikit-learn node {idx} sits at depth {depth}, limit is {}",
                limits.max_depth
            )));
        }
        if visited[idx] {
            return Err(TreeError::InvalidModel(format!(
                "scikit-learn node {idx} is reached more than once"
            )));
        }
        visited[idx] = true;

        let left = self.children_left[idx];
        let right = self.children_right[idx];

        if left == TREE_LEAF {
            let class = argmax(&self.value[idx]).ok_or_else(|| {
                TreeError::InvalidModel(format!("scikit-learn leaf {idx} has no class weights"))
            })?;
            return Ok(TrainedNode::leaf(class));
        }

        let feature = usize::try_from(self.feature[idx]).map_err(|_| {
            TreeError::InvalidModel(format!(
                "scikit-learn split {idx} has feature {}",
                self.feature[idx]
            ))
        })?;
        let left = self.child_index(idx, "left", left)?;
        let right = self.child_index(idx, "right", right)?;

        Ok(TrainedNode::split(
            feature,
            self.threshold[idx] as f32,
            self.convert(left, depth + 1, visited, limits)?,
            self.convert(right, depth + 1, visited, limits)?,
        ))
    }

    fn child_index(&self, idx: usize, side: &str, child: i64) -> Result<usize> {
        usize::try_from(child)
            .ok()
            .filter(|&c| c < self.children_left.len())
            .ok_or_else(|| {
                TreeError::InvalidModel(format!(
                    "scikit-learn split {idx} has {side} child {child} out of range"
                ))
            })
    }
}

/// Index of the largest weight; the first one wins ties. NaN weights never win.
fn argmax(weights: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &w) in weights.iter().enumerate() {
        if w.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, current)| w > current) {
            best = Some((i, w));
        }
    }
    best.map(|(i, _)| i)
}
