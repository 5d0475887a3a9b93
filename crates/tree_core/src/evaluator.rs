//! Tree traversal
//!
//! `classify` is a pure function of the descriptor, the node table and the
//! feature vector. It does not allocate, lock or log, and it reads shared
//! state only, so it can run concurrently from any number of contexts.
//!
//! Comparison is `value <= threshold` → left, otherwise right. Values equal
//! to the threshold always go left; trained thresholds assume this.
//!
//! The table is trusted to be validated, yet every index is still checked and
//! the walk is capped at `table.max_depth()` hops, so a table damaged after
//! loading fails with `IndexOutOfRange` or `DepthExceeded` instead of
//! panicking or looping.

use crate::descriptor::ModelDescriptor;
use crate::errors::{Result, TreeError};
use crate::tree::{Node, NodeTable};
use serde::Serialize;

/// One split decision taken during traversal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionStep {
    pub node: u32,
    pub feature_index: usize,
    pub value: f32,
    pub threshold: f32,
    pub went_left: bool,
}

/// Result of a traced classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub class_index: usize,
    /// Leaf that produced the class
    pub leaf: u32,
    pub path: Vec<DecisionStep>,
}

enum Step {
    Leaf(usize),
    Branch { next: u32, decision: DecisionStep },
}

/// Classify a feature vector, returning a class index in `[0, num_classes)`.
///
/// # Errors
/// - `ShapeMismatch` when `features.len() != num_features`
/// - `InvalidFeatureValue` when a compared feature is NaN or infinite
/// - `IndexOutOfRange` / `DepthExceeded` only for a damaged table
///
/// # Example
/// ```
/// use activity_tree_core::{Model, ModelDescriptor, Node, ValidationLimits};
///
/// let model = Model::from_parts(
///     ModelDescriptor::new(1, 2),
///     vec![Node::split(0, 50.0, 1, 2), Node::leaf(0), Node::leaf(1)],
///     0,
///     &ValidationLimits::default(),
/// )
/// .unwrap();
///
/// assert_eq!(model.classify(&[30.0]).unwrap(), 0);
/// assert_eq!(model.classify(&[50.0]).unwrap(), 0); // ties go left
/// assert_eq!(model.classify(&[60.0]).unwrap(), 1);
/// ```
pub fn classify(descriptor: &ModelDescriptor, table: &NodeTable, features: &[f32]) -> Result<usize> {
    check_shape(descriptor, features)?;

    let limit = table.max_depth();
    let mut idx = checked_root(table)?;

    // limit hops means at most limit + 1 node visits
    for _ in 0..=limit {
        match step(descriptor, table, idx, features)? {
            Step::Leaf(class_index) => return Ok(class_index),
            Step::Branch { next, .. } => idx = next,
        }
    }

    Err(TreeError::DepthExceeded { limit })
}

/// Classify and record every split decision on the way to the leaf
pub fn trace(descriptor: &ModelDescriptor, table: &NodeTable, features: &[f32]) -> Result<Trace> {
    check_shape(descriptor, features)?;

    let limit = table.max_depth();
    let mut idx = checked_root(table)?;
    let mut path = Vec::with_capacity(table.depth());

    for _ in 0..=limit {
        match step(descriptor, table, idx, features)? {
            Step::Leaf(class_index) => {
                return Ok(Trace {
                    class_index,
                    leaf: idx,
                    path,
                })
            }
            Step::Branch { next, decision } => {
                path.push(decision);
                idx = next;
            }
        }
    }

    Err(TreeError::DepthExceeded { limit })
}

fn check_shape(descriptor: &ModelDescriptor, features: &[f32]) -> Result<()> {
    if features.len() != descriptor.num_features {
        return Err(TreeError::ShapeMismatch {
            expected: descriptor.num_features,
            actual: features.len(),
        });
    }
    Ok(())
}

fn checked_root(table: &NodeTable) -> Result<u32> {
    let root = table.root_index();
    if root as usize >= table.len() {
        return Err(TreeError::IndexOutOfRange {
            node: root,
            what: "root",
            index: root as usize,
            limit: table.len(),
        });
    }
    Ok(root)
}

#[inline]
fn step(descriptor: &ModelDescriptor, table: &NodeTable, idx: u32, features: &[f32]) -> Result<Step> {
    let node = table.node(idx).ok_or(TreeError::IndexOutOfRange {
        node: idx,
        what: "node",
        index: idx as usize,
        limit: table.len(),
    })?;

    match *node {
        Node::Leaf { class_index } => {
            let class_index = class_index as usize;
            if class_index >= descriptor.num_classes {
                return Err(TreeError::IndexOutOfRange {
                    node: idx,
                    what: "class",
                    index: class_index,
                    limit: descriptor.num_classes,
                });
            }
            Ok(Step::Leaf(class_index))
        }
        Node::Split {
            feature_index,
            threshold,
            left,
            right,
        } => {
            let feature_index = feature_index as usize;
            let value = *features.get(feature_index).ok_or(TreeError::IndexOutOfRange {
                node: idx,
                what: "feature",
                index: feature_index,
                limit: features.len(),
            })?;

            if !value.is_finite() {
                return Err(TreeError::InvalidFeatureValue {
                    feature_index,
                    value,
                });
            }

            let went_left = value <= threshold;
            let next = if went_left { left } else { right };
            if next as usize >= table.len() {
                return Err(TreeError::IndexOutOfRange {
                    node: idx,
                    what: if went_left { "left child" } else { "right child" },
                    index: next as usize,
                    limit: table.len(),
                });
            }

            Ok(Step::Branch {
                next,
                decision: DecisionStep {
                    node: idx,
                    feature_index,
                    value,
                    threshold,
                    went_left,
                },
            })
        }
    }
}
