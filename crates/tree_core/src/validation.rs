//! Structural validation for node tables
//!
//! One routine guards every path that can produce a [`Model`](crate::Model):
//! the builder reports violations as `InvalidModel`, the codecs report the
//! same violations as `CorruptModel`.

use crate::descriptor::ModelDescriptor;
use crate::tree::Node;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound accepted for `max_depth` in any configuration
pub const HARD_MAX_DEPTH: usize = 255;

/// Default bound on split hops from root to leaf
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default bound on the number of nodes in a table
pub const DEFAULT_MAX_NODES: usize = 65_535;

/// Longest name accepted in a descriptor (bytes, UTF-8)
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Size limits applied to every node table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum number of split hops on any root-to-leaf path
    pub max_depth: usize,
    /// Maximum number of nodes in the table
    pub max_nodes: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl ValidationLimits {
    pub fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth,
            max_nodes,
        }
    }
}

/// Structural problems found in a descriptor or node table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("num_features must be in 1..={max}, got {actual}")]
    FeatureCount { actual: usize, max: usize },

    #[error("num_classes must be in 1..={max}, got {actual}")]
    ClassCount { actual: usize, max: usize },

    #[error("{what} has {actual} entries, expected {expected}")]
    NameCount {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} entry {index} is {len} bytes long (max {max})")]
    NameTooLong {
        what: &'static str,
        index: usize,
        len: usize,
        max: usize,
    },

    #[error("table has no nodes")]
    EmptyTable,

    #[error("table has {actual} nodes, limit is {limit}")]
    TooManyNodes { actual: usize, limit: usize },

    #[error("root index {root} out of range for {len} nodes")]
    RootOutOfRange { root: u32, len: usize },

    #[error("node {node} has {side} child {child} out of range for {len} nodes")]
    ChildOutOfRange {
        node: u32,
        side: &'static str,
        child: u32,
        len: usize,
    },

    #[error("node {node} splits on feature {feature}, model has {num_features}")]
    FeatureOutOfRange {
        node: u32,
        feature: u16,
        num_features: usize,
    },

    #[error("node {node} has non-finite threshold {threshold}")]
    NonFiniteThreshold { node: u32, threshold: f32 },

    #[error("leaf {node} has class {class}, model has {num_classes}")]
    ClassOutOfRange {
        node: u32,
        class: u16,
        num_classes: usize,
    },

    #[error("node {node} is reached more than once (cycle or shared subtree)")]
    Revisited { node: u32 },

    #[error("node {node} is not reachable from the root")]
    Unreachable { node: u32 },

    #[error("node {node} sits at depth {depth}, limit is {limit}")]
    TooDeep { node: u32, depth: usize, limit: usize },
}

/// Facts measured while validating a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableReport {
    /// Longest root-to-leaf path in split hops
    pub depth: usize,
    /// Number of leaf nodes
    pub leaf_count: usize,
}

/// Validate descriptor counts and optional names
pub fn validate_descriptor(descriptor: &ModelDescriptor) -> Result<(), Violation> {
    let max = u16::MAX as usize;
    if descriptor.num_features == 0 || descriptor.num_features > max {
        return Err(Violation::FeatureCount {
            actual: descriptor.num_features,
            max,
        });
    }
    if descriptor.num_classes == 0 || descriptor.num_classes > max {
        return Err(Violation::ClassCount {
            actual: descriptor.num_classes,
            max,
        });
    }

    if let Some(names) = &descriptor.class_names {
        check_names("class_names", names, descriptor.num_classes)?;
    }
    if let Some(names) = &descriptor.feature_names {
        check_names("feature_names", names, descriptor.num_features)?;
    }

    Ok(())
}

fn check_names(what: &'static str, names: &[String], expected: usize) -> Result<(), Violation> {
    if names.len() != expected {
        return Err(Violation::NameCount {
            what,
            expected,
            actual: names.len(),
        });
    }
    for (index, name) in names.iter().enumerate() {
        if name.len() > MAX_NAME_LEN {
            return Err(Violation::NameTooLong {
                what,
                index,
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
    }
    Ok(())
}

/// Validate a node table against its descriptor and limits.
///
/// Checks, in order: non-empty, node count, root bounds, per-node index and
/// threshold bounds, then an iterative walk from the root that rejects
/// revisits (cycles and shared subtrees), paths deeper than
/// `limits.max_depth`, and finally nodes the walk never reached.
pub fn validate_table(
    nodes: &[Node],
    root: u32,
    descriptor: &ModelDescriptor,
    limits: &ValidationLimits,
) -> Result<TableReport, Violation> {
    let len = nodes.len();
    if len == 0 {
        return Err(Violation::EmptyTable);
    }
    if len > limits.max_nodes {
        return Err(Violation::TooManyNodes {
            actual: len,
            limit: limits.max_nodes,
        });
    }
    if root as usize >= len {
        return Err(Violation::RootOutOfRange { root, len });
    }

    for (i, node) in nodes.iter().enumerate() {
        let id = i as u32;
        match *node {
            Node::Split {
                feature_index,
                threshold,
                left,
                right,
            } => {
                if feature_index as usize >= descriptor.num_features {
                    return Err(Violation::FeatureOutOfRange {
                        node: id,
                        feature: feature_index,
                        num_features: descriptor.num_features,
                    });
                }
                if !threshold.is_finite() {
                    return Err(Violation::NonFiniteThreshold {
                        node: id,
                        threshold,
                    });
                }
                if left as usize >= len {
                    return Err(Violation::ChildOutOfRange {
                        node: id,
                        side: "left",
                        child: left,
                        len,
                    });
                }
                if right as usize >= len {
                    return Err(Violation::ChildOutOfRange {
                        node: id,
                        side: "right",
                        child: right,
                        len,
                    });
                }
            }
            Node::Leaf { class_index } => {
                if class_index as usize >= descriptor.num_classes {
                    return Err(Violation::ClassOutOfRange {
                        node: id,
                        class: class_index,
                        num_classes: descriptor.num_classes,
                    });
                }
            }
        }
    }

    // Every node is pushed at most twice before the revisit check trips,
    // so the walk terminates on any input.
    let mut visited = vec![false; len];
    let mut stack: Vec<(u32, usize)> = vec![(root, 0)];
    let mut depth = 0usize;
    let mut leaf_count = 0usize;

    while let Some((id, node_depth)) = stack.pop() {
        let idx = id as usize;
        if visited[idx] {
            return Err(Violation::Revisited { node: id });
        }
        visited[idx] = true;

        if node_depth > limits.max_depth {
            return Err(Violation::TooDeep {
                node: id,
                depth: node_depth,
                limit: limits.max_depth,
            });
        }
        depth = depth.max(node_depth);

        match nodes[idx] {
            Node::Split { left, right, .. } => {
                stack.push((right, node_depth + 1));
                stack.push((left, node_depth + 1));
            }
            Node::Leaf { .. } => leaf_count += 1,
        }
    }

    if let Some(orphan) = visited.iter().position(|seen| !seen) {
        return Err(Violation::Unreachable {
            node: orphan as u32,
        });
    }

    Ok(TableReport { depth, leaf_count })
}
