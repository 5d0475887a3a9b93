//! Node definitions for the decision tree table
//!
//! A node is either a split comparing one feature against a threshold, or a
//! leaf carrying the output class. Child references are indices into the
//! owning [`NodeTable`](super::NodeTable).

use serde::{Deserialize, Serialize};

/// A decision tree node (split or leaf)
///
/// Splits route `features[feature_index] <= threshold` to `left`, everything
/// strictly greater to `right`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Internal decision point
    Split {
        /// Index into the feature vector
        feature_index: u16,
        /// Split threshold (single precision)
        threshold: f32,
        /// Node index taken when the feature is `<= threshold`
        left: u32,
        /// Node index taken when the feature is `> threshold`
        right: u32,
    },
    /// Terminal node
    Leaf {
        /// Output class index
        class_index: u16,
    },
}

/// Discriminator stored in the binary record
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf = 0,
    Split = 1,
}

impl NodeKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeKind::Leaf),
            1 => Some(NodeKind::Split),
            _ => None,
        }
    }
}

impl Node {
    /// Create a new split node
    pub fn split(feature_index: u16, threshold: f32, left: u32, right: u32) -> Self {
        Node::Split {
            feature_index,
            threshold,
            left,
            right,
        }
    }

    /// Create a new leaf node
    pub fn leaf(class_index: u16) -> Self {
        Node::Leaf { class_index }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Split { .. } => NodeKind::Split,
            Node::Leaf { .. } => NodeKind::Leaf,
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Class index if this is a leaf
    pub fn class_index(&self) -> Option<u16> {
        match self {
            Node::Leaf { class_index } => Some(*class_index),
            Node::Split { .. } => None,
        }
    }

    /// Child indices `(left, right)` if this is a split
    pub fn children(&self) -> Option<(u32, u32)> {
        match self {
            Node::Split { left, right, .. } => Some((*left, *right)),
            Node::Leaf { .. } => None,
        }
    }
}
