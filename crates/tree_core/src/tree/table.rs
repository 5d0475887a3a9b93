//! Immutable, validated node table

use super::node::Node;
use crate::descriptor::ModelDescriptor;
use crate::validation::{validate_table, TableReport, ValidationLimits, Violation};

/// Ordered nodes of one binary decision tree plus its root index.
///
/// Only obtainable through validation, so every instance satisfies: non-empty,
/// valid root and child indices, a proper tree shape, and a depth within the
/// limit it was validated against. There is no mutation API.
#[derive(Debug, Clone)]
pub struct NodeTable {
    nodes: Vec<Node>,
    root: u32,
    depth: usize,
    leaf_count: usize,
    max_depth: usize,
}

impl NodeTable {
    /// Validate `nodes` and wrap them in a table
    pub fn validated(
        nodes: Vec<Node>,
        root: u32,
        descriptor: &ModelDescriptor,
        limits: &ValidationLimits,
    ) -> Result<Self, Violation> {
        let TableReport { depth, leaf_count } = validate_table(&nodes, root, descriptor, limits)?;
        Ok(Self {
            nodes,
            root,
            depth,
            leaf_count,
            max_depth: limits.max_depth,
        })
    }

    /// Wrap nodes without validation, for exercising the evaluator's
    /// defensive checks against tables that were damaged after loading.
    #[cfg(test)]
    pub(crate) fn unchecked(nodes: Vec<Node>, root: u32, max_depth: usize) -> Self {
        Self {
            nodes,
            root,
            depth: 0,
            leaf_count: 0,
            max_depth,
        }
    }

    pub fn root_index(&self) -> u32 {
        self.root
    }

    pub fn node(&self, index: u32) -> Option<&Node> {
        self.nodes.get(index as usize)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a validated table
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Longest root-to-leaf path in split hops
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Depth bound the table was validated against; the evaluator's hop cap
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

// Equality covers the fields that affect classification.
impl PartialEq for NodeTable {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.nodes == other.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_table() {
        let table = NodeTable::validated(
            vec![Node::split(0, 0.5, 1, 2), Node::leaf(0), Node::leaf(1)],
            0,
            &ModelDescriptor::new(1, 2),
            &ValidationLimits::default(),
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
        assert_eq!(table.root_index(), 0);
        assert_eq!(table.depth(), 1);
        assert_eq!(table.leaf_count(), 2);
        assert_eq!(table.max_depth(), ValidationLimits::default().max_depth);
        assert_eq!(table.node(1), Some(&Node::leaf(0)));
        assert_eq!(table.node(3), None);
    }

    #[test]
    fn test_equality_ignores_limits() {
        let nodes = vec![Node::split(0, 0.5, 1, 2), Node::leaf(0), Node::leaf(1)];
        let descriptor = ModelDescriptor::new(1, 2);
        let a = NodeTable::validated(nodes.clone(), 0, &descriptor, &ValidationLimits::new(4, 16))
            .unwrap();
        let b = NodeTable::validated(nodes, 0, &descriptor, &ValidationLimits::default()).unwrap();
        assert_eq!(a, b);
    }
}
