//! Offline model builder
//!
//! Flattens a trained tree into a validated node table. Node indices are
//! assigned in pre-order (root = 0, left subtree before right subtree), so the
//! same trained input always produces the same table and byte-identical
//! encodings.

use crate::config::EngineConfig;
use crate::descriptor::ModelDescriptor;
use crate::errors::{Result, TreeError};
use crate::model::Model;
use crate::trained::{SklearnTree, TrainedModel, TrainedNode};
use crate::tree::Node;
use crate::validation::ValidationLimits;
use tracing::{info, warn};

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Builds validated models from trained trees
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    limits: ValidationLimits,
}

impl ModelBuilder {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.limits)
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// Flatten and validate a trained tree.
    ///
    /// Rejects, never clamps: depth over the limit, indices that do not fit
    /// the model, non-finite thresholds and name-count mismatches all fail with
    /// `InvalidModel`.
    pub fn build(&self, trained: &TrainedModel) -> Result<Model> {
        let descriptor = ModelDescriptor {
            num_features: trained.num_features,
            num_classes: trained.num_classes,
            class_names: trained.class_names.clone(),
            feature_names: trained.feature_names.clone(),
        };

        let nodes = self.flatten(&trained.tree)?;

        let model = Model::assemble(descriptor, nodes, 0, &self.limits).map_err(|violation| {
            warn!(%violation, "Trained tree rejected");
            TreeError::InvalidModel(violation.to_string())
        })?;

        info!(
            nodes = model.table().len(),
            leaves = model.table().leaf_count(),
            depth = model.table().depth(),
            "Built model"
        );
        Ok(model)
    }

    /// Convert scikit-learn arrays and build
    pub fn build_sklearn(&self, tree: SklearnTree) -> Result<Model> {
        let trained = tree.into_trained(&self.limits)?;
        self.build(&trained)
    }

    /// Pre-order flattening with an explicit stack; the depth and node limits
    /// are enforced as nodes are emitted so oversized input stops early.
    fn flatten(&self, root: &TrainedNode) -> Result<Vec<Node>> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<(&TrainedNode, Option<(usize, Side)>, usize)> = vec![(root, None, 0)];

        while let Some((trained, parent, depth)) = stack.pop() {
            if depth > self.limits.max_depth {
                return Err(TreeError::InvalidModel(format!(
                    "trained tree is deeper than the limit of {}",
                    self.limits.max_depth
                )));
            }
            if nodes.len() >= self.limits.max_nodes {
                return Err(TreeError::InvalidModel(format!(
                    "trained tree has more than {} nodes",
                    self.limits.max_nodes
                )));
            }

            let idx = nodes.len();
            if let Some((parent_idx, side)) = parent {
                if let Node::Split { left, right, .. } = &mut nodes[parent_idx] {
                    match side {
                        Side::Left => *left = idx as u32,
                        Side::Right => *right = idx as u32,
                    }
                }
            }

            match trained {
                TrainedNode::Leaf { class } => {
                    nodes.push(Node::Leaf {
                        class_index: narrow(*class, "leaf class")?,
                    });
                }
                TrainedNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    nodes.push(Node::Split {
                        feature_index: narrow(*feature, "split feature")?,
                        threshold: *threshold,
                        left: 0,
                        right: 0,
                    });
                    stack.push((right, Some((idx, Side::Right)), depth + 1));
                    stack.push((left, Some((idx, Side::Left)), depth + 1));
                }
            }
        }

        Ok(nodes)
    }
}

fn narrow(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| TreeError::InvalidModel(format!("{what} {value} does not fit in 16 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{binary, CodecConfig};

    fn sample_tree() -> TrainedNode {
        TrainedNode::split(
            0,
            5.0,
            TrainedNode::split(1, 3.0, TrainedNode::leaf(0), TrainedNode::leaf(1)),
            TrainedNode::leaf(2),
        )
    }

    #[test]
    fn test_preorder_indices() {
        let model = ModelBuilder::default()
            .build(&TrainedModel::new(2, 3, sample_tree()))
            .unwrap();

        assert_eq!(
            model.table().nodes(),
            &[
                Node::split(0, 5.0, 1, 4),
                Node::split(1, 3.0, 2, 3),
                Node::leaf(0),
                Node::leaf(1),
                Node::leaf(2),
            ]
        );
        assert_eq!(model.table().root_index(), 0);
        assert_eq!(model.table().depth(), 2);
    }

    #[test]
    fn test_build_is_deterministic() {
        let trained = TrainedModel::new(2, 3, sample_tree());
        let builder = ModelBuilder::default();
        let a = binary::encode(&builder.build(&trained).unwrap(), &CodecConfig::default());
        let b = binary::encode(&builder.build(&trained).unwrap(), &CodecConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_out_of_range_class() {
        let trained = TrainedModel::new(
            2,
            3,
            TrainedNode::split(0, 1.0, TrainedNode::leaf(0), TrainedNode::leaf(3)),
        );
        match ModelBuilder::default().build(&trained) {
            Err(TreeError::InvalidModel(reason)) => assert!(reason.contains("class 3")),
            other => panic!("expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_too_deep() {
        let mut tree = TrainedNode::leaf(0);
        for _ in 0..5 {
            tree = TrainedNode::split(0, 1.0, tree, TrainedNode::leaf(1));
        }
        let trained = TrainedModel::new(1, 2, tree);

        assert!(ModelBuilder::new(ValidationLimits::new(5, 100))
            .build(&trained)
            .is_ok());
        assert!(matches!(
            ModelBuilder::new(ValidationLimits::new(4, 100)).build(&trained),
            Err(TreeError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_threshold_and_wide_index() {
        let nan = TrainedModel::new(
            1,
            2,
            TrainedNode::split(0, f32::NAN, TrainedNode::leaf(0), TrainedNode::leaf(1)),
        );
        assert!(matches!(
            ModelBuilder::default().build(&nan),
            Err(TreeError::InvalidModel(_))
        ));

        let wide = TrainedModel::new(1, 2, TrainedNode::leaf(70_000));
        assert!(matches!(
            ModelBuilder::default().build(&wide),
            Err(TreeError::InvalidModel(reason)) if reason.contains("16 bits")
        ));
    }

    #[test]
    fn test_rejects_name_count_mismatch() {
        let mut trained = TrainedModel::new(2, 3, sample_tree());
        trained.class_names = Some(vec!["a".into(), "b".into()]);
        assert!(matches!(
            ModelBuilder::default().build(&trained),
            Err(TreeError::InvalidModel(reason)) if reason.contains("class_names")
        ));
    }

    #[test]
    fn test_node_limit() {
        let trained = TrainedModel::new(2, 3, sample_tree());
        assert!(matches!(
            ModelBuilder::new(ValidationLimits::new(8, 4)).build(&trained),
            Err(TreeError::InvalidModel(_))
        ));
    }
}
