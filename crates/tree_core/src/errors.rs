//! Error types for the activity tree core

use thiserror::Error;

/// Errors that can occur while building, decoding or evaluating a model
#[derive(Error, Debug)]
pub enum TreeError {
    /// Feature vector length does not match the model descriptor
    #[error("Feature vector has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A visited feature value is NaN or infinite
    #[error("Feature {feature_index} has non-finite value {value}")]
    InvalidFeatureValue { feature_index: usize, value: f32 },

    /// A child, feature or class index escaped its bounds during evaluation
    #[error("Index out of range at node {node}: {what} {index} (limit {limit})")]
    IndexOutOfRange {
        node: u32,
        what: &'static str,
        index: usize,
        limit: usize,
    },

    /// Traversal hop cap tripped
    #[error("Traversal exceeded the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// Encoded model failed integrity or structural checks
    #[error("Corrupt model: {0}")]
    CorruptModel(String),

    /// Trained structure rejected by the builder
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Configuration could not be parsed or is out of bounds
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error from the storage collaborator
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error outside of model decoding
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeError {
    /// Whether the error was raised for a single classification call rather
    /// than while constructing a model.
    pub fn is_per_inference(&self) -> bool {
        matches!(
            self,
            TreeError::ShapeMismatch { .. }
                | TreeError::InvalidFeatureValue { .. }
                | TreeError::IndexOutOfRange { .. }
                | TreeError::DepthExceeded { .. }
        )
    }
}

/// Result type for activity tree operations
pub type Result<T> = std::result::Result<T, TreeError>;
