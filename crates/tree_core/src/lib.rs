//! Data-driven decision-tree activity classifier
//!
//! A trained decision tree is deployed as data: a flat node table plus a
//! descriptor, validated once at construction and then evaluated by a small,
//! bounded, allocation-free traversal.
//!
//! Modules:
//! - `tree`: node variants and the validated node table
//! - `descriptor`: feature/class counts and optional diagnostic names
//! - `validation`: structural checks shared by every construction path
//! - `evaluator`: classification and decision-path tracing
//! - `codec`: versioned binary format and canonical JSON
//! - `trained`: trained-tree input adapters (nested JSON, scikit-learn arrays)
//! - `builder`: deterministic flattening of trained trees
//! - `storage`: model sources and loading
//! - `handle`: hot-swappable model reference
//! - `config`: engine limits and codec settings
//! - `reference`: the shipped 30-feature / 6-class activity model

pub mod builder;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod evaluator;
pub mod handle;
pub mod model;
pub mod reference;
pub mod storage;
pub mod trained;
pub mod tree;
pub mod validation;

pub use builder::ModelBuilder;
pub use codec::{CodecConfig, Encoding, FORMAT_VERSION};
pub use config::EngineConfig;
pub use descriptor::ModelDescriptor;
pub use errors::{Result, TreeError};
pub use evaluator::{DecisionStep, Trace};
pub use handle::ModelHandle;
pub use model::Model;
pub use reference::reference_model;
pub use storage::{load_model, load_model_from_path, FileSource, MemorySource, ModelSource};
pub use trained::{SklearnTree, TrainedModel, TrainedNode};
pub use tree::{Node, NodeKind, NodeTable};
pub use validation::{ValidationLimits, Violation};
