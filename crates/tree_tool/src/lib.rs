//! Offline tooling for activity tree models
//!
//! Builds trained trees into deployable artifacts, inspects and exports them,
//! runs one-off classifications and verifies pinned deployments.

pub mod commands;
pub mod deploy;

pub use commands::{
    build, classify, export_json, inspect, parse_features, BuildReport, Classification,
    InputFormat, Inspection,
};
pub use deploy::{verify, Verification, DEFAULT_DEPLOY_CONFIG};
