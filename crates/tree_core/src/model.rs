//! Validated model: descriptor plus node table
//!
//! A [`Model`] is only ever produced by validated construction (the builder,
//! the codecs, or [`Model::from_parts`]). Once built it is read-only and can be
//! shared freely between threads.

use crate::codec::{self, CodecConfig};
use crate::descriptor::ModelDescriptor;
use crate::errors::{Result, TreeError};
use crate::evaluator::{self, Trace};
use crate::tree::{Node, NodeTable};
use crate::validation::{validate_descriptor, ValidationLimits, Violation};
use std::fs;
use std::path::Path;
use tracing::info;

/// Immutable decision-tree classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    descriptor: ModelDescriptor,
    table: NodeTable,
}

impl Model {
    /// Validate the parts and assemble a model, reporting raw violations so
    /// each caller can map them to its own error kind.
    pub(crate) fn assemble(
        descriptor: ModelDescriptor,
        nodes: Vec<Node>,
        root: u32,
        limits: &ValidationLimits,
    ) -> std::result::Result<Self, Violation> {
        validate_descriptor(&descriptor)?;
        let table = NodeTable::validated(nodes, root, &descriptor, limits)?;
        Ok(Self { descriptor, table })
    }

    /// Build a model from a hand-written node table
    pub fn from_parts(
        descriptor: ModelDescriptor,
        nodes: Vec<Node>,
        root: u32,
        limits: &ValidationLimits,
    ) -> Result<Self> {
        Self::assemble(descriptor, nodes, root, limits)
            .map_err(|v| TreeError::InvalidModel(v.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn from_unchecked(descriptor: ModelDescriptor, table: NodeTable) -> Self {
        Self { descriptor, table }
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn table(&self) -> &NodeTable {
        &self.table
    }

    pub fn num_features(&self) -> usize {
        self.descriptor.num_features
    }

    pub fn num_classes(&self) -> usize {
        self.descriptor.num_classes
    }

    /// Label for a class index, if the model carries class names
    pub fn class_name(&self, class_index: usize) -> Option<&str> {
        self.descriptor.class_name(class_index)
    }

    /// Classify one feature vector. See [`evaluator::classify`].
    pub fn classify(&self, features: &[f32]) -> Result<usize> {
        evaluator::classify(&self.descriptor, &self.table, features)
    }

    /// Classify and record the decision path. See [`evaluator::trace`].
    pub fn trace(&self, features: &[f32]) -> Result<Trace> {
        evaluator::trace(&self.descriptor, &self.table, features)
    }

    /// Same model with the diagnostic names dropped
    pub fn without_names(&self) -> Self {
        Self {
            descriptor: self.descriptor.without_names(),
            table: self.table.clone(),
        }
    }

    /// Encode with default codec settings (names included)
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::binary::encode(self, &CodecConfig::default())
    }

    /// Decode and validate a binary model
    pub fn from_bytes(bytes: &[u8], limits: &ValidationLimits) -> Result<Self> {
        codec::binary::decode(bytes, limits)
    }

    /// Serialize to canonical JSON (sorted keys, stable formatting)
    pub fn to_canonical_json(&self) -> Result<String> {
        codec::text::encode(self)
    }

    /// Decode and validate a canonical JSON model
    pub fn from_json_str(json: &str, limits: &ValidationLimits) -> Result<Self> {
        codec::text::decode(json, limits)
    }

    /// BLAKE3 hash of the default binary encoding
    pub fn hash(&self) -> [u8; 32] {
        *blake3::hash(&self.to_bytes()).as_bytes()
    }

    /// Model hash as hex string
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    /// Save the binary encoding to a file
    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes();
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved binary model");
        Ok(())
    }

    /// Load a binary model file
    pub fn load_binary<P: AsRef<Path>>(path: P, limits: &ValidationLimits) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, limits)
    }

    /// Save model to JSON file with canonical serialization
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_canonical_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load model from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P, limits: &ValidationLimits) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json, limits)
    }
}
