//! Model sources and loading
//!
//! The engine never touches storage directly; a [`ModelSource`] hands over the
//! encoded bytes and the codec takes it from there.

use crate::codec::{binary, text, Encoding};
use crate::errors::{Result, TreeError};
use crate::model::Model;
use crate::validation::ValidationLimits;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where encoded model bytes come from
pub trait ModelSource: Send + Sync {
    /// Read the complete encoded model
    fn read_model_bytes(&self) -> Result<Vec<u8>>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}

/// Model stored in a file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelSource for FileSource {
    fn read_model_bytes(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Model already held in memory (flash image, embedded blob, tests)
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new<S: Into<String>>(label: S, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes,
        }
    }
}

impl ModelSource for MemorySource {
    fn read_model_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }
}

/// Decode bytes in either encoding, picked by the leading magic
pub fn decode_any(bytes: &[u8], limits: &ValidationLimits) -> Result<Model> {
    match Encoding::sniff(bytes) {
        Encoding::Binary => binary::decode(bytes, limits),
        Encoding::Json => {
            let json = std::str::from_utf8(bytes)
                .map_err(|e| TreeError::CorruptModel(format!("model is not UTF-8 JSON: {e}")))?;
            text::decode(json, limits)
        }
    }
}

/// Read and decode a model from a source
pub fn load_model(source: &dyn ModelSource, limits: &ValidationLimits) -> Result<Model> {
    let bytes = source.read_model_bytes()?;
    let model = decode_any(&bytes, limits)?;
    info!(
        source = %source.describe(),
        nodes = model.table().len(),
        depth = model.table().depth(),
        hash = %model.hash_hex(),
        "Loaded model"
    );
    Ok(model)
}

/// Load a binary or JSON model file
pub fn load_model_from_path<P: AsRef<Path>>(path: P, limits: &ValidationLimits) -> Result<Model> {
    load_model(&FileSource::new(path.as_ref()), limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ModelDescriptor;
    use crate::tree::Node;
    use tempfile::tempdir;

    fn stump() -> Model {
        Model::from_parts(
            ModelDescriptor::new(1, 2),
            vec![Node::split(0, 0.5, 1, 2), Node::leaf(0), Node::leaf(1)],
            0,
            &ValidationLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_memory_source_both_encodings() {
        let model = stump();
        let limits = ValidationLimits::default();

        let binary = MemorySource::new("bin", model.to_bytes());
        assert_eq!(load_model(&binary, &limits).unwrap(), model);

        let json = MemorySource::new("json", model.to_canonical_json().unwrap().into_bytes());
        assert_eq!(load_model(&json, &limits).unwrap(), model);
        assert_eq!(json.describe(), "memory:json");
    }

    #[test]
    fn test_file_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        stump().save_binary(&path).unwrap();

        let loaded = load_model_from_path(&path, &ValidationLimits::default()).unwrap();
        assert_eq!(loaded, stump());
    }

    #[test]
    fn test_missing_file_is_io() {
        let dir = tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.bin"));
        assert!(matches!(
            load_model(&source, &ValidationLimits::default()),
            Err(TreeError::Io(_))
        ));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let source = MemorySource::new("garbage", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            load_model(&source, &ValidationLimits::default()),
            Err(TreeError::CorruptModel(_))
        ));
    }
}
