//! Hot-swappable model handle
//!
//! Readers take a snapshot (`Arc<Model>`) and classify against it without
//! holding the lock. A reload decodes and validates the replacement first and
//! only then swaps it in, so a failed reload leaves the active model in place.

use crate::errors::Result;
use crate::model::Model;
use crate::storage::{decode_any, load_model, ModelSource};
use crate::validation::ValidationLimits;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared, replaceable reference to the active model
#[derive(Debug)]
pub struct ModelHandle {
    current: RwLock<Arc<Model>>,
    generation: AtomicU64,
    limits: ValidationLimits,
}

impl ModelHandle {
    pub fn new(model: Model, limits: ValidationLimits) -> Self {
        Self {
            current: RwLock::new(Arc::new(model)),
            generation: AtomicU64::new(0),
            limits,
        }
    }

    /// Snapshot of the active model
    pub fn current(&self) -> Arc<Model> {
        Arc::clone(&self.current.read())
    }

    /// Number of successful swaps since creation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Install an already validated model, returning the previous one
    pub fn replace(&self, model: Model) -> Arc<Model> {
        let next = Arc::new(model);
        let hash = next.hash_hex();
        let previous = std::mem::replace(&mut *self.current.write(), next);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, hash = %hash, "Model swapped");
        previous
    }

    /// Decode bytes (binary or JSON) and swap on success
    pub fn reload_from_bytes(&self, bytes: &[u8]) -> Result<Arc<Model>> {
        match decode_any(bytes, &self.limits) {
            Ok(model) => Ok(self.replace(model)),
            Err(e) => {
                warn!(error = %e, "Reload rejected, keeping active model");
                Err(e)
            }
        }
    }

    /// Read from a source, decode and swap on success
    pub fn reload_from_source(&self, source: &dyn ModelSource) -> Result<Arc<Model>> {
        match load_model(source, &self.limits) {
            Ok(model) => Ok(self.replace(model)),
            Err(e) => {
                warn!(source = %source.describe(), error = %e, "Reload rejected, keeping active model");
                Err(e)
            }
        }
    }

    /// Classify against the current snapshot
    pub fn classify(&self, features: &[f32]) -> Result<usize> {
        self.current().classify(features)
    }
}
