//! Model descriptor: the shape metadata bound to a node table.
//!
//! Names are carried for diagnostics and reporting only. The evaluator never
//! reads them.

use serde::{Deserialize, Serialize};

/// Feature/class counts plus optional names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Number of values expected in every feature vector
    pub num_features: usize,
    /// Number of distinct output classes
    pub num_classes: usize,
    /// Class labels, one per class index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
    /// Feature labels in feature-vector order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl ModelDescriptor {
    pub fn new(num_features: usize, num_classes: usize) -> Self {
        Self {
            num_features,
            num_classes,
            class_names: None,
            feature_names: None,
        }
    }

    pub fn with_class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_feature_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Label for a class index, for the reporting side
    pub fn class_name(&self, class_index: usize) -> Option<&str> {
        self.class_names
            .as_ref()
            .and_then(|names| names.get(class_index))
            .map(String::as_str)
    }

    /// Label for a feature index
    pub fn feature_name(&self, feature_index: usize) -> Option<&str> {
        self.feature_names
            .as_ref()
            .and_then(|names| names.get(feature_index))
            .map(String::as_str)
    }

    pub fn has_names(&self) -> bool {
        self.class_names.is_some() || self.feature_names.is_some()
    }

    /// Copy of this descriptor with the diagnostic names removed
    pub fn without_names(&self) -> Self {
        Self::new(self.num_features, self.num_classes)
    }
}
