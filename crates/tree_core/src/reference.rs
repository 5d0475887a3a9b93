//! Reference activity model
//!
//! The 30-feature / 6-class activity tree, shipped as a trained-tree document
//! and built through the regular [`ModelBuilder`] path.

use crate::builder::ModelBuilder;
use crate::errors::Result;
use crate::model::Model;
use crate::trained::TrainedModel;

/// Trained-tree document of the reference model
pub const REFERENCE_TREE_JSON: &str = include_str!("../models/reference_activity_tree.json");

pub const NUM_FEATURES: usize = 30;

pub const CLASS_NAMES: [&str; 6] = ["IDLE", "SOCIAL", "VIDEO", "MESSAGE", "BROWSE", "GAMING"];

/// Signal statistics, spectrum bands and wavelet energies, in vector order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "mean",
    "std",
    "var",
    "min",
    "max",
    "range",
    "median",
    "skewness",
    "kurtosis",
    "q25",
    "q75",
    "mean_abs_diff",
    "std_diff",
    "max_diff",
    "fft_low",
    "fft_mid",
    "fft_high",
    "fft_total",
    "fft_spread",
    "fft_range",
    "fft_dom",
    "fft_peak",
    "fft_centroid",
    "fft_rolloff",
    "wav_approx_std",
    "wav_detail1_std",
    "wav_detail2_std",
    "wav_detail3_std",
    "wav_detail1_energy",
    "wav_detail2_energy",
];

pub fn reference_trained() -> Result<TrainedModel> {
    TrainedModel::from_json_str(REFERENCE_TREE_JSON)
}

/// Build the reference model with default limits
pub fn reference_model() -> Result<Model> {
    ModelBuilder::default().build(&reference_trained()?)
}
