//! Classification core for the materna risk pipeline.
//!
//! Provides the fitted label encoder, a deterministic multi-class
//! gradient-boosted tree classifier, and the paired artifact files the
//! trainer writes and the inference server loads.

pub mod artifact;
pub mod encoder;
pub mod gbdt;

pub use artifact::{ArtifactError, ArtifactPair, ENCODER_FILE, MODEL_FILE};
pub use encoder::LabelEncoder;
pub use gbdt::{softmax, GbdtClassifier, TrainError, TrainParams};
