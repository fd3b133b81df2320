//! Batch training pipeline: labeled CSV in, artifact pair out.

pub mod dataset;
pub mod pipeline;

pub use dataset::{load_dataset, Dataset, DatasetError};
pub use pipeline::{train, TrainConfig, TrainOutcome, TrainerError};
