//! End-to-end training run: split, fit, evaluate, serialize.

use std::path::PathBuf;

use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use uuid::Uuid;

use materna_model::{ArtifactError, ArtifactPair, GbdtClassifier, LabelEncoder, TrainError, TrainParams};

use crate::dataset::{Dataset, DatasetError};

/// Fraction of rows held out from training.
const HOLDOUT_FRACTION: f64 = 0.2;

/// Fixed shuffle seed so runs over the same dataset are reproducible.
const SPLIT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("label {0:?} missing from fitted encoder")]
    UnknownLabel(String),
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub out_dir: PathBuf,
    pub params: TrainParams,
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct TrainOutcome {
    pub run_id: String,
    pub classes: Vec<String>,
    pub trained_rows: usize,
    pub holdout_rows: usize,
    /// Fraction of held-out rows predicted correctly; `None` when the
    /// dataset was too small to hold anything out. Logged, never persisted,
    /// and no threshold is enforced.
    pub holdout_accuracy: Option<f64>,
}

/// Run the whole pipeline over an already-loaded dataset and write the
/// artifact pair to `config.out_dir`.
pub fn train(dataset: &Dataset, config: &TrainConfig) -> Result<TrainOutcome, TrainerError> {
    let encoder = LabelEncoder::fit(dataset.labels.iter());
    info!("fitted label encoder over {} classes", encoder.len());

    let mut encoded = Vec::with_capacity(dataset.len());
    for label in &dataset.labels {
        let index = encoder
            .encode(label)
            .ok_or_else(|| TrainerError::UnknownLabel(label.clone()))?;
        encoded.push(index);
    }

    let (train_idx, holdout_idx) = split_indices(dataset.len());
    let train_features: Vec<Vec<f64>> = train_idx
        .iter()
        .map(|&i| dataset.features[i].clone())
        .collect();
    let train_labels: Vec<usize> = train_idx.iter().map(|&i| encoded[i]).collect();

    info!(
        "training on {} rows, holding out {}",
        train_features.len(),
        holdout_idx.len()
    );
    let model = GbdtClassifier::fit(
        &train_features,
        &train_labels,
        encoder.len(),
        &config.params,
    )?;

    let holdout_accuracy = if holdout_idx.is_empty() {
        None
    } else {
        let correct = holdout_idx
            .iter()
            .filter(|&&i| model.predict(&dataset.features[i]) == encoded[i])
            .count();
        Some(correct as f64 / holdout_idx.len() as f64)
    };
    if let Some(acc) = holdout_accuracy {
        info!("held-out accuracy: {:.3}", acc);
    }

    let run_id = Uuid::new_v4().to_string();
    ArtifactPair::save(
        &config.out_dir,
        &model,
        &encoder,
        &materna_schema::fingerprint(),
        &run_id,
    )?;
    info!(
        "wrote artifact pair (run {}) to {}",
        run_id,
        config.out_dir.display()
    );

    Ok(TrainOutcome {
        run_id,
        classes: encoder.classes().to_vec(),
        trained_rows: train_features.len(),
        holdout_rows: holdout_idx.len(),
        holdout_accuracy,
    })
}

/// Deterministic shuffled split. The holdout is the tail fraction of the
/// shuffled order; with fewer than five rows everything trains.
fn split_indices(n: usize) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);

    let holdout = ((n as f64) * HOLDOUT_FRACTION).floor() as usize;
    let split = n - holdout;
    let holdout_idx = indices.split_off(split);
    (indices, holdout_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn synthetic_dataset() -> Dataset {
        // Risk tracks systolic pressure; everything else is mild noise.
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64;
            features.push(vec![25.0 + jitter, 100.0 + jitter, 70.0, 6.5, 98.0, 70.0]);
            labels.push("low risk".to_string());
            features.push(vec![35.0 + jitter, 160.0 + jitter, 100.0, 13.0, 101.0, 88.0]);
            labels.push("high risk".to_string());
        }
        Dataset { features, labels }
    }

    #[test]
    fn split_is_deterministic_and_sized() {
        let (a_train, a_hold) = split_indices(100);
        let (b_train, b_hold) = split_indices(100);
        assert_eq!(a_train, b_train);
        assert_eq!(a_hold, b_hold);
        assert_eq!(a_hold.len(), 20);
        assert_eq!(a_train.len(), 80);

        let mut all: Vec<usize> = a_train.iter().chain(a_hold.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn tiny_dataset_trains_everything() {
        let (train, hold) = split_indices(4);
        assert_eq!(train.len(), 4);
        assert!(hold.is_empty());
    }

    #[test]
    fn full_run_writes_loadable_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = synthetic_dataset();
        let config = TrainConfig {
            out_dir: dir.path().to_path_buf(),
            params: TrainParams::default(),
        };

        let outcome = train(&dataset, &config).unwrap();
        assert_eq!(outcome.classes, vec!["high risk", "low risk"]);
        assert_eq!(outcome.trained_rows + outcome.holdout_rows, dataset.len());
        if let Some(acc) = outcome.holdout_accuracy {
            assert!(acc > 0.9, "held-out accuracy {acc} too low for separable data");
        }

        let pair = ArtifactPair::load(dir.path(), &materna_schema::fingerprint()).unwrap();
        assert_eq!(pair.run_id, outcome.run_id);
        assert_eq!(pair.encoder.classes(), ["high risk", "low risk"]);

        let low = pair.model.predict(&[25.0, 100.0, 70.0, 6.5, 98.0, 70.0]);
        assert_eq!(pair.encoder.decode(low), Some("low risk"));
    }
}
