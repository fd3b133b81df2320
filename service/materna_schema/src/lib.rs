//! Shared clinical feature schema for the materna pipeline.
//!
//! Both the trainer and the inference server consume this crate, so the
//! order and count of features cannot drift between them. Serialized model
//! artifacts embed [`fingerprint`] and refuse to load against a schema
//! they were not trained for.

use serde::{Deserialize, Serialize};

/// Bumped whenever the field list or its order changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Number of clinical input features.
pub const FEATURE_COUNT: usize = 6;

/// One clinical feature: the wire/API name and the dataset CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub column: &'static str,
}

/// The six features, in the exact order the classifier is trained on.
pub const FIELDS: [Field; FEATURE_COUNT] = [
    Field { name: "age", column: "Age" },
    Field { name: "systolic_bp", column: "SystolicBP" },
    Field { name: "diastolic_bp", column: "DiastolicBP" },
    Field { name: "bs", column: "BS" },
    Field { name: "body_temp", column: "BodyTemp" },
    Field { name: "heart_rate", column: "HeartRate" },
];

/// CSV header of the target category column.
pub const LABEL_COLUMN: &str = "RiskLevel";

/// Stable identifier for this schema revision, embedded in artifacts.
///
/// The full ordered field list is spelled out rather than hashed so a
/// mismatch error can show exactly what differs.
pub fn fingerprint() -> String {
    let names: Vec<&str> = FIELDS.iter().map(|f| f.name).collect();
    format!("v{}:{}", SCHEMA_VERSION, names.join(","))
}

/// An ordered vector of the six feature values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}
