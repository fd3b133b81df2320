//! Paired on-disk artifacts: classifier + label encoder.
//!
//! Both files embed the same header so a load can verify that (a) the
//! format is understood, (b) the artifact was trained against the schema
//! the caller compiled with, and (c) the two files came out of the same
//! training run. Any mismatch fails loudly at load time instead of
//! silently decoding predictions to the wrong label.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::encoder::LabelEncoder;
use crate::gbdt::GbdtClassifier;

pub const MODEL_FILE: &str = "risk_model.json";
pub const ENCODER_FILE: &str = "label_encoder.json";

/// Bumped when the serialized layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact io: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedFormat { found: u32, supported: u32 },
    #[error("schema mismatch: artifact has {found:?}, runtime expects {expected:?}")]
    SchemaMismatch { expected: String, found: String },
    #[error("artifact pair is from different training runs: model {model:?}, encoder {encoder:?}")]
    RunMismatch { model: String, encoder: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ArtifactHeader {
    format_version: u32,
    schema: String,
    run_id: String,
    created_at: String,
}

#[derive(Serialize, Deserialize)]
struct ArtifactFile<T> {
    header: ArtifactHeader,
    payload: T,
}

/// A loaded, verified classifier/encoder pair.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub model: GbdtClassifier,
    pub encoder: LabelEncoder,
    pub run_id: String,
}

impl ArtifactPair {
    /// Serialize both artifacts under `dir`, stamped with `schema` and a
    /// shared `run_id`.
    pub fn save(
        dir: &Path,
        model: &GbdtClassifier,
        encoder: &LabelEncoder,
        schema: &str,
        run_id: &str,
    ) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir)?;
        let header = ArtifactHeader {
            format_version: FORMAT_VERSION,
            schema: schema.to_string(),
            run_id: run_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        write_file(&dir.join(MODEL_FILE), &header, model)?;
        write_file(&dir.join(ENCODER_FILE), &header, encoder)?;
        Ok(())
    }

    /// Load and verify the pair under `dir` against the expected schema
    /// fingerprint.
    pub fn load(dir: &Path, expected_schema: &str) -> Result<Self, ArtifactError> {
        let (model_header, model): (ArtifactHeader, GbdtClassifier) =
            read_file(&dir.join(MODEL_FILE), expected_schema)?;
        let (encoder_header, encoder): (ArtifactHeader, LabelEncoder) =
            read_file(&dir.join(ENCODER_FILE), expected_schema)?;

        if model_header.run_id != encoder_header.run_id {
            return Err(ArtifactError::RunMismatch {
                model: model_header.run_id,
                encoder: encoder_header.run_id,
            });
        }

        Ok(Self {
            model,
            encoder,
            run_id: model_header.run_id,
        })
    }
}

fn write_file<T: Serialize>(
    path: &Path,
    header: &ArtifactHeader,
    payload: &T,
) -> Result<(), ArtifactError> {
    let file = ArtifactFile {
        header: header.clone(),
        payload,
    };
    let data = serde_json::to_vec_pretty(&file)?;
    fs::write(path, data)?;
    Ok(())
}

fn read_file<T: DeserializeOwned>(
    path: &Path,
    expected_schema: &str,
) -> Result<(ArtifactHeader, T), ArtifactError> {
    let data = fs::read(path)?;
    let file: ArtifactFile<T> = serde_json::from_slice(&data)?;
    if file.header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedFormat {
            found: file.header.format_version,
            supported: FORMAT_VERSION,
        });
    }
    if file.header.schema != expected_schema {
        return Err(ArtifactError::SchemaMismatch {
            expected: expected_schema.to_string(),
            found: file.header.schema,
        });
    }
    Ok((file.header, file.payload))
}
