//! HTTP inference service over the trained materna artifact pair.
//!
//! State is an explicitly constructed [`AppState`]: the artifacts are an
//! `Option` filled once at startup, so a failed model load degrades the
//! service (prediction refuses, `/health` and `/latest` still answer)
//! rather than leaving a nullable global around.

pub mod error;
pub mod routes;
pub mod store;

use std::sync::Arc;

use materna_model::ArtifactPair;

pub use error::ApiError;
pub use routes::router;
pub use store::{HealthRecord, NewRecord, RecordStore};

#[derive(Clone)]
pub struct AppState {
    /// `None` when either artifact failed to load at startup.
    pub artifacts: Option<Arc<ArtifactPair>>,
    pub store: RecordStore,
}

impl AppState {
    pub fn new(artifacts: Option<ArtifactPair>, store: RecordStore) -> Self {
        Self {
            artifacts: artifacts.map(Arc::new),
            store,
        }
    }
}
