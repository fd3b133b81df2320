//! HTTP handlers for prediction and record lookup.

use axum::extract::{Json, State};
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use serde_json::{json, Value};

use materna_schema::{FeatureVector, FEATURE_COUNT, FIELDS};

use crate::error::ApiError;
use crate::store::{HealthRecord, NewRecord};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/latest", get(latest))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Classify one set of vitals and persist the outcome.
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let artifacts = state.artifacts.as_ref().ok_or(ApiError::Unavailable)?;
    let features = parse_features(&body)?;
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Anonymous")
        .to_string();

    let class = artifacts.model.predict(features.as_slice());
    let risk = artifacts
        .encoder
        .decode(class)
        .ok_or(ApiError::ComputationFailed)?
        .to_string();

    let record = NewRecord {
        name,
        features,
        risk: risk.clone(),
    };
    state.store.insert(&record).await.map_err(|e| {
        error!("record insert failed: {e}");
        ApiError::DbWrite
    })?;

    info!("predicted {risk:?} for {:?}", record.name);
    Ok(Json(json!({ "prediction": risk })))
}

/// The most recently persisted prediction.
pub async fn latest(State(state): State<AppState>) -> Result<Json<HealthRecord>, ApiError> {
    let record = state.store.latest().await.map_err(|e| {
        error!("latest fetch failed: {e}");
        ApiError::DbFetch
    })?;
    record.map(Json).ok_or(ApiError::NotFound)
}

/// Assemble the six features in schema order. Presence of every required
/// key is checked before any value is coerced; values may be JSON numbers
/// or numeric strings.
fn parse_features(body: &Value) -> Result<FeatureVector, ApiError> {
    let obj = body.as_object().ok_or(ApiError::MissingFields)?;
    if FIELDS.iter().any(|f| !obj.contains_key(f.name)) {
        return Err(ApiError::MissingFields);
    }

    let mut values = [0.0f64; FEATURE_COUNT];
    for (slot, field) in values.iter_mut().zip(FIELDS.iter()) {
        *slot = coerce(&obj[field.name]).ok_or(ApiError::InvalidValue(field.name))?;
    }
    Ok(FeatureVector::new(values))
}

fn coerce(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
