use std::fs;
use std::path::Path;

use axum::extract::{Json, State};
use pretty_assertions::assert_eq;
use serde_json::json;

use materna_model::{ArtifactPair, TrainParams};
use materna_server::routes::{latest, predict};
use materna_server::{ApiError, AppState, RecordStore};
use materna_trainer::{load_dataset, train, TrainConfig};

/// Synthetic maternal vitals with three clearly separated risk bands.
fn write_dataset(path: &Path) {
    let mut csv = String::from("Age,SystolicBP,DiastolicBP,BS,BodyTemp,HeartRate,RiskLevel\n");
    for i in 0..10 {
        let j = i as f64;
        csv.push_str(&format!(
            "{},{},{},{},{},{},low risk\n",
            22.0 + j,
            100.0 + j,
            65.0 + j,
            6.0 + 0.1 * j,
            98.0,
            70.0 + j
        ));
        csv.push_str(&format!(
            "{},{},{},{},{},{},mid risk\n",
            30.0 + j,
            130.0 + j,
            85.0 + j,
            9.0 + 0.1 * j,
            99.0,
            80.0 + j
        ));
        csv.push_str(&format!(
            "{},{},{},{},{},{},high risk\n",
            40.0 + j,
            160.0 + j,
            100.0 + j,
            13.0 + 0.1 * j,
            101.0,
            90.0 + j
        ));
    }
    fs::write(path, csv).unwrap();
}

fn trained_artifacts(dir: &Path) -> ArtifactPair {
    let data = dir.join("vitals.csv");
    write_dataset(&data);
    let dataset = load_dataset(&data).unwrap();
    let config = TrainConfig {
        out_dir: dir.to_path_buf(),
        params: TrainParams::default(),
    };
    train(&dataset, &config).unwrap();
    ArtifactPair::load(dir, &materna_schema::fingerprint()).unwrap()
}

async fn serving_state(artifacts: Option<ArtifactPair>) -> AppState {
    let store = RecordStore::open_in_memory().await.unwrap();
    AppState::new(artifacts, store)
}

fn full_body() -> serde_json::Value {
    json!({
        "age": 25,
        "systolic_bp": 120,
        "diastolic_bp": 80,
        "bs": 7.0,
        "body_temp": 98,
        "heart_rate": 70
    })
}

#[tokio::test]
async fn predict_returns_known_label_and_persists_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = trained_artifacts(dir.path());
    let classes: Vec<String> = artifacts.encoder.classes().to_vec();
    let state = serving_state(Some(artifacts)).await;

    let Json(response) = predict(State(state.clone()), Json(full_body())).await.unwrap();
    let label = response["prediction"].as_str().unwrap();
    assert!(
        classes.iter().any(|c| c == label),
        "label {label:?} not among trained classes {classes:?}"
    );

    assert_eq!(state.store.count().await.unwrap(), 1);
    let row = state.store.latest().await.unwrap().unwrap();
    assert_eq!(row.name, "Anonymous");
    assert_eq!(
        [row.age, row.systolic_bp, row.diastolic_bp, row.bs, row.body_temp, row.heart_rate],
        [25.0, 120.0, 80.0, 7.0, 98.0, 70.0]
    );
    assert_eq!(row.risk, label);

    // /latest mirrors the same call.
    let Json(fetched) = latest(State(state.clone())).await.unwrap();
    assert_eq!(fetched, row);
}

#[tokio::test]
async fn missing_fields_are_rejected_without_a_write() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = trained_artifacts(dir.path());
    let state = serving_state(Some(artifacts)).await;

    let err = predict(State(state.clone()), Json(json!({ "age": 25 })))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::MissingFields);
    assert_eq!(state.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn absent_artifacts_refuse_prediction_without_a_write() {
    // Loading from a directory that was never trained into must fail...
    let empty = tempfile::tempdir().unwrap();
    let loaded = ArtifactPair::load(empty.path(), &materna_schema::fingerprint());
    assert!(loaded.is_err());

    // ...and the degraded server still answers, refusing predictions.
    let state = serving_state(None).await;
    let err = predict(State(state.clone()), Json(full_body())).await.unwrap_err();
    assert_eq!(err, ApiError::Unavailable);
    assert_eq!(state.store.count().await.unwrap(), 0);

    // /latest keeps working in degraded mode.
    let err = latest(State(state)).await.unwrap_err();
    assert_eq!(err, ApiError::NotFound);
}

#[tokio::test]
async fn latest_on_empty_store_is_not_found() {
    let state = serving_state(None).await;
    let err = latest(State(state)).await.unwrap_err();
    assert_eq!(err, ApiError::NotFound);
}

#[tokio::test]
async fn latest_tracks_the_most_recent_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = trained_artifacts(dir.path());
    let state = serving_state(Some(artifacts)).await;

    let calls = [
        json!({"name": "first", "age": 23, "systolic_bp": 102,
            "diastolic_bp": 66, "bs": 6.1, "body_temp": 98, "heart_rate": 71}),
        json!({"name": "second", "age": 33, "systolic_bp": 133,
            "diastolic_bp": 88, "bs": 9.2, "body_temp": 99, "heart_rate": 83}),
        json!({"name": "third", "age": 43, "systolic_bp": 163,
            "diastolic_bp": 103, "bs": 13.2, "body_temp": 101, "heart_rate": 93}),
    ];
    for body in &calls {
        predict(State(state.clone()), Json(body.clone())).await.unwrap();
    }

    assert_eq!(state.store.count().await.unwrap(), 3);
    let Json(fetched) = latest(State(state)).await.unwrap();
    assert_eq!(fetched.name, "third");
    assert_eq!(fetched.age, 43.0);
    assert_eq!(fetched.systolic_bp, 163.0);
}

#[tokio::test]
async fn risk_bands_map_to_distinct_labels() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = trained_artifacts(dir.path());

    // Centers of the three training bands classify back to their labels.
    let model = &artifacts.model;
    let encoder = &artifacts.encoder;
    let low = model.predict(&[25.0, 104.0, 69.0, 6.4, 98.0, 74.0]);
    let mid = model.predict(&[34.0, 134.0, 89.0, 9.4, 99.0, 84.0]);
    let high = model.predict(&[44.0, 164.0, 104.0, 13.4, 101.0, 94.0]);
    assert_eq!(encoder.decode(low), Some("low risk"));
    assert_eq!(encoder.decode(mid), Some("mid risk"));
    assert_eq!(encoder.decode(high), Some("high risk"));
}
