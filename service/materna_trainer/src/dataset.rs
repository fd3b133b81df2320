//! CSV dataset loading against the shared feature schema.

use std::path::Path;

use thiserror::Error;

use materna_schema::{FIELDS, LABEL_COLUMN};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing column {0:?}")]
    MissingColumn(String),
    #[error("row {row}, column {column:?}: {value:?} is not numeric")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("dataset has no rows")]
    Empty,
}

/// Parsed rows: one feature vector and one label string per record.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Read a headered CSV, resolving the schema's dataset columns and the
/// label column by name. Column order in the file does not matter; the
/// returned feature vectors are always in schema order.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let column_index = |name: &str| -> Result<usize, DatasetError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    };

    let mut feature_indices = Vec::with_capacity(FIELDS.len());
    for field in &FIELDS {
        feature_indices.push((field, column_index(field.column)?));
    }
    let label_index = column_index(LABEL_COLUMN)?;

    let mut features = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut values = Vec::with_capacity(FIELDS.len());
        for (field, col) in &feature_indices {
            let raw = record.get(*col).unwrap_or("");
            let value: f64 = raw.trim().parse().map_err(|_| DatasetError::BadNumber {
                row,
                column: field.column,
                value: raw.to_string(),
            })?;
            values.push(value);
        }
        features.push(values);
        labels.push(record.get(label_index).unwrap_or("").trim().to_string());
    }

    if labels.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(Dataset { features, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_rows_in_schema_order() {
        // Columns deliberately shuffled relative to the schema.
        let file = write_csv(
            "RiskLevel,HeartRate,Age,SystolicBP,DiastolicBP,BS,BodyTemp\n\
             low risk,70,25,120,80,7.0,98\n\
             high risk,88,35,140,95,13.0,101\n",
        );
        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features[0], vec![25.0, 120.0, 80.0, 7.0, 98.0, 70.0]);
        assert_eq!(ds.labels, vec!["low risk", "high risk"]);
    }

    #[test]
    fn missing_column_is_fatal() {
        let file = write_csv("Age,SystolicBP\n25,120\n");
        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(_)));
    }

    #[test]
    fn non_numeric_cell_is_fatal() {
        let file = write_csv(
            "Age,SystolicBP,DiastolicBP,BS,BodyTemp,HeartRate,RiskLevel\n\
             25,120,80,high,98,70,low risk\n",
        );
        let err = load_dataset(file.path()).unwrap_err();
        match err {
            DatasetError::BadNumber { row, column, value } => {
                assert_eq!(row, 0);
                assert_eq!(column, "BS");
                assert_eq!(value, "high");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_dataset_is_fatal() {
        let file = write_csv("Age,SystolicBP,DiastolicBP,BS,BodyTemp,HeartRate,RiskLevel\n");
        assert!(matches!(
            load_dataset(file.path()),
            Err(DatasetError::Empty)
        ));
    }
}
