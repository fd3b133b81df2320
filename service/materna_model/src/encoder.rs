//! Bidirectional mapping between risk-level strings and class indices.

use serde::{Deserialize, Serialize};

/// A fitted categorical encoder.
///
/// Class indices are assigned by lexicographic order of the distinct
/// label strings seen at fit time. The full mapping is serialized with
/// the artifact pair, so the index assignment observed during training
/// is the one used at serving time regardless of how this crate evolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit the encoder over every label occurrence in a dataset.
    /// Duplicates are collapsed; classes end up sorted.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Class index for a label, if the label was seen at fit time.
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    /// Label string for a class index.
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|s| s.as_str())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
