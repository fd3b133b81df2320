//! Deterministic multi-class gradient-boosted decision trees.
//!
//! Each boosting round fits one depth-limited regression tree per class
//! against the softmax residuals of the current scores. Tree fitting is
//! fully deterministic: identical input always produces an identical
//! model, and the serialized form round-trips through JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("empty training set")]
    EmptyDataset,
    #[error("need at least 2 classes, got {0}")]
    TooFewClasses(usize),
    #[error("label index {label} out of range for {classes} classes")]
    LabelOutOfRange { label: usize, classes: usize },
    #[error("row {row} has {got} features, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },
}

/// Boosting hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainParams {
    pub rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum number of samples on each side of a split.
    pub min_leaf: usize,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            rounds: 60,
            learning_rate: 0.1,
            max_depth: 3,
            min_leaf: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree over the node arena; `root` indexes `nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<Node>,
    root: usize,
}

impl RegressionTree {
    fn predict(&self, x: &[f64]) -> f64 {
        let mut cur = self.root;
        loop {
            match &self.nodes[cur] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    cur = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Multi-class gradient-boosted classifier.
///
/// `trees[round][class]` holds the regression tree fitted for `class` in
/// `round`; per-class scores start at zero and accumulate
/// `learning_rate * tree.predict(x)` over rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtClassifier {
    n_features: usize,
    n_classes: usize,
    learning_rate: f64,
    trees: Vec<Vec<RegressionTree>>,
}

impl GbdtClassifier {
    /// Fit a classifier on encoded labels.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &TrainParams,
    ) -> Result<Self, TrainError> {
        if features.is_empty() || labels.len() != features.len() {
            return Err(TrainError::EmptyDataset);
        }
        if n_classes < 2 {
            return Err(TrainError::TooFewClasses(n_classes));
        }
        let n_features = features[0].len();
        for (row, f) in features.iter().enumerate() {
            if f.len() != n_features {
                return Err(TrainError::RaggedRow {
                    row,
                    got: f.len(),
                    expected: n_features,
                });
            }
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(TrainError::LabelOutOfRange {
                label,
                classes: n_classes,
            });
        }

        let n = features.len();
        let k_factor = (n_classes as f64 - 1.0) / n_classes as f64;
        let mut scores = vec![vec![0.0f64; n_classes]; n];
        let mut trees: Vec<Vec<RegressionTree>> = Vec::with_capacity(params.rounds);

        for _ in 0..params.rounds {
            let probs: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();
            let mut round_trees = Vec::with_capacity(n_classes);
            for k in 0..n_classes {
                let residuals: Vec<f64> = (0..n)
                    .map(|i| (labels[i] == k) as u8 as f64 - probs[i][k])
                    .collect();
                let hessians: Vec<f64> = (0..n).map(|i| probs[i][k] * (1.0 - probs[i][k])).collect();
                let tree = fit_tree(features, &residuals, &hessians, k_factor, params);
                for i in 0..n {
                    scores[i][k] += params.learning_rate * tree.predict(&features[i]);
                }
                round_trees.push(tree);
            }
            trees.push(round_trees);
        }

        Ok(Self {
            n_features,
            n_classes,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Accumulated per-class scores for one sample.
    pub fn predict_scores(&self, x: &[f64]) -> Vec<f64> {
        let mut scores = vec![0.0f64; self.n_classes];
        for round in &self.trees {
            for (k, tree) in round.iter().enumerate() {
                scores[k] += self.learning_rate * tree.predict(x);
            }
        }
        scores
    }

    /// Softmax class distribution for one sample.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        softmax(&self.predict_scores(x))
    }

    /// Predicted class index (argmax of the score vector).
    pub fn predict(&self, x: &[f64]) -> usize {
        let scores = self.predict_scores(x);
        let mut best = 0;
        for (k, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = k;
            }
        }
        best
    }
}

/// Fit one regression tree to the residuals with squared-error splits and
/// Newton-step leaf values.
fn fit_tree(
    features: &[Vec<f64>],
    residuals: &[f64],
    hessians: &[f64],
    k_factor: f64,
    params: &TrainParams,
) -> RegressionTree {
    let mut builder = TreeBuilder {
        features,
        residuals,
        hessians,
        k_factor,
        params,
        nodes: Vec::new(),
    };
    let all: Vec<usize> = (0..features.len()).collect();
    let root = builder.build(&all, 0);
    RegressionTree {
        nodes: builder.nodes,
        root,
    }
}

struct TreeBuilder<'a> {
    features: &'a [Vec<f64>],
    residuals: &'a [f64],
    hessians: &'a [f64],
    k_factor: f64,
    params: &'a TrainParams,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, idx: &[usize], depth: usize) -> usize {
        if depth >= self.params.max_depth
            || idx.len() < 2
            || idx.len() < 2 * self.params.min_leaf
        {
            return self.push_leaf(idx);
        }
        match self.best_split(idx) {
            None => self.push_leaf(idx),
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
                    .iter()
                    .partition(|&&i| self.features[i][feature] <= threshold);
                let left = self.build(&left_idx, depth + 1);
                let right = self.build(&right_idx, depth + 1);
                self.nodes.push(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                });
                self.nodes.len() - 1
            }
        }
    }

    fn push_leaf(&mut self, idx: &[usize]) -> usize {
        let sum_r: f64 = idx.iter().map(|&i| self.residuals[i]).sum();
        let sum_h: f64 = idx.iter().map(|&i| self.hessians[i]).sum();
        let value = self.k_factor * sum_r / (sum_h + 1e-9);
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    /// Exhaustive split search: for every feature, sort the node's samples
    /// and score each boundary between distinct values by the reduction in
    /// residual sum of squares. Returns `None` when nothing improves.
    fn best_split(&self, idx: &[usize]) -> Option<(usize, f64)> {
        let n = idx.len() as f64;
        let total: f64 = idx.iter().map(|&i| self.residuals[i]).sum();
        let parent_sse = {
            let mean = total / n;
            idx.iter()
                .map(|&i| {
                    let d = self.residuals[i] - mean;
                    d * d
                })
                .sum::<f64>()
        };

        let n_features = self.features[idx[0]].len();
        let min_leaf = self.params.min_leaf;
        let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, sse)

        for feature in 0..n_features {
            let mut order: Vec<usize> = idx.to_vec();
            order.sort_by(|&a, &b| {
                self.features[a][feature]
                    .partial_cmp(&self.features[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            let total_sq: f64 = order
                .iter()
                .map(|&i| self.residuals[i] * self.residuals[i])
                .sum();

            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left_sum += self.residuals[i];
                left_sq += self.residuals[i] * self.residuals[i];

                let x_here = self.features[i][feature];
                let x_next = self.features[order[pos + 1]][feature];
                if x_here == x_next {
                    continue;
                }
                let left_n = (pos + 1) as f64;
                let right_n = (order.len() - pos - 1) as f64;
                if (pos + 1) < min_leaf || (order.len() - pos - 1) < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / left_n)
                    + (right_sq - right_sum * right_sum / right_n);

                if best.as_ref().map_or(true, |&(_, _, b)| sse < b) {
                    best = Some((feature, (x_here + x_next) / 2.0, sse));
                }
            }
        }

        best.and_then(|(feature, threshold, sse)| {
            if parent_sse - sse > 1e-12 {
                Some((feature, threshold))
            } else {
                None
            }
        })
    }
}
