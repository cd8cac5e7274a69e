use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A corpus file discovered on disk, paired with the label derived from its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusFile {
    pub path: PathBuf,
    pub label: String,
}

impl CorpusFile {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

/// Outcome of a single classification request
///
/// `scores` holds one entry per registered label. `ranking` is a permutation
/// of those labels ordered by non-increasing score, ties broken by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub ranking: Vec<String>,
    pub scores: HashMap<String, f64>,
}

impl ClassificationResult {
    /// Build a result from a score map, deriving the ranking from it
    pub fn from_scores(scores: HashMap<String, f64>) -> Self {
        let ranking = rank_labels(&scores);
        Self { ranking, scores }
    }

    /// Highest ranked label, if any
    pub fn best_match(&self) -> Option<&str> {
        self.ranking.first().map(String::as_str)
    }

    pub fn score_of(&self, label: &str) -> Option<f64> {
        self.scores.get(label).copied()
    }
}

/// Order labels by descending score, then ascending label
///
/// NaN ranks below every other score.
pub fn rank_labels(scores: &HashMap<String, f64>) -> Vec<String> {
    let mut ranked: Vec<(&String, f64)> = scores
        .iter()
        .map(|(l, s)| (l, if s.is_nan() { f64::NEG_INFINITY } else { *s }))
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked.into_iter().map(|(label, _)| label.clone()).collect()
}

/// What to do when two corpus files derive the same label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Log a warning and keep the last file in discovery order
    #[default]
    Warn,
    /// Refuse to start
    Error,
}
