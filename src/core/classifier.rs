use crate::core::profile::{CompareError, ProfileBuilder};
use crate::core::registry::Registry;
use crate::models::ClassificationResult;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Label given to the ephemeral profile built from submitted text
pub const UNKNOWN_LABEL: &str = "unknown";

/// Errors that can occur while classifying a request
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Text to classify is empty")]
    EmptyText,

    #[error("No bodies are loaded")]
    EmptyRegistry,

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error("Classification did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Classification task failed: {0}")]
    Worker(String),
}

/// Score `text` against every registered profile
///
/// `order` must be the n-gram order the registry was loaded with. The
/// returned scores cover exactly the registry's labels; a comparator that
/// returns anything else is reported as `CompareError::Incomplete`.
pub fn classify<B: ProfileBuilder>(
    builder: &B,
    registry: &Registry<B::Profile>,
    text: &str,
    order: usize,
) -> Result<ClassificationResult, ClassifyError> {
    if text.trim().is_empty() {
        return Err(ClassifyError::EmptyText);
    }
    if registry.is_empty() {
        return Err(ClassifyError::EmptyRegistry);
    }

    let unknown = builder.from_text(UNKNOWN_LABEL, text, order);
    let candidates: Vec<(&str, &B::Profile)> = registry.iter().collect();
    let compared = builder.compare_all(&unknown, &candidates)?;

    check_coverage(registry, &compared)?;
    check_finite(&compared)?;

    // Re-rank so ties are ordered the same way regardless of comparator
    Ok(ClassificationResult::from_scores(compared.scores))
}

fn check_coverage<P>(registry: &Registry<P>, compared: &ClassificationResult) -> Result<(), CompareError> {
    let expected: HashSet<&str> = registry.iter().map(|(label, _)| label).collect();
    let actual: HashSet<&str> = compared.scores.keys().map(String::as_str).collect();

    if expected == actual {
        return Ok(());
    }

    let mut missing: Vec<String> = expected.difference(&actual).map(|l| l.to_string()).collect();
    let mut unexpected: Vec<String> = actual.difference(&expected).map(|l| l.to_string()).collect();
    missing.sort();
    unexpected.sort();

    Err(CompareError::Incomplete { missing, unexpected })
}

fn check_finite(compared: &ClassificationResult) -> Result<(), CompareError> {
    let mut bad: Vec<&String> = compared
        .scores
        .iter()
        .filter(|(_, score)| !score.is_finite())
        .map(|(label, _)| label)
        .collect();
    bad.sort();

    match bad.first() {
        Some(label) => Err(CompareError::NonFinite {
            label: label.to_string(),
        }),
        None => Ok(()),
    }
}

/// Request-time entry point bundling the builder, the frozen registry and
/// the n-gram order it was loaded with
pub struct Classifier<B: ProfileBuilder> {
    builder: Arc<B>,
    registry: Arc<Registry<B::Profile>>,
    ngram_order: usize,
}

impl<B: ProfileBuilder> Clone for Classifier<B> {
    fn clone(&self) -> Self {
        Self {
            builder: Arc::clone(&self.builder),
            registry: Arc::clone(&self.registry),
            ngram_order: self.ngram_order,
        }
    }
}

impl<B: ProfileBuilder> Classifier<B> {
    pub fn new(builder: Arc<B>, registry: Registry<B::Profile>, ngram_order: usize) -> Self {
        Self {
            builder,
            registry: Arc::new(registry),
            ngram_order,
        }
    }

    pub fn registry(&self) -> &Registry<B::Profile> {
        &self.registry
    }

    pub fn ngram_order(&self) -> usize {
        self.ngram_order
    }

    /// Registered labels, sorted
    pub fn labels(&self) -> Vec<&str> {
        self.registry.labels()
    }

    pub fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError> {
        classify(self.builder.as_ref(), &self.registry, text, self.ngram_order)
    }

    /// Classify on the blocking pool, giving up after `limit`
    ///
    /// Dropping the returned future (e.g. on client disconnect) stops
    /// waiting; the blocking work itself runs to completion.
    pub async fn classify_within(&self, text: String, limit: Duration) -> Result<ClassificationResult, ClassifyError> {
        let classifier = self.clone();
        let task = tokio::task::spawn_blocking(move || classifier.classify(&text));

        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ClassifyError::Worker(e.to_string())),
            Err(_) => Err(ClassifyError::Timeout(limit)),
        }
    }
}
