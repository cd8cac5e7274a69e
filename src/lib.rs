//! Biscuit Server - identifies the body of text (usually a language) a
//! snippet most likely belongs to.
//!
//! Corpus frequency tables are discovered on disk and loaded concurrently
//! into a read-only [`Registry`] before the HTTP service starts. Each request
//! builds an n-gram profile of the submitted text and ranks every registered
//! body against it.

pub mod cli;
pub mod config;
pub mod core;
pub mod models;
pub mod routes;

// Re-export commonly used types
pub use crate::core::{classify, initialize, Classifier, ClassifyError, NgramProfiler, ProfileBuilder, Registry, StartupError};
pub use models::{ClassificationResult, CorpusFile};
