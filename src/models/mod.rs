// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ClassificationResult, CorpusFile, DuplicatePolicy, rank_labels};
pub use requests::{ClassifyForm, ClassifyRequest, MAX_TEXT_CHARS};
pub use responses::{BodiesResponse, ClassifyResponse, ErrorResponse, HealthResponse};
