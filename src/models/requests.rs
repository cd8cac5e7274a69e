use serde::{Deserialize, Serialize};
use validator::Validate;

/// Upper bound on submitted text, in characters
pub const MAX_TEXT_CHARS: u64 = 100_000;

/// Request to classify a piece of text
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(min = 1, max = 100000))]
    pub text: String,
}

/// Form submission from the manual entry page
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyForm {
    #[serde(default)]
    pub text: String,
}

impl From<ClassifyForm> for ClassifyRequest {
    fn from(form: ClassifyForm) -> Self {
        Self { text: form.text }
    }
}
