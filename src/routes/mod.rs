// Route exports
pub mod classify;
pub mod page;

use crate::models::MAX_TEXT_CHARS;
use actix_web::{error, http::StatusCode, web, HttpResponse};

pub use classify::AppState;

/// Root form endpoints plus the versioned JSON API
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(classify::configure_root).service(
        web::scope("/api/v1")
            .configure(classify::configure),
    );
}

/// JSON error response for malformed payloads
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle form payload errors
pub fn handle_form_payload_error(err: error::UrlencodedError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Form payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_form".to_string(),
        message: format!("Invalid form: {}", err),
        status_code: 400,
    }
    .into()
}

/// Largest encoding of one character: a `\uXXXX\uXXXX` surrogate pair in
/// JSON, or four percent-encoded bytes in a form
const MAX_ENCODED_CHAR_BYTES: usize = 12;

/// Room for the field name, braces and other framing
const PAYLOAD_FRAMING_BYTES: usize = 4096;

/// Byte limit that admits any text within the character cap, however encoded.
/// The character cap itself is enforced by request validation.
pub fn payload_limit() -> usize {
    MAX_TEXT_CHARS as usize * MAX_ENCODED_CHAR_BYTES + PAYLOAD_FRAMING_BYTES
}

/// Extractor settings shared by the server and tests
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(payload_limit())
        .error_handler(handle_json_payload_error)
}

pub fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .limit(payload_limit())
        .error_handler(handle_form_payload_error)
}
