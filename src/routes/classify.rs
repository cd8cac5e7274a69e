use crate::core::{Classifier, ClassifyError, NgramProfiler};
use crate::models::{
    BodiesResponse, ClassificationResult, ClassifyForm, ClassifyRequest, ClassifyResponse, ErrorResponse,
    HealthResponse,
};
use crate::routes::page::{self, PageOutcome};
use actix_web::{error, guard, http::header, http::StatusCode, web, HttpResponse, Responder};
use std::time::{Duration, Instant};
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub classifier: Classifier<NgramProfiler>,
    pub timeout: Duration,
}

impl error::ResponseError for ClassifyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::EmptyText => StatusCode::BAD_REQUEST,
            ClassifyError::EmptyRegistry => StatusCode::SERVICE_UNAVAILABLE,
            ClassifyError::Compare(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClassifyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ClassifyError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(error_body(self))
    }
}

fn error_body(err: &ClassifyError) -> ErrorResponse {
    let code = match err {
        ClassifyError::EmptyText => "empty_text",
        ClassifyError::EmptyRegistry => "no_bodies_loaded",
        ClassifyError::Compare(_) => "comparison_failed",
        ClassifyError::Timeout(_) => "timeout",
        ClassifyError::Worker(_) => "internal_error",
    };

    ErrorResponse {
        error: code.to_string(),
        message: err.to_string(),
        status_code: error::ResponseError::status_code(err).as_u16(),
    }
}

/// Manual entry form at the site root
pub fn configure_root(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().guard(guard::fn_guard(is_form)).to(classify_form))
            .route(web::post().to(classify_json)),
    );
}

/// Configure all classification API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/bodies", web::get().to(list_bodies))
        .route("/classify", web::post().to(classify_json));
}

fn is_form(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let bodies = state.classifier.registry().len();
    let status = if bodies > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        bodies,
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/bodies
async fn list_bodies(state: web::Data<AppState>) -> impl Responder {
    let bodies: Vec<String> = state.classifier.labels().into_iter().map(String::from).collect();

    HttpResponse::Ok().json(BodiesResponse {
        count: bodies.len(),
        bodies,
    })
}

/// GET /
async fn index(state: web::Data<AppState>) -> impl Responder {
    let html = page::render(&state.classifier.labels(), "", PageOutcome::Empty);
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

/// Classify endpoint
///
/// POST /api/v1/classify (also POST / with a JSON body)
///
/// Request body:
/// ```json
/// { "text": "le chat est noir" }
/// ```
async fn classify_json(
    state: web::Data<AppState>,
    req: web::Json<ClassifyRequest>,
) -> Result<HttpResponse, ClassifyError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for classify request: {}", errors);
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        }));
    }

    let response = run_classification(&state, req.into_inner().text).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST / from the manual entry form, answered with the rendered page
async fn classify_form(state: web::Data<AppState>, form: web::Form<ClassifyForm>) -> impl Responder {
    let req = ClassifyRequest::from(form.into_inner());
    let labels = state.classifier.labels();

    let (status, html) = match req.validate() {
        Err(errors) => {
            let err = ErrorResponse {
                error: "Validation failed".to_string(),
                message: errors.to_string(),
                status_code: 400,
            };
            (StatusCode::BAD_REQUEST, page::render(&labels, &req.text, PageOutcome::Error(&err)))
        }
        Ok(()) => match run_classification(&state, req.text.clone()).await {
            Ok(response) => (
                StatusCode::OK,
                page::render(&labels, &req.text, PageOutcome::Result(&response)),
            ),
            Err(e) => {
                let status = error::ResponseError::status_code(&e);
                (status, page::render(&labels, &req.text, PageOutcome::Error(&error_body(&e))))
            }
        },
    };

    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html)
}

async fn run_classification(state: &AppState, text: String) -> Result<ClassifyResponse, ClassifyError> {
    let started = Instant::now();
    let chars = text.chars().count();

    let result = state
        .classifier
        .classify_within(text, state.timeout)
        .await
        .map_err(|e| {
            match &e {
                ClassifyError::Timeout(_) | ClassifyError::Worker(_) => {
                    tracing::error!("Classification failed: {}", e)
                }
                _ => tracing::warn!("Classification rejected: {}", e),
            }
            e
        })?;

    let response = to_response(result, started.elapsed());

    tracing::debug!(
        "Classified {} chars as {:?} in {:.2}ms",
        chars,
        response.best_match,
        response.processing_time_ms
    );

    Ok(response)
}

fn to_response(result: ClassificationResult, elapsed: Duration) -> ClassifyResponse {
    ClassifyResponse {
        best_match: result.best_match().map(String::from),
        ranking: result.ranking,
        scores: result.scores,
        processing_time_ms: elapsed.as_secs_f64() * 1000.0,
    }
}
