use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::BuildError, observability::metrics, services::ServiceError,
    validation::ValidationError,
};

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
}

/// Error information matching OpenAI's error schema.
///
/// OpenAI error format: `{"error": {"type": "...", "message": "...", "param": ..., "code": ...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error type classification (e.g., "invalid_request_error", "server_error")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Parameter that caused the error (null if not applicable)
    pub param: Option<String>,
    /// Machine-readable error code (null if not applicable)
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create an `invalid_request_error` response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_type("invalid_request_error", code, message)
    }

    /// Create an `invalid_request_error` response pointing at a parameter.
    pub fn with_param(
        code: impl Into<String>,
        message: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        let mut response = Self::new(code, message);
        response.error.param = Some(param.into());
        response
    }

    /// Create a response with an explicit error type.
    pub fn with_type(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                message: message.into(),
                param: None,
                code: Some(code.into()),
            },
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Caller identity missing or malformed.
    Validation(ValidationError),
    /// Identity header present but not valid UTF-8 text.
    InvalidHeader(String),
    NotFound(String),
    /// The catalog could not be built.
    CatalogUnavailable(BuildError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<BuildError> for ApiError {
    fn from(err: BuildError) -> Self {
        ApiError::CatalogUnavailable(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::Validation(e),
            ServiceError::Catalog(e) => ApiError::CatalogUnavailable(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, body) = match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                ErrorResponse::with_param("invalid_user_id", err.to_string(), err.param()),
            ),
            ApiError::InvalidHeader(header) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                ErrorResponse::with_param(
                    "invalid_header",
                    format!("Header '{header}' must be visible ASCII"),
                    header,
                ),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "not_found",
                ErrorResponse::new("model_not_found", msg),
            ),
            ApiError::CatalogUnavailable(err) => {
                tracing::error!(error = %err, kind = err.kind(), "Model catalog unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    ErrorResponse::with_type(
                        "server_error",
                        "catalog_unavailable",
                        "The model catalog is temporarily unavailable",
                    ),
                )
            }
        };

        let code = body.error.code.as_deref().unwrap_or("unknown");
        metrics::record_gateway_error(error_type, code);

        (status, Json(body)).into_response()
    }
}
