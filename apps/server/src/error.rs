//! `ApiError`: the single error type every handler returns via
//! `Result<T, ApiError>`, mapping the kinds in spec.md §7's table onto HTTP
//! statuses (SPEC_FULL.md §A.2).

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use trellis_io::IoError;
use trellis_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("gone")]
    Gone,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not acceptable")]
    NotAcceptable,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("precondition failed")]
    PreconditionFailed,
    #[error("precondition required")]
    PreconditionRequired,
    #[error("unauthorized")]
    Unauthorized { realm: String, scope: String },
    #[error("forbidden")]
    Forbidden,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("unsupported syntax: {0}")]
    UnsupportedSyntax(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Gone => "GONE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotAcceptable => "NOT_ACCEPTABLE",
            Self::Conflict(_) => "CONFLICT",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::PreconditionRequired => "PRECONDITION_REQUIRED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::UnsupportedSyntax(_) => "UNSUPPORTED_SYNTAX",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Gone => StatusCode::GONE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::PreconditionRequired => StatusCode::PRECONDITION_REQUIRED,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedSyntax(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(err) => tracing::error!(error = %err, "internal error"),
            Self::Forbidden | Self::Unauthorized { .. } => tracing::warn!(code = self.code(), "access denied"),
            _ => tracing::debug!(code = self.code(), "request rejected"),
        }
        let status = self.status();
        let body = Json(json!({ "code": self.code(), "message": self.to_string() }));
        let mut response = (status, body).into_response();
        if let Self::Unauthorized { realm, scope } = &self {
            if let Ok(value) = HeaderValue::from_str(&format!(
                "Bearer realm=\"{realm}\", scope=\"{scope}\", error=\"invalid_token\""
            )) {
                response.headers_mut().insert(axum::http::header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// Storage-driver I/O wraps as `Internal` unless it is a recognized CAS
/// failure (`Conflict`) or a missing resource (spec.md §7 "Propagation
/// policy").
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::NotFound,
            StorageError::Conflict(reason) => ApiError::Conflict(reason),
            StorageError::Io(err) => ApiError::Internal(err.into()),
        }
    }
}

/// Parser/serializer failures wrap as `BadRequest` (spec.md §7: "parser/
/// serializer failures wrap as BadRdfSyntax -> 400"); unsupported update
/// syntax keeps its own 415 kind.
impl From<IoError> for ApiError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::UnsupportedSyntax(syntax) => ApiError::UnsupportedSyntax(syntax),
            IoError::BadRdfSyntax { .. } | IoError::BadSparqlUpdate(_) | IoError::PrefixConflict(_) => {
                ApiError::BadRequest(err.to_string())
            }
            IoError::Storage(err) => ApiError::Internal(err.into()),
        }
    }
}
