use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::ModelError;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error body returned by every handler.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
    /// Rows written by an import, always reported on import failures.
    pub created: Option<u64>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail, created: None }
    }

    pub fn with_created(mut self, created: u64) -> Self {
        self.created = Some(created);
        self
    }

    /// Map an import failure; nothing is ever partially committed.
    pub fn import(e: ServiceError) -> Self {
        match e {
            ServiceError::ImportRow { .. } => {
                JsonApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Import Failed", Some(e.to_string()))
            }
            other => JsonApiError::from(other),
        }
        .with_created(0)
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(detail) => JsonApiError::new(StatusCode::NOT_FOUND, "Not Found", Some(detail)),
            ServiceError::Validation(_) => {
                JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string()))
            }
            ServiceError::UnsupportedFile(_) | ServiceError::UnreadableFile(_) => {
                JsonApiError::new(StatusCode::BAD_REQUEST, "Invalid File", Some(e.to_string()))
            }
            ServiceError::ImportRow { .. } => {
                JsonApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Import Failed", Some(e.to_string()))
            }
            ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => {
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Database Error", Some(e.to_string()))
            }
            ServiceError::Export(_) => {
                JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Export Failed", Some(e.to_string()))
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, title = self.title, detail = ?self.detail, "request failed");
        }
        let body = ErrorBody { error: self.title, detail: self.detail.as_deref(), created: self.created };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
