use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure talking to the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store did not answer in time")]
    Timeout,

    #[error("record store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("unexpected value in record store: {0}")]
    Corrupt(String),

    #[error("{0} already exists")]
    Duplicate(String),
}

impl StoreError {
    /// Timeouts are safe to retry for reads; everything else needs an operator.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Timeout => true,
            StoreError::Query(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

/// Failure of an attendance operation.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidRange(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl ResponseError for TrackerError {
    fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::InvalidStatus(_)
            | TrackerError::InvalidState(_)
            | TrackerError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            TrackerError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            TrackerError::Store(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            TrackerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            TrackerError::Store(e @ StoreError::Duplicate(_)) => {
                HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
            }
            TrackerError::Store(e) => {
                error!(error = %e, "Record store failure");
                let message = if e.is_retryable() {
                    "Service busy, try again"
                } else {
                    "Internal Server Error"
                };
                HttpResponse::build(self.status_code()).json(json!({ "error": message }))
            }
            other => HttpResponse::build(self.status_code()).json(json!({
                "error": other.to_string()
            })),
        }
    }
}
