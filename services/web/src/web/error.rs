//! services/web/src/web/error.rs
//!
//! Errors a handler can answer with. Responses carry only the canonical
//! status text; details belong in the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("Bad Request")]
    BadRequest,

    #[error("Forbidden")]
    Forbidden,

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Internal Server Error")]
    Internal,
}

impl HttpError {
    pub fn status(self) -> StatusCode {
        match self {
            HttpError::BadRequest => StatusCode::BAD_REQUEST,
            HttpError::Forbidden => StatusCode::FORBIDDEN,
            HttpError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
