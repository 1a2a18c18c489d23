use super::pages;
use crate::{credentials::StoreError, session::SessionError};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Handler failures that end the request.
///
/// User-input problems (taken username, bad credentials) are not errors; they
/// are flashed back on the re-rendered form.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to view this page.".to_string(),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested page does not exist.".to_string(),
            ),
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            Self::Internal(err) => {
                error!("Request failed: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our side.".to_string(),
                )
            }
        };

        (status, Html(pages::error(status, &detail))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(
            AppError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("nope".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        let io_failure = StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk gone"));
        assert_eq!(
            AppError::from(io_failure).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
