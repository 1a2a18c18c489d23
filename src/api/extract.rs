//! Request extractors.

use super::{error::AppError, state::AppState};
use crate::session::Session;
use anyhow::anyhow;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Pull the caller's session out of the signed cookie.
///
/// Handlers that change the session must send it back with
/// [`super::handlers::respond`].
#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app = parts
            .extensions
            .get::<Arc<AppState>>()
            .ok_or_else(|| AppError::Internal(anyhow!("application state is not installed")))?;

        Ok(app.sessions().from_headers(&parts.headers))
    }
}
