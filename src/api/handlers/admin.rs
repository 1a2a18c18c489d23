//! Admin-only pages. Access is a plain username comparison; there is no role table.

use super::respond;
use crate::{
    api::{error::AppError, pages, state::AppState},
    auth::ADMIN_USERNAME,
    session::Session,
};
use axum::{
    extract::Extension,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

fn require_admin(session: &Session) -> Result<(), AppError> {
    if session.username() == Some(ADMIN_USERNAME) {
        Ok(())
    } else {
        debug!("Rejected non-admin session");
        Err(AppError::Forbidden)
    }
}

#[instrument(skip_all)]
pub async fn dashboard(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
) -> Result<Response, AppError> {
    require_admin(&session)?;

    let users = state.store().list_users().await?;
    let flashes = session.take_flashes();
    respond(
        &state,
        &session,
        Html(pages::admin(&users, session.username(), &flashes)),
    )
}

#[instrument(skip_all)]
pub async fn download(
    Extension(state): Extension<Arc<AppState>>,
    session: Session,
) -> Result<Response, AppError> {
    require_admin(&session)?;

    let Some(contents) = state.store().export().await? else {
        return Err(AppError::NotFound);
    };

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"users.csv\""),
        ],
        contents,
    )
        .into_response())
}
