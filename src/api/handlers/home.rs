use super::{login_gate, respond};
use crate::{
    api::{error::AppError, pages, state::AppState},
    session::Session,
};
use axum::{
    extract::Extension,
    response::{Html, Response},
};
use std::sync::Arc;

// axum handler for the home page
pub async fn index(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
) -> Result<Response, AppError> {
    if let Some(redirect) = login_gate(&session) {
        return Ok(redirect);
    }

    let username = session.username().unwrap_or_default().to_string();
    let flashes = session.take_flashes();
    respond(&state, &session, Html(pages::index(&username, &flashes)))
}
