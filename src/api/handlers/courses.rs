//! Course browsing and per-session progress.

use super::{login_gate, respond};
use crate::{
    api::{error::AppError, pages, state::AppState},
    session::{FlashCategory, Session},
};
use axum::{
    extract::{Extension, Form, Path},
    response::{Html, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
pub struct ProgressForm {
    progress: String,
}

pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
) -> Result<Response, AppError> {
    if let Some(redirect) = login_gate(&session) {
        return Ok(redirect);
    }

    let flashes = session.take_flashes();
    respond(
        &state,
        &session,
        Html(pages::courses(state.catalog().courses(), &session, &flashes)),
    )
}

pub async fn detail(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if let Some(redirect) = login_gate(&session) {
        return Ok(redirect);
    }

    let course = state.catalog().lookup(&id).ok_or(AppError::NotFound)?;
    let flashes = session.take_flashes();
    respond(
        &state,
        &session,
        Html(pages::course_detail(course, &session, &flashes)),
    )
}

/// Store the submitted value as-is; nothing clamps it to 0..=100.
#[instrument(skip(state, session))]
pub async fn update_progress(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProgressForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = login_gate(&session) {
        return Ok(redirect);
    }

    let course = state.catalog().lookup(&id).ok_or(AppError::NotFound)?;
    let value = form
        .progress
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest("progress must be an integer".to_string()))?;

    debug!("course {} progress -> {}", course.id, value);
    session.set_progress(course.id, value);
    session.flash(FlashCategory::Success, "Progress updated.");

    let target = format!("/course/{}", course.id);
    respond(&state, &session, Redirect::to(&target))
}
