pub mod admin;
pub mod auth;
pub mod courses;
pub mod health;
pub mod home;

// common functions for the handlers
use super::{error::AppError, state::AppState};
use crate::session::Session;
use axum::{
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};

pub(crate) const LOGIN_PATH: &str = "/login";

/// Attach the (possibly changed) session to a response as a fresh signed cookie.
pub(crate) fn respond(
    state: &AppState,
    session: &Session,
    response: impl IntoResponse,
) -> Result<Response, AppError> {
    let cookie = state.sessions().set_cookie(session)?;
    Ok(([(SET_COOKIE, cookie)], response).into_response())
}

/// Redirect anonymous visitors to the login form; `None` when logged in.
pub(crate) fn login_gate(session: &Session) -> Option<Response> {
    (!session.is_authenticated()).then(|| Redirect::to(LOGIN_PATH).into_response())
}
