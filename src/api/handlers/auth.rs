//! Register, login and logout forms.

use super::{respond, LOGIN_PATH};
use crate::{
    api::{error::AppError, pages, state::AppState},
    auth::{self, LoginOutcome, RegisterOutcome},
    session::{FlashCategory, Session},
};
use axum::{
    extract::{Extension, Form},
    response::{Html, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Deserialize)]
pub struct CredentialsForm {
    username: String,
    password: String,
}

impl std::fmt::Debug for CredentialsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsForm")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub async fn register_form(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
) -> Result<Response, AppError> {
    let flashes = session.take_flashes();
    respond(
        &state,
        &session,
        Html(pages::register(session.username(), &flashes)),
    )
}

#[instrument(skip(state, session))]
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match state.auth().register(&form.username, &form.password).await? {
        RegisterOutcome::Registered => {
            session.flash(
                FlashCategory::Success,
                "Registration successful! Please log in.",
            );
            respond(&state, &session, Redirect::to(LOGIN_PATH))
        }
        RegisterOutcome::UsernameExists => {
            debug!("Username already exists");
            session.flash(FlashCategory::Warning, "Username already exists");
            let flashes = session.take_flashes();
            respond(
                &state,
                &session,
                Html(pages::register(session.username(), &flashes)),
            )
        }
    }
}

pub async fn login_form(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
) -> Result<Response, AppError> {
    let flashes = session.take_flashes();
    respond(
        &state,
        &session,
        Html(pages::login(session.username(), &flashes)),
    )
}

#[instrument(skip(state, session))]
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match state
        .auth()
        .login(&mut session, &form.username, &form.password)
        .await
    {
        LoginOutcome::Authenticated => {
            session.flash(FlashCategory::Success, "Logged in successfully.");
            respond(&state, &session, Redirect::to("/"))
        }
        LoginOutcome::InvalidCredentials => {
            session.flash(FlashCategory::Danger, "Invalid username or password.");
            let flashes = session.take_flashes();
            respond(
                &state,
                &session,
                Html(pages::login(session.username(), &flashes)),
            )
        }
    }
}

pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    mut session: Session,
) -> Result<Response, AppError> {
    auth::logout(&mut session);
    session.flash(FlashCategory::Info, "You have been logged out.");
    respond(&state, &session, Redirect::to("/"))
}
