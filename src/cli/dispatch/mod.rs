//! Map parsed CLI arguments onto the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{session, ARG_DATA_DIR, ARG_PORT};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let data_dir = matches
        .get_one::<String>(ARG_DATA_DIR)
        .map(PathBuf::from)
        .context("missing required argument: --data-dir")?;

    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        data_dir,
        secret_key: session_opts.secret_key,
        session_ttl_seconds: session_opts.session_ttl_seconds,
        cookie_secure: session_opts.cookie_secure,
        admin_password: session_opts.admin_password,
    }))
}
