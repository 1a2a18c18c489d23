use crate::{
    api::DEFAULT_SECRET_KEY,
    auth::DEFAULT_ADMIN_PASSWORD,
    session::{DEFAULT_SESSION_TTL_SECONDS, MAX_SESSION_TTL_SECONDS},
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_ADMIN_PASSWORD: &str = "admin-password";

#[derive(Debug, Clone)]
pub struct Options {
    pub secret_key: SecretString,
    pub session_ttl_seconds: i64,
    pub cookie_secure: bool,
    pub admin_password: SecretString,
}

impl Options {
    /// Parse session and bootstrap arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session TTL is not within `1..=MAX_SESSION_TTL_SECONDS`.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = |id: &str, default: &str| -> SecretString {
            SecretString::from(
                matches
                    .get_one::<String>(id)
                    .cloned()
                    .unwrap_or_else(|| default.to_string()),
            )
        };

        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        if !(1..=MAX_SESSION_TTL_SECONDS).contains(&session_ttl_seconds) {
            return Err(anyhow::anyhow!(
                "--{ARG_SESSION_TTL_SECONDS} must be between 1 and {MAX_SESSION_TTL_SECONDS}"
            ));
        }

        Ok(Self {
            secret_key: secret(ARG_SECRET_KEY, DEFAULT_SECRET_KEY),
            session_ttl_seconds,
            cookie_secure: matches.get_flag(ARG_COOKIE_SECURE),
            admin_password: secret(ARG_ADMIN_PASSWORD, DEFAULT_ADMIN_PASSWORD),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Key used to sign session cookies (insecure built-in default when unset)")
                .env("SECRET_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds (12 hours when unset, at most 400 days)")
                .env("STUDYHALL_SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("STUDYHALL_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Password for the bootstrap admin account, used only when it does not exist yet")
                .env("STUDYHALL_ADMIN_PASSWORD")
                .hide_env_values(true),
        )
}
