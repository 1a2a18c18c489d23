use crate::{
    api::{self, AppConfig, AppState},
    cli::telemetry,
};
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub data_dir: PathBuf,
    pub secret_key: SecretString,
    pub session_ttl_seconds: i64,
    pub cookie_secure: bool,
    pub admin_password: SecretString,
}

impl Args {
    fn config(self) -> (u16, AppConfig) {
        let config = AppConfig::new(self.data_dir)
            .with_secret_key(self.secret_key)
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_cookie_secure(self.cookie_secure)
            .with_admin_password(self.admin_password);
        (self.port, config)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the credential store cannot be prepared or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let (port, config) = args.config();

    debug!("App config: {:?}", config);

    let state = AppState::initialize(config).await?;

    let result = api::new(port, state).await;

    telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_config() {
        let args = Args {
            port: 9000,
            data_dir: PathBuf::from("/tmp/studyhall"),
            secret_key: SecretString::from("k"),
            session_ttl_seconds: 60,
            cookie_secure: true,
            admin_password: SecretString::from("p"),
        };

        let (port, config) = args.config();
        assert_eq!(port, 9000);
        assert_eq!(config.data_dir(), &PathBuf::from("/tmp/studyhall"));
        assert_eq!(config.session_ttl_seconds(), 60);
        assert!(config.cookie_secure());
    }
}
