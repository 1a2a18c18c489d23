//! Startup configuration and the shared state handed to every handler.

use crate::{
    auth::{AuthService, DEFAULT_ADMIN_PASSWORD},
    courses::Catalog,
    credentials::CredentialStore,
    session::{SessionCodec, DEFAULT_SESSION_TTL_SECONDS, MAX_SESSION_TTL_SECONDS},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

pub const DEFAULT_SECRET_KEY: &str = "dev";

const DEFAULT_DATA_DIR: &str = "instance";

#[derive(Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    secret_key: SecretString,
    session_ttl_seconds: i64,
    cookie_secure: bool,
    admin_password: SecretString,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("secret_key", &"***")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .field("admin_password", &"***")
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_DATA_DIR))
    }
}

impl AppConfig {
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            secret_key: SecretString::from(DEFAULT_SECRET_KEY),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
            admin_password: SecretString::from(DEFAULT_ADMIN_PASSWORD),
        }
    }

    #[must_use]
    pub fn with_secret_key(mut self, key: SecretString) -> Self {
        self.secret_key = key;
        self
    }

    /// Capped at [`MAX_SESSION_TTL_SECONDS`].
    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds.min(MAX_SESSION_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_admin_password(mut self, password: SecretString) -> Self {
        self.admin_password = password;
        self
    }

    #[must_use]
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

#[derive(Debug)]
pub struct AppState {
    auth: AuthService,
    catalog: Catalog,
    sessions: SessionCodec,
}

impl AppState {
    /// Open the credential store, make sure the admin account exists and build
    /// the course catalog. Runs once, before the listener is bound.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or the admin row cannot be written.
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        if config.secret_key.expose_secret() == DEFAULT_SECRET_KEY {
            warn!("SECRET_KEY is not set; session cookies are signed with the built-in development key");
        }
        if config.admin_password.expose_secret() == DEFAULT_ADMIN_PASSWORD {
            warn!("Bootstrap admin uses the built-in default password");
        }

        let store = CredentialStore::open(config.data_dir()).with_context(|| {
            format!(
                "Failed to open credential store in {}",
                config.data_dir().display()
            )
        })?;
        info!("Credential store: {}", store.path().display());

        let auth = AuthService::new(Arc::new(store))?;
        auth.bootstrap_admin(config.admin_password.expose_secret())
            .await?;

        let sessions = SessionCodec::new(config.secret_key.clone())
            .with_ttl_seconds(config.session_ttl_seconds)
            .with_secure(config.cookie_secure);

        Ok(Self {
            auth,
            catalog: Catalog::builtin(),
            sessions,
        })
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        self.auth.store()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionCodec {
        &self.sessions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::ADMIN_USERNAME;
    use tempfile::tempdir;

    #[test]
    fn config_debug_hides_secrets() {
        let config = AppConfig::default()
            .with_secret_key(SecretString::from("super-secret"))
            .with_admin_password(SecretString::from("hunter2"));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn session_ttl_is_capped() {
        let config = AppConfig::default().with_session_ttl_seconds(i64::MAX);
        assert_eq!(config.session_ttl_seconds(), MAX_SESSION_TTL_SECONDS);
        assert_eq!(
            AppConfig::default().session_ttl_seconds(),
            DEFAULT_SESSION_TTL_SECONDS
        );
    }

    #[tokio::test]
    async fn initialize_bootstraps_admin_once() {
        let dir = tempdir().unwrap();
        let config = AppConfig::new(dir.path().to_path_buf());

        let state = AppState::initialize(config.clone()).await.unwrap();
        assert!(state.store().find_user(ADMIN_USERNAME).await.is_some());
        drop(state);

        let state = AppState::initialize(config).await.unwrap();
        assert_eq!(state.store().list_users().await.unwrap().len(), 1);
        assert_eq!(state.catalog().courses().len(), 3);
    }
}
