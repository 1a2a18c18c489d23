//! Registration, login and logout on top of the credential store.

use crate::{
    credentials::{
        password::{hash_password, verify_password},
        CredentialStore,
    },
    session::Session,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const ADMIN_USERNAME: &str = "admin";

/// Password given to the bootstrap admin account unless configured otherwise.
pub const DEFAULT_ADMIN_PASSWORD: &str = "comp2801";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    UsernameExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    InvalidCredentials,
}

#[derive(Debug)]
pub struct AuthService {
    store: Arc<CredentialStore>,
    // verified against when the username is unknown so both failures cost the same
    dummy_hash: String,
}

impl AuthService {
    /// # Errors
    /// Returns an error if the placeholder hash cannot be computed.
    pub fn new(store: Arc<CredentialStore>) -> Result<Self> {
        let dummy_hash = hash_password(env!("CARGO_PKG_NAME"))?;
        Ok(Self { store, dummy_hash })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Create the `admin` account if the store does not have one yet.
    ///
    /// Returns `true` when the account was created.
    ///
    /// # Errors
    /// Returns an error if hashing or writing the row fails.
    pub async fn bootstrap_admin(&self, password: &str) -> Result<bool> {
        if self.store.find_user(ADMIN_USERNAME).await.is_some() {
            debug!("admin account already present");
            return Ok(false);
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let created = self
            .store
            .insert_if_absent(ADMIN_USERNAME, &password_hash)
            .await
            .context("Failed to write admin account")?;
        if created {
            info!("Created bootstrap admin account");
        }
        Ok(created)
    }

    /// Register a new account. The username is trimmed; nothing else is validated.
    ///
    /// # Errors
    /// Returns an error if hashing or writing the row fails.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisterOutcome> {
        let username = username.trim();

        if self.store.find_user(username).await.is_some() {
            return Ok(RegisterOutcome::UsernameExists);
        }

        let password_hash = hash_blocking(password.to_string()).await?;

        // Re-checked under the store lock; a concurrent registration may have won.
        if self.store.insert_if_absent(username, &password_hash).await? {
            info!("Registered new user");
            Ok(RegisterOutcome::Registered)
        } else {
            warn!("Lost registration race for username");
            Ok(RegisterOutcome::UsernameExists)
        }
    }

    /// Check credentials and, on success, mark the session as logged in.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    #[instrument(skip(self, session, password))]
    pub async fn login(&self, session: &mut Session, username: &str, password: &str) -> LoginOutcome {
        let username = username.trim();

        let (stored_hash, known) = match self.store.find_user(username).await {
            Some(user) => (user.password_hash, true),
            None => (self.dummy_hash.clone(), false),
        };

        let verified = verify_blocking(stored_hash, password.to_string()).await;

        if known && verified {
            session.set_username(username);
            debug!("Login successful");
            LoginOutcome::Authenticated
        } else {
            debug!("Invalid credentials");
            LoginOutcome::InvalidCredentials
        }
    }
}

/// Drop everything the session carries, progress included.
pub fn logout(session: &mut Session) {
    session.clear();
}

async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")?
}

async fn verify_blocking(stored_hash: String, password: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&stored_hash, &password))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn service() -> (TempDir, AuthService) {
        let dir = tempdir().unwrap();
        let store = Arc::new(CredentialStore::open(dir.path()).unwrap());
        (dir, AuthService::new(store).unwrap())
    }

    #[tokio::test]
    async fn registered_hash_verifies_only_the_original_password() {
        let (_dir, auth) = service();
        assert_eq!(
            auth.register("alice", "wonderland").await.unwrap(),
            RegisterOutcome::Registered
        );

        let user = auth.store().find_user("alice").await.unwrap();
        assert!(verify_password(&user.password_hash, "wonderland"));
        assert!(!verify_password(&user.password_hash, "Wonderland"));
        assert!(!verify_password(&user.password_hash, "other"));
    }

    #[tokio::test]
    async fn second_registration_reports_exists_and_keeps_first() {
        let (_dir, auth) = service();
        auth.register("bob", "first").await.unwrap();
        assert_eq!(
            auth.register("bob", "second").await.unwrap(),
            RegisterOutcome::UsernameExists
        );

        let users = auth.store().list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(verify_password(&users[0].password_hash, "first"));
    }

    #[tokio::test]
    async fn register_trims_the_username() {
        let (_dir, auth) = service();
        auth.register("  carol ", "pw").await.unwrap();
        assert!(auth.store().find_user("carol").await.is_some());
        assert_eq!(
            auth.register("carol", "pw").await.unwrap(),
            RegisterOutcome::UsernameExists
        );
    }

    #[tokio::test]
    async fn login_sets_the_session_username() {
        let (_dir, auth) = service();
        auth.register("dave", "pw").await.unwrap();

        let mut session = Session::default();
        assert_eq!(
            auth.login(&mut session, " dave ", "pw").await,
            LoginOutcome::Authenticated
        );
        assert_eq!(session.username(), Some("dave"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let (_dir, auth) = service();
        auth.register("erin", "right").await.unwrap();

        let mut session = Session::default();
        let wrong_password = auth.login(&mut session, "erin", "wrong").await;
        let unknown_user = auth.login(&mut session, "nobody", "right").await;

        assert_eq!(wrong_password, LoginOutcome::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(session.username(), None);
    }

    #[tokio::test]
    async fn bootstrap_admin_runs_once() {
        let (_dir, auth) = service();
        assert!(auth.bootstrap_admin(DEFAULT_ADMIN_PASSWORD).await.unwrap());
        assert!(!auth.bootstrap_admin("ignored").await.unwrap());

        let mut session = Session::default();
        assert_eq!(
            auth.login(&mut session, ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
                .await,
            LoginOutcome::Authenticated
        );
        assert_eq!(auth.store().list_users().await.unwrap().len(), 1);
    }

    #[test]
    fn logout_clears_progress_too() {
        let mut session = Session::default();
        session.set_username("frank");
        session.set_progress(2, 40);
        logout(&mut session);
        assert_eq!(session.username(), None);
        assert_eq!(session.progress(2), 0);
    }
}
