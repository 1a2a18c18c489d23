//! Flat-file credential store.
//!
//! `users.csv` holds one `username,password_hash` row per account, in
//! registration order. The file is append-only: rows are never rewritten or
//! removed. An in-memory index keyed by username answers lookups, and every
//! write goes through the same lock so the existence check and the append of a
//! registration happen as one step. File reads and writes run on the blocking
//! thread pool while that lock is held.

pub mod password;

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

pub const USERS_FILE: &str = "users.csv";

const HEADER: [&str; 2] = ["username", "password_hash"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("credential file csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("credential file task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    // username -> first row carrying that username
    index: Mutex<HashMap<String, User>>,
}

impl CredentialStore {
    /// Open (or prepare) the store under `data_dir`, creating the directory when
    /// needed and indexing whatever rows the file already holds.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the file cannot be parsed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(USERS_FILE);

        let mut index = HashMap::new();
        for user in read_users(&path)? {
            index.entry(user.username.clone()).or_insert(user);
        }

        debug!("indexed {} users from {}", index.len(), path.display());

        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row of the backing file, in file order. Empty if the file is absent.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        // Hold the lock so a concurrent append is never read half-written.
        let _guard = self.index.lock().await;
        let path = self.path.clone();
        blocking(move || read_users(&path)).await
    }

    /// Raw bytes of the backing file, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub async fn export(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let _guard = self.index.lock().await;
        let path = self.path.clone();
        blocking(move || match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        })
        .await
    }

    /// First user registered under `username` (case-sensitive).
    pub async fn find_user(&self, username: &str) -> Option<User> {
        self.index.lock().await.get(username).cloned()
    }

    /// Append one row, writing the header first if the file is new.
    ///
    /// Duplicates are not checked here; see [`CredentialStore::insert_if_absent`].
    ///
    /// # Errors
    /// Returns an error if the row cannot be written.
    #[instrument(skip(self, password_hash))]
    pub async fn append_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let mut index = self.index.lock().await;
        self.append_blocking(username, password_hash).await?;
        index
            .entry(username.to_string())
            .or_insert_with(|| User {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            });
        Ok(())
    }

    /// Append a row only if no user with `username` exists yet.
    ///
    /// Returns `false` (and writes nothing) when the name is taken.
    ///
    /// # Errors
    /// Returns an error if the row cannot be written.
    #[instrument(skip(self, password_hash))]
    pub async fn insert_if_absent(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut index = self.index.lock().await;
        if index.contains_key(username) {
            debug!("username already taken");
            return Ok(false);
        }
        self.append_blocking(username, password_hash).await?;
        index.insert(
            username.to_string(),
            User {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(true)
    }

    async fn append_blocking(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let path = self.path.clone();
        let username = username.to_string();
        let password_hash = password_hash.to_string();
        blocking(move || append_row(&path, &username, &password_hash)).await
    }
}

async fn blocking<T, F>(task: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

fn read_users(path: &Path) -> Result<Vec<User>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut reader = csv::Reader::from_reader(file);
    let users = reader.deserialize().collect::<Result<Vec<User>, _>>()?;
    Ok(users)
}

fn append_row(path: &Path, username: &str, password_hash: &str) -> Result<(), StoreError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let is_new = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer.write_record(HEADER)?;
    }
    writer.write_record([username, password_hash])?;
    writer.flush()?;
    Ok(())
}
