//! # Studyhall
//!
//! `studyhall` is a small course portal: visitors register an account, log in,
//! browse a fixed catalog of courses and record how far they got in each one.
//! The `admin` account can list every registered user and download the raw
//! credential file.
//!
//! ## Accounts
//!
//! Accounts live in a flat `users.csv` file (`username,password_hash`). Rows are
//! only ever appended. Passwords are hashed with Argon2id and stored as PHC
//! strings. All writes go through a single lock, so two registrations for the
//! same username cannot both land in the file.
//!
//! ## Sessions
//!
//! There is no server-side session store. Session state (logged-in username,
//! course progress, pending flash messages) is serialized into a cookie and
//! signed with HMAC-SHA256 using the configured secret key. A cookie that fails
//! verification or has expired is treated as an empty session.
//!
//! ## Authorization
//!
//! The admin pages compare the session username against `admin`; everyone else
//! gets `403 Forbidden`. The home page and the course pages redirect anonymous
//! visitors to `/login`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod courses;
pub mod credentials;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
