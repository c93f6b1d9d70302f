//! # Credo
//!
//! `credo` is a small username/password authentication service. It exposes
//! `POST /login` and `POST /register` over HTTP, serves a single-page login form
//! at `/`, and keeps credentials in a [`store::CredentialStore`].
//!
//! ## Credentials
//!
//! Identifiers are 4-30 ASCII alphanumerics, unique across the store. Passwords
//! are hashed with bcrypt (cost 12 by default) and only the hash is persisted.
//!
//! ## Storage
//!
//! - **Flat file** (default): a `username,password` header followed by one
//!   `identifier,hash` line per account. Mutations rewrite the file atomically
//!   under a lock.
//! - **`SQLite`**: selected with a `sqlite:` DSN; the primary key enforces
//!   identifier uniqueness.

pub mod cli;
pub mod credo;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
