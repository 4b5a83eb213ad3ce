//! # Tabulo (shared message board)
//!
//! `tabulo` is a small message board: authenticated users post short messages
//! to a shared board, and an administrator manages user accounts.
//!
//! ## Authentication & Sessions
//!
//! Login binds a [`auth::Principal`] (username plus granted roles) to an
//! in-process session identified by an opaque cookie. Passwords are stored as
//! self-describing PBKDF2-HMAC-SHA512 PHC strings; verification always uses
//! the parameters embedded in the stored hash, so process defaults can rotate
//! without invalidating old credentials.
//!
//! ## Authorization
//!
//! Access is controlled by the declared roles (`ADMIN`, `USER`). Every route
//! group is wrapped by one guard layer that resolves the session, records an
//! audit entry, checks the role requirement, and verifies the CSRF token on
//! state-changing requests.
//!
//! A denied request that *did* carry a principal terminates the session and
//! answers `303 See Other` to the original URL with `?error=forbidden`; the
//! client has to authenticate again. Denied anonymous requests are redirected
//! to the login page.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
