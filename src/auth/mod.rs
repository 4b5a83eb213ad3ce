//! Authentication, authorization, and credential lifecycle.
//!
//! This module is the security core of the board:
//!
//! - [`hash`] derives and verifies PBKDF2 password hashes; stored hashes are
//!   self-describing PHC strings, so verification always uses the parameters
//!   the hash was generated with.
//! - [`identity`] turns a username/password pair into a [`Principal`] via the
//!   credential store, without ever distinguishing an unknown user from a
//!   wrong password.
//! - [`session`] binds one principal and one CSRF token to an opaque
//!   in-process session identifier.
//! - [`csrf`] issues and validates the per-session anti-forgery token.
//! - [`access`] decides allow/deny per role requirement and builds the
//!   forbidden redirect used by the deny-recovery protocol.
//!
//! ## Deny recovery
//!
//! A denial for an authenticated request signals a stale or forged client
//! state, so the session is terminated and the client is redirected to the
//! original URL with `?error=forbidden` appended. Re-authentication is the
//! only way forward; there is no soft "deny but stay logged in" variant.

pub mod access;
pub mod audit;
pub mod csrf;
pub mod error;
pub mod hash;
pub mod identity;
pub mod principal;
pub mod session;
mod utils;

pub use access::{Decision, RoleRequirement, authorize};
pub use error::{AccessError, AuthError, CsrfError};
pub use principal::{Principal, Role, all_roles};
