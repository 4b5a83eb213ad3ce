//! Random token helpers shared by session and CSRF handling.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};

const TOKEN_BYTES: usize = 32;

/// Create a new opaque session identifier.
pub(crate) fn generate_session_id() -> Result<String> {
    random_token().context("failed to generate session id")
}

/// Create a new CSRF token for a session.
pub(crate) fn generate_csrf_token() -> Result<String> {
    random_token().context("failed to generate csrf token")
}

fn random_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to read from the system RNG")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
