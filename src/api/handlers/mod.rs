//! Route handlers and shared validation helpers.

pub mod health;
pub mod login;
pub mod messages;
pub mod pages;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::csrf::CSRF_FIELD_NAME;

pub const MAX_MESSAGE_CHARS: usize = 140;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 32;

/// Usernames are short word-character identifiers; they double as the
/// credential primary key.
pub fn valid_username(name: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_]{1,30}$").is_ok_and(|re| re.is_match(name))
}

/// Passwords are printable ASCII without spaces; length is checked separately
/// so the two failures surface as distinct validation errors.
pub fn valid_password_pattern(password: &str) -> bool {
    Regex::new(r"^[!-~]+$").is_ok_and(|re| re.is_match(password))
}

pub fn valid_password_length(password: &str) -> bool {
    (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&password.chars().count())
}

/// Messages must not be blank and must fit the board column.
pub fn valid_message(message: &str) -> bool {
    !message.trim().is_empty() && message.chars().count() <= MAX_MESSAGE_CHARS
}

/// Hidden-field contract for the rendering layer: every state-changing form
/// embeds an input with this name and value.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CsrfField {
    pub name: &'static str,
    pub token: String,
}

impl CsrfField {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            name: CSRF_FIELD_NAME,
            token,
        }
    }
}
