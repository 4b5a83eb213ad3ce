//! Persistence: Postgres-backed stores for users and messages.
//!
//! Everything here is plain parameterized-query CRUD; the security core only
//! depends on the narrow trait contracts, never on the pool directly.

pub mod messages;
pub mod users;

/// Postgres unique-violation detection, used to turn a duplicate insert into
/// a typed outcome instead of a generic error.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
