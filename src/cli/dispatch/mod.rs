//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the server with its full configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        hash_iterations: auth_opts.hash_iterations,
        hash_salt_bytes: auth_opts.hash_salt_bytes,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_action_from_defaults() -> Result<()> {
        temp_env::with_vars(
            [
                ("TABULO_PORT", None::<&str>),
                ("TABULO_DSN", Some("postgres://user@localhost:5432/tabulo")),
                ("TABULO_HASH_ITERATIONS", None::<&str>),
                ("TABULO_SESSION_TTL", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["tabulo"]);
                let action = handler(&matches)?;
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/tabulo");
                assert_eq!(args.hash_iterations, 210_000);
                assert_eq!(args.hash_salt_bytes, 32);
                assert_eq!(args.session_ttl_seconds, 43_200);
                Ok(())
            },
        )
    }
}
