//! Credential and session tuning arguments.

use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_SALT_BYTES: &str = "hash-salt-bytes";
pub const ARG_SESSION_TTL: &str = "session-ttl";

/// Parsed authentication options, fixed for the process lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub hash_iterations: u32,
    pub hash_salt_bytes: usize,
    pub session_ttl_seconds: u64,
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("PBKDF2 iteration count used when generating new password hashes")
                .default_value("210000")
                .env("TABULO_HASH_ITERATIONS")
                .value_parser(clap::value_parser!(u32).range(1000..)),
        )
        .arg(
            Arg::new(ARG_HASH_SALT_BYTES)
                .long(ARG_HASH_SALT_BYTES)
                .help("Salt size in bytes used when generating new password hashes")
                .default_value("32")
                .env("TABULO_HASH_SALT_BYTES")
                .value_parser(clap::value_parser!(u16).range(8..=48)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Idle session lifetime in seconds")
                .default_value("43200")
                .env("TABULO_SESSION_TTL")
                .value_parser(clap::value_parser!(u64).range(60..)),
        )
}

impl Options {
    /// Extract options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let hash_iterations = matches
            .get_one::<u32>(ARG_HASH_ITERATIONS)
            .copied()
            .context("missing --hash-iterations")?;
        let hash_salt_bytes = matches
            .get_one::<u16>(ARG_HASH_SALT_BYTES)
            .copied()
            .context("missing --hash-salt-bytes")?;
        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL)
            .copied()
            .context("missing --session-ttl")?;

        Ok(Self {
            hash_iterations,
            hash_salt_bytes: usize::from(hash_salt_bytes),
            session_ttl_seconds,
        })
    }
}
