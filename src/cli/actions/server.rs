use crate::{
    api,
    auth::hash::HashParameters,
    cli::actions::Action,
};
use anyhow::Result;
use std::time::Duration;

/// Everything the server action needs, assembled by dispatch.
#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub hash_iterations: u32,
    pub hash_salt_bytes: usize,
    pub session_ttl_seconds: u64,
}

/// Handle the server action
///
/// # Errors
/// Returns an error if the server fails to start or stops unexpectedly.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => {
            let hash_params = HashParameters::new(args.hash_iterations, args.hash_salt_bytes)?;
            let session_ttl = Duration::from_secs(args.session_ttl_seconds);

            api::serve(args.port, args.dsn, hash_params, session_ttl).await?;
        }
    }

    Ok(())
}
