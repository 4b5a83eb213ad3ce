//! Username/password authentication against the credential store.

use anyhow::anyhow;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::error::AuthError;
use super::hash::{self, HashParameters};
use super::principal::{Principal, Role};

/// Stored credential data for one username: the encoded password hash and
/// every role granted to the name, aggregated from the per-role rows.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
}

/// Read-only credential lookup contract.
///
/// Implemented by the user store; the core never writes through this trait.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn lookup(&self, username: &str) -> anyhow::Result<Option<CredentialRecord>>;
}

/// Authenticates username/password pairs into principals.
pub struct IdentityVerifier {
    store: Arc<dyn CredentialStore>,
    decoy_hash: String,
}

impl IdentityVerifier {
    /// Build a verifier over the given store.
    ///
    /// # Errors
    /// Returns an error if the decoy hash cannot be generated.
    pub fn new(store: Arc<dyn CredentialStore>, params: &HashParameters) -> anyhow::Result<Self> {
        // The decoy keeps unknown-username lookups on the same code path as a
        // present-but-wrong password, so neither the result nor the timing
        // reveals whether a name exists.
        let decoy_hash = hash::hash_password("tabulo-decoy-credential", params)?;
        Ok(Self { store, decoy_hash })
    }

    /// Authenticate a username/password pair.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown user or a wrong password, without
    /// distinguishing the two; `Store` when the credential store cannot be
    /// consulted.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError> {
        let record = self
            .store
            .lookup(username)
            .await
            .map_err(AuthError::Store)?;

        match record {
            Some(record) => {
                if verify_blocking(password.clone(), record.password_hash).await? {
                    Ok(Principal::new(username, record.roles))
                } else {
                    debug!("password verification failed");
                    Err(AuthError::InvalidCredentials)
                }
            }
            None => {
                let _ = verify_blocking(password.clone(), self.decoy_hash.clone()).await?;
                debug!("credential lookup found no rows");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Run the slow key derivation off the async worker threads so a ~100ms hash
/// never stalls unrelated requests.
async fn verify_blocking(password: SecretString, encoded: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || hash::verify_password(password.expose_secret(), &encoded))
        .await
        .map_err(|err| AuthError::Store(anyhow!("verification task failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore {
        records: HashMap<String, CredentialRecord>,
    }

    #[async_trait]
    impl CredentialStore for MapStore {
        async fn lookup(&self, username: &str) -> anyhow::Result<Option<CredentialRecord>> {
            Ok(self.records.get(username).cloned())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn lookup(&self, _username: &str) -> anyhow::Result<Option<CredentialRecord>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn test_params() -> HashParameters {
        HashParameters::new(1000, 16).expect("valid test parameters")
    }

    fn store_with_bob() -> anyhow::Result<Arc<MapStore>> {
        let params = test_params();
        let mut records = HashMap::new();
        records.insert(
            "bob".to_string(),
            CredentialRecord {
                password_hash: hash::hash_password("correct-password", &params)?,
                roles: BTreeSet::from([Role::User]),
            },
        );
        Ok(Arc::new(MapStore { records }))
    }

    #[tokio::test]
    async fn correct_password_yields_principal() -> anyhow::Result<()> {
        let verifier = IdentityVerifier::new(store_with_bob()?, &test_params())?;
        let principal = verifier
            .authenticate("bob", &SecretString::from("correct-password".to_string()))
            .await?;
        assert_eq!(principal.username(), "bob");
        assert_eq!(principal.roles(), &BTreeSet::from([Role::User]));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() -> anyhow::Result<()> {
        let verifier = IdentityVerifier::new(store_with_bob()?, &test_params())?;
        let result = verifier
            .authenticate("bob", &SecretString::from("wrong-password".to_string()))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_is_indistinguishable_from_wrong_password() -> anyhow::Result<()> {
        let verifier = IdentityVerifier::new(store_with_bob()?, &test_params())?;
        let password = SecretString::from("anything".to_string());

        let unknown = verifier.authenticate("mallory", &password).await;
        let wrong = verifier.authenticate("bob", &password).await;

        // Same variant, same message: no username enumeration through errors.
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn roles_are_aggregated_into_the_principal() -> anyhow::Result<()> {
        let params = test_params();
        let mut records = HashMap::new();
        records.insert(
            "carol".to_string(),
            CredentialRecord {
                password_hash: hash::hash_password("pw-carol-123", &params)?,
                roles: BTreeSet::from([Role::Admin, Role::User]),
            },
        );
        let verifier = IdentityVerifier::new(Arc::new(MapStore { records }), &params)?;
        let principal = verifier
            .authenticate("carol", &SecretString::from("pw-carol-123".to_string()))
            .await?;
        assert!(principal.has_role(Role::Admin));
        assert!(principal.has_role(Role::User));
        Ok(())
    }

    #[tokio::test]
    async fn store_outage_is_not_invalid_credentials() -> anyhow::Result<()> {
        let verifier = IdentityVerifier::new(Arc::new(FailingStore), &test_params())?;
        let result = verifier
            .authenticate("bob", &SecretString::from("correct-password".to_string()))
            .await;
        assert!(matches!(result, Err(AuthError::Store(_))));
        Ok(())
    }
}
