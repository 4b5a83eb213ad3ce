//! Slow password hashing with PBKDF2-HMAC-SHA512.
//!
//! Encoded hashes are PHC strings (`$pbkdf2-sha512$i=210000$<salt>$<digest>`)
//! embedding algorithm, salt, and iteration count. Verification reads the
//! parameters out of the stored hash, so rotating the process defaults never
//! invalidates existing credentials; generation always uses the current
//! defaults.

use anyhow::{Result, anyhow};
use pbkdf2::{
    Algorithm, Params, Pbkdf2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
};
use rand::{RngCore, rngs::OsRng};

const PBKDF2_OUTPUT_BYTES: usize = 64;

/// Process-wide hash generation parameters, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParameters {
    iterations: u32,
    salt_size_bytes: usize,
}

impl HashParameters {
    pub const DEFAULT_ITERATIONS: u32 = 210_000;
    pub const DEFAULT_SALT_SIZE_BYTES: usize = 32;

    /// Build parameters for hash generation.
    ///
    /// # Errors
    /// Returns an error for an iteration count below 1000 or a salt that the
    /// PHC salt encoding cannot carry.
    pub fn new(iterations: u32, salt_size_bytes: usize) -> Result<Self> {
        if iterations < 1000 {
            return Err(anyhow!("iteration count too low: {iterations}"));
        }
        // Salt::MAX_LENGTH is 64 base64 characters, 48 raw bytes.
        if salt_size_bytes < 8 || salt_size_bytes > 48 {
            return Err(anyhow!("salt size out of range: {salt_size_bytes}"));
        }
        Ok(Self {
            iterations,
            salt_size_bytes,
        })
    }

    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    #[must_use]
    pub const fn salt_size_bytes(&self) -> usize {
        self.salt_size_bytes
    }
}

impl Default for HashParameters {
    fn default() -> Self {
        Self {
            iterations: Self::DEFAULT_ITERATIONS,
            salt_size_bytes: Self::DEFAULT_SALT_SIZE_BYTES,
        }
    }
}

/// Derive a fresh salted hash for `plaintext` with the given parameters.
///
/// # Errors
/// Returns an error if randomness or the key derivation itself fails; input
/// content never causes an error.
pub fn hash_password(plaintext: &str, params: &HashParameters) -> Result<String> {
    let mut salt_bytes = vec![0u8; params.salt_size_bytes];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|err| anyhow!("failed to generate salt: {err}"))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| anyhow!("failed to encode salt: {err}"))?;

    let hash = Pbkdf2
        .hash_password_customized(
            plaintext.as_bytes(),
            Some(Algorithm::Pbkdf2Sha512.ident()),
            None,
            Params {
                rounds: params.iterations,
                output_length: PBKDF2_OUTPUT_BYTES,
            },
            &salt,
        )
        .map_err(|err| anyhow!("failed to derive password hash: {err}"))?;

    Ok(hash.to_string())
}

/// Verify `plaintext` against a stored encoded hash.
///
/// Recomputes the digest with the salt and iteration count embedded in
/// `encoded` and compares in constant time. Malformed input verifies as
/// `false`; the caller never learns which part of the encoding was wrong.
#[must_use]
pub fn verify_password(plaintext: &str, encoded: &str) -> bool {
    match PasswordHash::new(encoded) {
        Ok(parsed) => Pbkdf2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keep test hashing fast; production defaults are exercised by value only.
    fn test_params() -> HashParameters {
        HashParameters::new(1000, 16).expect("valid test parameters")
    }

    #[test]
    fn round_trip_verifies() -> Result<()> {
        let encoded = hash_password("correct horse battery staple", &test_params())?;
        assert!(verify_password("correct horse battery staple", &encoded));
        Ok(())
    }

    #[test]
    fn wrong_password_fails() -> Result<()> {
        let encoded = hash_password("correct horse battery staple", &test_params())?;
        assert!(!verify_password("incorrect horse battery staple", &encoded));
        Ok(())
    }

    #[test]
    fn encoding_is_self_describing() -> Result<()> {
        let encoded = hash_password("secret", &test_params())?;
        assert!(encoded.starts_with("$pbkdf2-sha512$i=1000$"));
        Ok(())
    }

    #[test]
    fn same_password_gets_fresh_salt() -> Result<()> {
        let params = test_params();
        let first = hash_password("secret", &params)?;
        let second = hash_password("secret", &params)?;
        assert_ne!(first, second);
        assert!(verify_password("secret", &first));
        assert!(verify_password("secret", &second));
        Ok(())
    }

    #[test]
    fn verification_uses_embedded_parameters() -> Result<()> {
        // A hash generated with old parameters must keep verifying after the
        // process defaults change.
        let old = HashParameters::new(1000, 16)?;
        let encoded = hash_password("secret", &old)?;
        let current = HashParameters::new(2000, 32)?;
        assert_ne!(old, current);
        assert!(verify_password("secret", &encoded));
        Ok(())
    }

    #[test]
    fn malformed_encodings_verify_false() {
        for encoded in [
            "",
            "not-a-phc-string",
            "$pbkdf2-sha512$",
            "$pbkdf2-sha512$i=1000$short",
            "$unknown$i=1000$c2FsdA$ZGlnZXN0",
        ] {
            assert!(!verify_password("secret", encoded), "accepted: {encoded}");
        }
    }

    #[test]
    fn parameter_bounds_are_enforced() {
        assert!(HashParameters::new(10, 32).is_err());
        assert!(HashParameters::new(210_000, 4).is_err());
        assert!(HashParameters::new(210_000, 64).is_err());
        assert!(HashParameters::new(210_000, 32).is_ok());
    }

    #[test]
    fn defaults_match_documented_values() {
        let params = HashParameters::default();
        assert_eq!(params.iterations(), 210_000);
        assert_eq!(params.salt_size_bytes(), 32);
    }
}
