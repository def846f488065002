// Signet — Credential Generator
//
// Produces the per-user authentication material stored by the directory.
// Identifiers and tokens are HMAC-SHA256 tags over the principal name under a
// fresh random key, so two users (or two generations for one user) never
// collide. Password hashes use Argon2id with a random salt.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::CredentialError;

type HmacSha256 = Hmac<Sha256>;

/// Random HMAC key length in bytes (256-bit entropy).
const GENERATOR_KEY_LEN: usize = 32;

/// Random Argon2id salt length in bytes.
const PASSWORD_SALT_LEN: usize = 16;

/// Derived password hash length in bytes.
const PASSWORD_HASH_LEN: usize = 32;

// Argon2id parameters: m=19456 (19 MiB), t=2, p=1.
const ARGON2_M_COST: u32 = 19456;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Abstraction over credential generation, injectable for tests.
pub trait CredentialGenerator {
    /// Public query identifier for a user, unique across the directory.
    fn query_id(&self, name: &str) -> Result<String, CredentialError>;

    /// Secret signing key paired with the query id.
    fn secret_key(&self, name: &str) -> Result<String, CredentialError>;

    /// Opaque session token; also used as the confirmation code for the
    /// best-effort registration record.
    fn session_token(&self, name: &str) -> Result<String, CredentialError>;

    /// Argon2id hash of a freshly provisioned password.
    fn hashed_password(&self, name: &str) -> Result<String, CredentialError>;
}

/// Default generator backed by HMAC-SHA256 and Argon2id.
pub struct HmacCredentialGenerator;

impl HmacCredentialGenerator {
    pub fn new() -> Self {
        Self
    }

    /// HMAC tag over `name` under a fresh random key, URL-safe base64 encoded.
    fn keyed_tag(name: &str) -> Result<String, CredentialError> {
        let mut key = [0u8; GENERATOR_KEY_LEN];
        rand::rng().fill_bytes(&mut key);
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| CredentialError::Keyed(e.to_string()))?;
        mac.update(name.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

impl Default for HmacCredentialGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialGenerator for HmacCredentialGenerator {
    fn query_id(&self, name: &str) -> Result<String, CredentialError> {
        Self::keyed_tag(name)
    }

    fn secret_key(&self, name: &str) -> Result<String, CredentialError> {
        Self::keyed_tag(name)
    }

    fn session_token(&self, name: &str) -> Result<String, CredentialError> {
        Self::keyed_tag(name)
    }

    fn hashed_password(&self, name: &str) -> Result<String, CredentialError> {
        let mut salt = [0u8; PASSWORD_SALT_LEN];
        rand::rng().fill_bytes(&mut salt);

        let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(PASSWORD_HASH_LEN))
            .map_err(|e| CredentialError::Hash(format!("invalid Argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hash = [0u8; PASSWORD_HASH_LEN];
        argon2
            .hash_password_into(name.as_bytes(), &salt, &mut hash)
            .map_err(|e| CredentialError::Hash(format!("Argon2id hash failed: {e}")))?;

        Ok(format!(
            "argon2id:{}:{}",
            URL_SAFE_NO_PAD.encode(salt),
            URL_SAFE_NO_PAD.encode(hash)
        ))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
