use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AdminError, Result};

type HmacSha256 = Hmac<Sha256>;

/// AdminKey is a Ghost admin API key split into its id and decoded secret.
pub struct AdminKey {
    /// Key identifier, sent as the token `kid`
    pub key_id: String,
    /// Raw secret bytes used as the HMAC key
    secret: Vec<u8>,
}

impl Clone for AdminKey {
    fn clone(&self) -> Self {
        AdminKey {
            key_id: self.key_id.clone(),
            secret: self.secret.clone(),
        }
    }
}

impl AdminKey {
    /// Parse an admin key of the form `id:secret`.
    ///
    /// The input is split on the first `:`. Both parts must be non-empty and
    /// the secret must be an even number of hex digits.
    pub fn parse(raw: &str) -> Result<Self> {
        let (key_id, secret) = raw
            .split_once(':')
            .ok_or(AdminError::InvalidCredentialFormat)?;

        if key_id.is_empty() || secret.is_empty() {
            return Err(AdminError::InvalidCredentialFormat);
        }

        if !secret.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AdminError::InvalidSecretFormat(
                "secret must be in hex format".to_string(),
            ));
        }

        if secret.len() % 2 != 0 {
            return Err(AdminError::InvalidSecretFormat(
                "secret length must be even".to_string(),
            ));
        }

        let secret = hex::decode(secret)?;

        Ok(AdminKey {
            key_id: key_id.to_string(),
            secret,
        })
    }

    /// Sign a message with HMAC-SHA256 and return the base64url signature
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AdminError::InvalidSecretFormat(e.to_string()))?;
        mac.update(message);
        let signature = mac.finalize().into_bytes();

        Ok(URL_SAFE_NO_PAD.encode(signature))
    }

    /// Verify a base64url signature over a message
    pub fn verify(&self, message: &[u8], signature: &str) -> bool {
        let Ok(expected) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return false;
        };
        mac.update(message);
        mac.verify_slice(&expected).is_ok()
    }
}

// Implement Debug manually to avoid exposing the secret
impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminKey")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
