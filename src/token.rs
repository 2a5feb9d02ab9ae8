use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::credential::AdminKey;
use crate::error::{AdminError, Result};

/// Token lifetime in seconds
pub const TOKEN_TTL_SECS: i64 = 300;

/// A cached token is re-derived once it is this close to expiry
pub const REFRESH_MARGIN_SECS: i64 = 30;

/// Audience claim expected by the admin API
pub const TOKEN_AUDIENCE: &str = "/admin/";

/// Source of the current time in epoch seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now: i64) -> Self {
        ManualClock(AtomicI64::new(now))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// JWT header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
    pub kid: String,
}

/// JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

/// Token is a signed admin API credential with its expiry.
/// It is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Compact `header.payload.signature` string
    pub value: String,
    /// Expiry in epoch seconds
    pub expires_at: i64,
}

impl Token {
    /// Derive a new token for the given key, issued at `now`
    pub fn derive(key: &AdminKey, now: i64) -> Result<Self> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
            kid: key.key_id.clone(),
        };
        let claims = Claims {
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            aud: TOKEN_AUDIENCE.to_string(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let message = format!("{}.{}", header_b64, claims_b64);
        let signature = key.sign(message.as_bytes())?;

        Ok(Token {
            value: format!("{}.{}", message, signature),
            expires_at: claims.exp,
        })
    }

    /// Rebuild a token from its compact form, taking the expiry from its claims.
    /// The signature is not checked.
    pub fn from_compact(value: &str) -> Result<Self> {
        if value.split('.').count() != 3 {
            return Err(AdminError::InvalidInput(
                "token must have three segments".to_string(),
            ));
        }
        let claims: Claims = decode_segment(value, 1)?;
        Ok(Token {
            value: value.to_string(),
            expires_at: claims.exp,
        })
    }

    /// Check whether the token can still be sent at `now`
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at - REFRESH_MARGIN_SECS
    }

    /// Decode the header segment
    pub fn header(&self) -> Result<Header> {
        decode_segment(&self.value, 0)
    }

    /// Decode the payload segment
    pub fn claims(&self) -> Result<Claims> {
        decode_segment(&self.value, 1)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(token: &str, index: usize) -> Result<T> {
    let segment = token.split('.').nth(index).unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        AdminError::InvalidInput(format!("malformed token segment: {}", e))
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// In-memory holder for the current token.
///
/// Two callers racing past an expired token may both derive a new one; the
/// later write wins and both tokens are valid.
#[derive(Debug, Default)]
pub struct TokenCache {
    current: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token if it is still fresh at `now`
    pub fn get_fresh(&self, now: i64) -> Option<Token> {
        let guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().filter(|t| t.is_fresh(now)).cloned()
    }

    pub fn store(&self, token: Token) {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token);
    }

    pub fn clear(&self) {
        let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
