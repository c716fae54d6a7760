//! Short-lived phase tokens
//!
//! Each export phase call must carry a token scoped to that phase. Tokens
//! are HMAC-SHA256 over the caller identity, scope, expiry and a random
//! nonce, so they cannot be replayed by another operator or for another
//! scope. Download tokens are single-use: the nonce is recorded when the
//! token is consumed.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use rand::RngCore;
use sha2::Sha256;
use tracing::{debug, warn};

use super::Identity;
use crate::utils::error::{EngineError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Scope for start and batch calls
pub const SCOPE_EXPORT: &str = "export";
/// Scope for the download call; single-use
pub const SCOPE_DOWNLOAD: &str = "download";

/// Issues and checks phase tokens
pub struct TokenValidator {
    secret: Vec<u8>,
    ttl: Duration,
    // nonce -> expiry, for single-use consumption
    used: Mutex<HashMap<String, i64>>,
}

impl TokenValidator {
    /// Create a validator with the shared secret and token lifetime.
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            used: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a token bound to an identity and scope.
    pub fn issue(&self, identity: &Identity, scope: &str) -> String {
        let exp = Utc::now().timestamp() + self.ttl.as_secs() as i64;
        let mut nonce_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = hex::encode(nonce_bytes);

        let mac = self.mac(&identity.id, scope, exp, &nonce);
        debug!(operator = %identity.id, scope, exp, "phase token issued");
        format!("{}.{}.{}.{}", scope, exp, nonce, mac)
    }

    /// Check a token against an identity and expected scope.
    pub fn validate(&self, token: &str, identity: &Identity, scope: &str) -> Result<()> {
        let (token_scope, exp, nonce, mac) = Self::parse(token)?;
        if token_scope != scope {
            warn!(operator = %identity.id, token_scope, expected = scope, "token scope mismatch");
            return Err(EngineError::unauthorized("token not valid for this call"));
        }
        if exp < Utc::now().timestamp() {
            return Err(EngineError::unauthorized("token expired"));
        }

        let mut verifier = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| EngineError::unauthorized("invalid token"))?;
        verifier.update(Self::payload(&identity.id, scope, exp, nonce).as_bytes());
        let mac_bytes =
            hex::decode(mac).map_err(|_| EngineError::unauthorized("invalid token"))?;
        verifier
            .verify_slice(&mac_bytes)
            .map_err(|_| EngineError::unauthorized("invalid token"))?;
        Ok(())
    }

    /// Validate and burn a single-use token. A second consume of the same
    /// token fails even while the token is otherwise still valid.
    pub fn consume(&self, token: &str, identity: &Identity, scope: &str) -> Result<()> {
        self.validate(token, identity, scope)?;
        let (_, exp, nonce, _) = Self::parse(token)?;

        let now = Utc::now().timestamp();
        let mut used = self.used.lock();
        used.retain(|_, &mut e| e >= now);
        if used.insert(nonce.to_string(), exp).is_some() {
            warn!(operator = %identity.id, scope, "single-use token replayed");
            return Err(EngineError::unauthorized("token already used"));
        }
        Ok(())
    }

    fn parse(token: &str) -> Result<(&str, i64, &str, &str)> {
        let mut parts = token.splitn(4, '.');
        let (scope, exp, nonce, mac) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(s), Some(e), Some(n), Some(m)) => (s, e, n, m),
            _ => return Err(EngineError::unauthorized("malformed token")),
        };
        let exp: i64 = exp
            .parse()
            .map_err(|_| EngineError::unauthorized("malformed token"))?;
        Ok((scope, exp, nonce, mac))
    }

    fn payload(identity_id: &str, scope: &str, exp: i64, nonce: &str) -> String {
        format!("{}.{}.{}.{}", identity_id, scope, exp, nonce)
    }

    fn mac(&self, identity_id: &str, scope: &str, exp: i64, nonce: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts any key length");
        mac.update(Self::payload(identity_id, scope, exp, nonce).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            name: id.to_string(),
        }
    }

    fn validator() -> TokenValidator {
        TokenValidator::new(b"test-secret".to_vec(), Duration::from_secs(300))
    }

    #[test]
    fn test_issue_and_validate() {
        let v = validator();
        let op = identity("op-1");
        let token = v.issue(&op, SCOPE_EXPORT);
        v.validate(&token, &op, SCOPE_EXPORT).unwrap();
    }

    #[test]
    fn test_wrong_scope_rejected() {
        let v = validator();
        let op = identity("op-1");
        let token = v.issue(&op, SCOPE_EXPORT);
        let err = v.validate(&token, &op, SCOPE_DOWNLOAD).unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }

    #[test]
    fn test_other_identity_rejected() {
        let v = validator();
        let token = v.issue(&identity("op-1"), SCOPE_EXPORT);
        let err = v
            .validate(&token, &identity("op-2"), SCOPE_EXPORT)
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let v = TokenValidator::new(b"test-secret".to_vec(), Duration::ZERO);
        let op = identity("op-1");
        let token = v.issue(&op, SCOPE_EXPORT);
        // A zero-TTL token expires as soon as the clock ticks over.
        std::thread::sleep(Duration::from_millis(1100));
        let err = v.validate(&token, &op, SCOPE_EXPORT).unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let v = validator();
        let op = identity("op-1");
        let token = v.issue(&op, SCOPE_EXPORT);
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('0');
        assert!(v.validate(&tampered, &op, SCOPE_EXPORT).is_err());
    }

    #[test]
    fn test_consume_is_single_use() {
        let v = validator();
        let op = identity("op-1");
        let token = v.issue(&op, SCOPE_DOWNLOAD);

        v.consume(&token, &op, SCOPE_DOWNLOAD).unwrap();
        let err = v.consume(&token, &op, SCOPE_DOWNLOAD).unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }
}
