//! CSRF token lifecycle.
//!
//! # Responsibilities
//! - Issue one high-entropy token per session key
//! - Verify supplied tokens in constant time
//! - Rotate the token on every successful verification
//! - Expire tokens past their TTL
//!
//! # Design Decisions
//! - At most one live token per key: issuing overwrites the prior token
//! - Comparison goes through `subtle::ConstantTimeEq`; only the token
//!   length is allowed to short-circuit
//! - An expired record is deleted during the verify that observes it, so a
//!   later verify for the same key reports `NoStoredToken`

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::admission::StoreError;

/// Token size before hex encoding.
const TOKEN_BYTES: usize = 32;

/// Outcome of a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Supplied token matched and was unexpired. Carries the replacement
    /// token for the caller's next round-trip.
    Valid { rotated: String },

    /// Caller supplied no token.
    Missing,

    /// Nothing on record for this key (never issued, or swept away).
    NoStoredToken,

    /// Supplied token does not equal the stored one.
    Mismatch,

    /// Stored token aged past the TTL; the record has been deleted.
    Expired,
}

struct StoredToken {
    token: String,
    issued_at: Instant,
}

/// Per-session rotating token store.
pub struct CsrfStore {
    ttl: Duration,
    tokens: Mutex<HashMap<String, StoredToken>>,
}

impl CsrfStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh token for `session_key`, replacing any prior one.
    pub fn issue(&self, session_key: &str, now: Instant) -> Result<String, StoreError> {
        let token = generate_token();
        let mut tokens = self.tokens.lock().map_err(|_| StoreError)?;
        tokens.insert(
            session_key.to_string(),
            StoredToken {
                token: token.clone(),
                issued_at: now,
            },
        );
        Ok(token)
    }

    /// Verify `supplied` against the stored token for `session_key`.
    ///
    /// Runs as a single critical section: expiry deletion and rotation
    /// happen under the same lock acquisition as the lookup.
    pub fn verify(
        &self,
        session_key: &str,
        supplied: Option<&str>,
        now: Instant,
    ) -> Result<Verification, StoreError> {
        let Some(supplied) = supplied else {
            return Ok(Verification::Missing);
        };

        let mut tokens = self.tokens.lock().map_err(|_| StoreError)?;
        let (issued_at, matched) = match tokens.get(session_key) {
            Some(stored) => (stored.issued_at, tokens_match(supplied, &stored.token)),
            None => return Ok(Verification::NoStoredToken),
        };

        if now.duration_since(issued_at) >= self.ttl {
            tokens.remove(session_key);
            return Ok(Verification::Expired);
        }

        if !matched {
            return Ok(Verification::Mismatch);
        }

        // Rotation on every successful use: the old token is dead from here
        let rotated = generate_token();
        tokens.insert(
            session_key.to_string(),
            StoredToken {
                token: rotated.clone(),
                issued_at: now,
            },
        );
        Ok(Verification::Valid { rotated })
    }

    /// Drop records older than the TTL. Returns the number evicted.
    pub fn sweep(&self, now: Instant) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.lock().map_err(|_| StoreError)?;
        let before = tokens.len();
        tokens.retain(|_, stored| now.duration_since(stored.issued_at) < self.ttl);
        Ok(before - tokens.len())
    }

    /// Number of keys currently holding a token.
    pub fn tracked_keys(&self) -> Result<usize, StoreError> {
        Ok(self.tokens.lock().map_err(|_| StoreError)?.len())
    }
}

/// Constant-time token equality. The length check leaks only the length,
/// which the caller already knows.
fn tokens_match(supplied: &str, stored: &str) -> bool {
    let supplied = supplied.as_bytes();
    let stored = stored.as_bytes();
    supplied.len() == stored.len() && bool::from(supplied.ct_eq(stored))
}

fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}
