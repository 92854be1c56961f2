//! Account identities.
//!
//! An `AccountId` is an opaque 32-byte account identity. The core never sees
//! keys or signatures: callers are assumed to be authenticated already, and
//! the identity is only compared for equality against the committee.
//!
//! Identities can be written in two forms (config files, replay scripts):
//! - 64 hex characters: taken verbatim as the 32 identity bytes
//! - any other label: derived as SHA-256("custody-member-v1" || label)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain separation tag for label-derived identities.
const LABEL_DOMAIN: &[u8] = b"custody-member-v1";

/// Opaque, unique account identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

/// Identity parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity is empty")]
    Empty,

    #[error("identity hex is invalid: {0}")]
    InvalidHex(String),
}

impl AccountId {
    /// The null identity. Never a valid committee member.
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive an identity from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(LABEL_DOMAIN);
        hasher.update(label.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First four bytes in hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for AccountId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }

        if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            let mut bytes = [0u8; 32];
            hex::decode_to_slice(s, &mut bytes)
                .map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
            return Ok(Self(bytes));
        }

        Ok(Self::from_label(s))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short())
    }
}
