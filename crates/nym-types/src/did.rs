use std::fmt;

use multibase::Base;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Decentralized identifier naming an identity on the ledger.
///
/// A `Did` is the base58 encoding of either a 16-byte identifier (the
/// abbreviated form derived from the first half of a verkey) or a full
/// 32-byte key. Anything else is rejected at construction, so a `Did` held
/// anywhere in the system is always well-formed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::InvalidDid {
                did: s.to_string(),
                reason: "empty".into(),
            });
        }
        let bytes = Base::Base58Btc.decode(s).map_err(|e| TypeError::InvalidDid {
            did: s.to_string(),
            reason: TypeError::InvalidBase58(e.to_string()).to_string(),
        })?;
        if bytes.len() != 16 && bytes.len() != 32 {
            return Err(TypeError::InvalidDid {
                did: s.to_string(),
                reason: format!("decodes to {} bytes, expected 16 or 32", bytes.len()),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// Build a DID from raw identifier bytes (16 or 32 of them).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        Self::parse(&Base::Base58Btc.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short identifier (first 8 characters).
    pub fn short_id(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl TryFrom<String> for Did {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl std::str::FromStr for Did {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
