use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("invalid DID {did:?}: {reason}")]
    InvalidDid { did: String, reason: String },

    #[error("unknown role code: {0:?}")]
    UnknownRole(String),

    #[error("unsupported nym version: {0}")]
    UnsupportedVersion(u8),
}
