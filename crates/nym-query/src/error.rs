use nym_index::IndexError;
use nym_ledger::LedgerError;
use nym_types::{Did, SeqNo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the query and append paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Ambiguous or malformed request. Raised before any log access.
    #[error("client request invalid: {0}")]
    Validation(String),

    /// The identity has no update at or before the requested bound.
    #[error("nym {dest} not found at {bound}")]
    NotFound { dest: Did, bound: String },

    /// The requested seqNo lies beyond the ledger tail.
    #[error("seqNo {seq_no} exceeds ledger tail {tail}")]
    OutOfRange { seq_no: SeqNo, tail: SeqNo },

    /// A broken ledger invariant. The writer is halted.
    #[error("ledger integrity failure: {0}")]
    Integrity(LedgerError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    #[error("index error: {0}")]
    Index(IndexError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("reply encoding failed: {0}")]
    Encoding(String),
}

impl QueryError {
    /// Stable error code for the reply.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "InvalidClientRequest",
            Self::NotFound { .. } => "NotFound",
            Self::OutOfRange { .. } => "OutOfRange",
            Self::Integrity(_) => "LedgerIntegrity",
            Self::Ledger(_) | Self::Index(_) | Self::Config(_) | Self::Encoding(_) => "Internal",
        }
    }

    /// Structured form handed back to the caller.
    pub fn to_reply(&self) -> ErrorReply {
        let message = match self {
            Self::Validation(reason) => reason.clone(),
            other => other.to_string(),
        };
        ErrorReply {
            code: self.code().to_string(),
            message,
        }
    }
}

impl From<LedgerError> for QueryError {
    fn from(e: LedgerError) -> Self {
        if e.is_integrity() {
            Self::Integrity(e)
        } else {
            Self::Ledger(e)
        }
    }
}

impl From<IndexError> for QueryError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::NotFound { dest, timestamp } => Self::NotFound {
                dest,
                bound: format!("timestamp {timestamp}"),
            },
            IndexError::Ledger(inner) => inner.into(),
            other => Self::Index(other),
        }
    }
}

/// Error reply body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

/// Convenience alias for query results.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_for_not_found_and_out_of_range() {
        let dest = Did::from_bytes(&[1u8; 16]).unwrap();
        let not_found = QueryError::NotFound {
            dest,
            bound: "seqNo 3".into(),
        };
        let out_of_range = QueryError::OutOfRange { seq_no: 9, tail: 4 };
        assert_eq!(not_found.code(), "NotFound");
        assert_eq!(out_of_range.code(), "OutOfRange");
        assert_eq!(out_of_range.to_reply().message, "seqNo 9 exceeds ledger tail 4");
    }

    #[test]
    fn validation_reply_carries_bare_reason() {
        let err = QueryError::Validation("bad".into());
        assert_eq!(err.to_string(), "client request invalid: bad");
        assert_eq!(
            err.to_reply(),
            ErrorReply {
                code: "InvalidClientRequest".into(),
                message: "bad".into()
            }
        );
    }

    #[test]
    fn ledger_integrity_errors_are_classified() {
        let err: QueryError = LedgerError::Halted {
            reason: "gap".into(),
        }
        .into();
        assert_eq!(err.code(), "LedgerIntegrity");

        let err: QueryError = LedgerError::Io("disk".into()).into();
        assert_eq!(err.code(), "Internal");
    }
}
