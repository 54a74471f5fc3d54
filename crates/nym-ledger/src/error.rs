use nym_types::SeqNo;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A core log invariant is broken. The log halts on this error.
    #[error("integrity violation at seqNo {seq_no}: {reason}")]
    IntegrityViolation { seq_no: SeqNo, reason: String },

    /// The submitted subject DID is not well-formed; nothing was appended.
    #[error("malformed dest {dest:?}: {reason}")]
    MalformedDest { dest: String, reason: String },

    /// An earlier integrity violation stopped the writer.
    #[error("ledger halted: {reason}")]
    Halted { reason: String },

    #[error("no transaction with seqNo {seq_no} (tail is {tail})")]
    NotFound { seq_no: SeqNo, tail: SeqNo },

    #[error("invalid sequence range: from={from}, to={to}")]
    InvalidRange { from: SeqNo, to: SeqNo },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Returns `true` for errors that signal a broken ledger rather than a
    /// bad request.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::IntegrityViolation { .. } | Self::MalformedDest { .. } | Self::Halted { .. }
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
