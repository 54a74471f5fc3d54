//! Error types for the index crate.

use nym_types::{Did, SeqNo, TxnTime};

/// Errors that can occur during index operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The identity has no indexed transaction at or before the timestamp.
    #[error("{dest} did not exist at time {timestamp}")]
    NotFound { dest: Did, timestamp: TxnTime },

    /// A transaction was recorded out of order for its identity.
    #[error("out-of-order index entry for {dest}: ({txn_time}, {seq_no}) after ({last_time}, {last_seq_no})")]
    OutOfOrder {
        dest: Did,
        txn_time: TxnTime,
        seq_no: SeqNo,
        last_time: TxnTime,
        last_seq_no: SeqNo,
    },

    /// Rebuilding from the ledger failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] nym_ledger::LedgerError),

    #[error("index lock poisoned")]
    Poisoned,
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
