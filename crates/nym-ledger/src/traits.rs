use std::sync::Arc;

use nym_types::{AttributeUpdate, Did, SeqNo};

use crate::error::LedgerError;
use crate::records::{DestHistory, NymTxn, TxnRef};

/// Write boundary of the transaction log. There is exactly one writer.
pub trait LedgerWriter: Send + Sync {
    /// Commit an update, assigning `seqNo = tail + 1` and a monotonic
    /// `txnTime`. Durable before returning.
    fn append(&self, update: AttributeUpdate) -> Result<NymTxn, LedgerError>;

    /// Commit a record that was sequenced elsewhere. Any mismatch with the
    /// local tail is an integrity violation.
    fn append_committed(&self, txn: NymTxn) -> Result<NymTxn, LedgerError>;
}

/// Read boundary of the transaction log. Safe to call from many threads
/// while the writer appends.
pub trait LedgerReader: Send + Sync {
    /// Current tail seqNo, 0 when nothing is committed.
    fn tail(&self) -> SeqNo;

    fn head(&self) -> Result<Option<TxnRef>, LedgerError>;

    fn get_by_seq_no(&self, seq_no: SeqNo) -> Result<Arc<NymTxn>, LedgerError>;

    /// Inclusive range read.
    fn read_range(&self, from_seq: SeqNo, to_seq: SeqNo) -> Result<Vec<Arc<NymTxn>>, LedgerError>;

    /// All of `dest`'s transactions with `seqNo <= upto`, ascending.
    fn iterate_by_dest(&self, dest: &Did, upto: SeqNo) -> Result<DestHistory, LedgerError> {
        self.iterate_by_dest_after(dest, 0, upto)
    }

    /// `dest`'s transactions with `after < seqNo <= upto`, ascending.
    fn iterate_by_dest_after(
        &self,
        dest: &Did,
        after: SeqNo,
        upto: SeqNo,
    ) -> Result<DestHistory, LedgerError>;

    /// Every identity with at least one committed transaction.
    fn dests(&self) -> Result<Vec<Did>, LedgerError>;
}
