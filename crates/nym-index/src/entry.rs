use nym_types::{SeqNo, TxnTime};
use serde::{Deserialize, Serialize};

/// One indexed transaction of an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeEntry {
    pub txn_time: TxnTime,
    pub seq_no: SeqNo,
}

impl TimeEntry {
    pub fn new(txn_time: TxnTime, seq_no: SeqNo) -> Self {
        Self { txn_time, seq_no }
    }

    /// Whether this entry is visible to a lookup at `timestamp` bounded by
    /// `upto`.
    pub fn visible_at(&self, timestamp: TxnTime, upto: SeqNo) -> bool {
        self.txn_time <= timestamp && self.seq_no <= upto
    }
}
