use std::sync::Arc;

use nym_types::{AttributeUpdate, Did, SeqNo, TxnTime};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A committed NYM transaction.
///
/// Created once by the append path and immutable afterwards. `txn_hash`
/// covers every other field, and `prev_hash` links to the transaction
/// immediately before it in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NymTxn {
    /// Position in the log, starting at 1.
    pub seq_no: SeqNo,
    /// Commit time in unix seconds. Never decreases along the log.
    pub txn_time: TxnTime,
    /// Hash of the previous transaction; `None` only for seqNo 1.
    pub prev_hash: Option<[u8; 32]>,
    pub txn_hash: [u8; 32],
    pub update: AttributeUpdate,
}

#[derive(Serialize)]
struct HashInput<'a> {
    seq_no: SeqNo,
    txn_time: TxnTime,
    prev_hash: Option<[u8; 32]>,
    update: &'a AttributeUpdate,
}

impl NymTxn {
    /// Build a committed record and compute its hash.
    pub fn seal(
        seq_no: SeqNo,
        txn_time: TxnTime,
        prev_hash: Option<[u8; 32]>,
        update: AttributeUpdate,
    ) -> Result<Self, LedgerError> {
        let mut txn = Self {
            seq_no,
            txn_time,
            prev_hash,
            txn_hash: [0; 32],
            update,
        };
        txn.txn_hash = txn.compute_hash()?;
        Ok(txn)
    }

    /// Recompute the hash over the canonical encoding of this record.
    pub fn compute_hash(&self) -> Result<[u8; 32], LedgerError> {
        let encoded = serde_json::to_vec(&HashInput {
            seq_no: self.seq_no,
            txn_time: self.txn_time,
            prev_hash: self.prev_hash,
            update: &self.update,
        })
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"nym-txn-v1:");
        hasher.update(&encoded);
        Ok(*hasher.finalize().as_bytes())
    }

    pub fn dest(&self) -> &Did {
        &self.update.dest
    }
}

/// Lightweight pointer to a committed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnRef {
    /// Position of the referenced transaction.
    pub seq_no: SeqNo,
    pub txn_time: TxnTime,
    pub txn_hash: [u8; 32],
}

impl From<&NymTxn> for TxnRef {
    fn from(txn: &NymTxn) -> Self {
        Self {
            seq_no: txn.seq_no,
            txn_time: txn.txn_time,
            txn_hash: txn.txn_hash,
        }
    }
}

/// One identity's transactions within a fixed seqNo window, in ascending
/// seqNo order.
///
/// Captured at read time: appends made after the capture are not visible.
/// Iterating does not consume the history, so a scan can be restarted.
#[derive(Clone, Debug)]
pub struct DestHistory {
    entries: Arc<[Arc<NymTxn>]>,
}

impl DestHistory {
    pub(crate) fn new(entries: Vec<Arc<NymTxn>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NymTxn> + '_ {
        self.entries.iter().map(unwrap_txn)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&NymTxn> {
        self.entries.first().map(unwrap_txn)
    }

    pub fn last(&self) -> Option<&NymTxn> {
        self.entries.last().map(unwrap_txn)
    }
}

impl Default for DestHistory {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn unwrap_txn(txn: &Arc<NymTxn>) -> &NymTxn {
    txn
}

impl<'a> IntoIterator for &'a DestHistory {
    type Item = &'a NymTxn;
    type IntoIter =
        std::iter::Map<std::slice::Iter<'a, Arc<NymTxn>>, fn(&'a Arc<NymTxn>) -> &'a NymTxn>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(unwrap_txn as fn(&'a Arc<NymTxn>) -> &'a NymTxn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn did(seed: u8) -> Did {
        Did::from_bytes(&[seed; 16]).unwrap()
    }

    #[test]
    fn seal_computes_verifiable_hash() {
        let txn = NymTxn::seal(1, 100, None, AttributeUpdate::new(did(1), did(2))).unwrap();
        assert_ne!(txn.txn_hash, [0; 32]);
        assert_eq!(txn.compute_hash().unwrap(), txn.txn_hash);
    }

    #[test]
    fn hash_covers_update_content() {
        let a = NymTxn::seal(
            1,
            100,
            None,
            AttributeUpdate::new(did(1), did(2)).with_diddoc_content("{\"a\":1}"),
        )
        .unwrap();
        let b = NymTxn::seal(
            1,
            100,
            None,
            AttributeUpdate::new(did(1), did(2)).with_diddoc_content("{\"a\": 1}"),
        )
        .unwrap();
        assert_ne!(a.txn_hash, b.txn_hash);
    }

    #[test]
    fn history_is_restartable() {
        let txn = Arc::new(NymTxn::seal(1, 100, None, AttributeUpdate::new(did(1), did(1))).unwrap());
        let history = DestHistory::new(vec![txn.clone(), txn]);
        assert_eq!(history.iter().count(), 2);
        assert_eq!(history.iter().count(), 2);
        assert_eq!((&history).into_iter().count(), 2);
        assert_eq!(history.last().map(|t| t.seq_no), Some(1));
    }
}
