//! Per-identity temporal index.
//!
//! Each identity owns a vector of [`TimeEntry`] sorted by both `txn_time`
//! and `seq_no` (the ledger assigns both monotonically, so one append order
//! satisfies both). A floor lookup is a single `partition_point`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use nym_ledger::LedgerReader;
use nym_types::{Did, SeqNo, TxnTime};
use tracing::{debug, info};

use crate::entry::TimeEntry;
use crate::error::{IndexError, IndexResult};

/// Maps timestamps to the latest preceding transaction of an identity.
#[derive(Debug, Default)]
pub struct TemporalIndex {
    entries: RwLock<HashMap<Did, Vec<TimeEntry>>>,
}

impl TemporalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index covering every transaction already in `reader`.
    pub fn rebuild<R: LedgerReader>(reader: &R) -> IndexResult<Self> {
        let index = Self::new();
        let tail = reader.tail();
        if tail > 0 {
            for txn in reader.read_range(1, tail)? {
                index.record(txn.dest(), txn.txn_time, txn.seq_no)?;
            }
        }
        info!(tail, dests = index.dest_count(), "temporal index rebuilt");
        Ok(index)
    }

    /// Index one committed transaction. Entries for an identity must arrive
    /// in commit order.
    pub fn record(&self, dest: &Did, txn_time: TxnTime, seq_no: SeqNo) -> IndexResult<()> {
        let mut entries = self.write()?;
        let list = entries.entry(dest.clone()).or_default();
        if let Some(last) = list.last() {
            if seq_no <= last.seq_no || txn_time < last.txn_time {
                return Err(IndexError::OutOfOrder {
                    dest: dest.clone(),
                    txn_time,
                    seq_no,
                    last_time: last.txn_time,
                    last_seq_no: last.seq_no,
                });
            }
        }
        list.push(TimeEntry::new(txn_time, seq_no));
        debug!(%dest, txn_time, seq_no, "temporal index entry recorded");
        Ok(())
    }

    /// SeqNo of the latest transaction of `dest` with `txnTime <= timestamp`
    /// and `seqNo <= upto`.
    ///
    /// Among transactions sharing a `txnTime`, the highest qualifying seqNo
    /// wins. Fails with [`IndexError::NotFound`] when the identity did not
    /// exist yet at `timestamp`.
    pub fn floor_seq_no(&self, dest: &Did, timestamp: TxnTime, upto: SeqNo) -> IndexResult<SeqNo> {
        let entries = self.read()?;
        let not_found = || IndexError::NotFound {
            dest: dest.clone(),
            timestamp,
        };

        let list = entries.get(dest).ok_or_else(not_found)?;
        // Visibility is monotone along the list: true for a prefix, then false.
        let visible = list.partition_point(|e| e.visible_at(timestamp, upto));
        if visible == 0 {
            return Err(not_found());
        }
        Ok(list[visible - 1].seq_no)
    }

    /// Number of indexed transactions for `dest`.
    pub fn len(&self, dest: &Did) -> usize {
        self.read()
            .map(|e| e.get(dest).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Commit time of `dest`'s first transaction.
    pub fn first_txn_time(&self, dest: &Did) -> Option<TxnTime> {
        self.read()
            .ok()
            .and_then(|e| e.get(dest).and_then(|l| l.first()).map(|f| f.txn_time))
    }

    /// Number of indexed identities.
    pub fn dest_count(&self) -> usize {
        self.read().map(|e| e.len()).unwrap_or(0)
    }

    fn read(&self) -> IndexResult<RwLockReadGuard<'_, HashMap<Did, Vec<TimeEntry>>>> {
        self.entries.read().map_err(|_| IndexError::Poisoned)
    }

    fn write(&self) -> IndexResult<RwLockWriteGuard<'_, HashMap<Did, Vec<TimeEntry>>>> {
        self.entries.write().map_err(|_| IndexError::Poisoned)
    }
}
