//! Optional compaction of identity histories.
//!
//! Every `interval` updates of an identity, the record effective at that
//! update is materialized. A later resolve starts folding from the nearest
//! checkpoint at or before its bound instead of the identity's first update.
//! Checkpoints are only ever appended, so readers holding an older bound are
//! unaffected by new ones.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use nym_ledger::{LedgerReader, NymTxn};
use nym_types::{Did, SeqNo};
use tracing::{debug, info};

use crate::error::{QueryError, QueryResult};
use crate::merger::RecordMerger;
use crate::record::EffectiveRecord;

/// Per-identity, append-only list of materialized records.
#[derive(Debug)]
pub struct CheckpointStore {
    interval: usize,
    checkpoints: RwLock<HashMap<Did, Vec<Arc<EffectiveRecord>>>>,
}

impl CheckpointStore {
    /// `interval == 0` disables checkpointing.
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            checkpoints: RwLock::new(HashMap::new()),
        }
    }

    /// Build checkpoints for everything already in `reader`.
    pub fn rebuild<R: LedgerReader>(reader: &R, interval: usize) -> QueryResult<Self> {
        let store = Self::new(interval);
        if !store.is_enabled() {
            return Ok(store);
        }

        let tail = reader.tail();
        for dest in reader.dests()? {
            let history = reader.iterate_by_dest(&dest, tail)?;
            let mut record: Option<EffectiveRecord> = None;
            for (i, txn) in history.iter().enumerate() {
                match record.as_mut() {
                    None => record = Some(EffectiveRecord::baseline(txn)),
                    Some(r) => r.apply(txn),
                }
                if (i + 1) % interval == 0 {
                    if let Some(r) = &record {
                        store.push(r.clone())?;
                    }
                }
            }
        }
        info!(interval, checkpoints = store.total(), "checkpoints rebuilt");
        Ok(store)
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    /// Called by the writer after `txn` is committed and was the
    /// `update_count`-th update of its identity. Returns whether a
    /// checkpoint was taken.
    pub fn observe<R: LedgerReader>(
        &self,
        reader: &R,
        txn: &NymTxn,
        update_count: usize,
    ) -> QueryResult<bool> {
        if !self.is_enabled() || update_count == 0 || update_count % self.interval != 0 {
            return Ok(false);
        }
        let record = RecordMerger::with_checkpoints(reader, self).resolve(txn.dest(), txn.seq_no)?;
        self.push(record)?;
        Ok(true)
    }

    /// Latest checkpoint of `dest` with `seqNo <= bound`.
    pub fn nearest(&self, dest: &Did, bound: SeqNo) -> Option<Arc<EffectiveRecord>> {
        let checkpoints = self.checkpoints.read().ok()?;
        let list = checkpoints.get(dest)?;
        let idx = list.partition_point(|c| c.seq_no <= bound);
        idx.checked_sub(1).map(|i| list[i].clone())
    }

    /// Number of checkpoints held for `dest`.
    pub fn count(&self, dest: &Did) -> usize {
        self.checkpoints
            .read()
            .map(|c| c.get(dest).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn total(&self) -> usize {
        self.checkpoints
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn push(&self, record: EffectiveRecord) -> QueryResult<()> {
        let mut checkpoints = self
            .checkpoints
            .write()
            .map_err(|_| QueryError::Config("checkpoint lock poisoned".into()))?;
        let list = checkpoints.entry(record.dest.clone()).or_default();
        if list.last().is_some_and(|last| last.seq_no >= record.seq_no) {
            return Ok(());
        }
        debug!(dest = %record.dest, seq_no = record.seq_no, "checkpoint taken");
        list.push(Arc::new(record));
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.checkpoints.write();
            panic!("checkpoint writer panicked");
        }));
    }
}
