use nym_ledger::{DestHistory, LedgerReader};
use nym_types::{Did, SeqNo};
use tracing::debug;

use crate::checkpoint::CheckpointStore;
use crate::error::{QueryError, QueryResult};
use crate::record::EffectiveRecord;

/// Folds an identity's updates into the record effective at a seqNo bound.
pub struct RecordMerger<'a, R: LedgerReader> {
    reader: &'a R,
    checkpoints: Option<&'a CheckpointStore>,
}

impl<'a, R: LedgerReader> RecordMerger<'a, R> {
    /// Merger that always folds from the identity's first update.
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            checkpoints: None,
        }
    }

    /// Merger that starts from the nearest checkpoint at or before the bound.
    pub fn with_checkpoints(reader: &'a R, checkpoints: &'a CheckpointStore) -> Self {
        Self {
            reader,
            checkpoints: Some(checkpoints),
        }
    }

    /// Record of `dest` as of `bound`.
    ///
    /// The provenance of the result is the last update at or before `bound`,
    /// which may be earlier than `bound` itself. Fails with
    /// [`QueryError::OutOfRange`] past the tail and [`QueryError::NotFound`]
    /// when the identity did not exist yet.
    pub fn resolve(&self, dest: &Did, bound: SeqNo) -> QueryResult<EffectiveRecord> {
        let tail = self.reader.tail();
        if bound > tail {
            return Err(QueryError::OutOfRange { seq_no: bound, tail });
        }

        let start = self.checkpoints.and_then(|c| c.nearest(dest, bound));
        let after = start.as_ref().map_or(0, |c| c.seq_no);
        let history = self.reader.iterate_by_dest_after(dest, after, bound)?;
        debug!(
            %dest,
            bound,
            checkpoint = after,
            folded = history.len(),
            "folding nym history"
        );

        Self::fold(start.map(|c| c.as_ref().clone()), &history).ok_or_else(|| {
            QueryError::NotFound {
                dest: dest.clone(),
                bound: format!("seqNo {bound}"),
            }
        })
    }

    /// Fold `history` onto `start`. The first update becomes the baseline
    /// when there is no starting record.
    pub fn fold(start: Option<EffectiveRecord>, history: &DestHistory) -> Option<EffectiveRecord> {
        history.iter().fold(start, |acc, txn| match acc {
            None => Some(EffectiveRecord::baseline(txn)),
            Some(mut record) => {
                record.apply(txn);
                Some(record)
            }
        })
    }
}
