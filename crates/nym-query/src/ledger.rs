//! The node-owned NYM ledger handle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use nym_index::TemporalIndex;
use nym_ledger::{
    Clock, LedgerError, LedgerReader, LedgerWriter, NymTxn, StreamValidator, TransactionLog,
    ValidationReport,
};
use nym_types::{AttributeUpdate, Did, SeqNo};
use tracing::{debug, info, warn};

use crate::assembler::{GetNymReply, ResultAssembler};
use crate::checkpoint::CheckpointStore;
use crate::config::NodeConfig;
use crate::error::{QueryError, QueryResult};
use crate::merger::RecordMerger;
use crate::record::EffectiveRecord;
use crate::request::GetNymRequest;
use crate::validator::{QueryValidator, ResolutionBound};

/// Where a GET_NYM query is in its pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStage {
    Received,
    Validated,
    BoundResolved,
    Merged,
    Assembled,
    Returned,
    Rejected,
    NotFound,
    OutOfRange,
}

impl QueryStage {
    /// Terminal stage a failed query ends in.
    pub fn of_error(err: &QueryError) -> Self {
        match err {
            QueryError::Validation(_) => Self::Rejected,
            QueryError::NotFound { .. } => Self::NotFound,
            QueryError::OutOfRange { .. } => Self::OutOfRange,
            _ => Self::Rejected,
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::BoundResolved => "bound_resolved",
            Self::Merged => "merged",
            Self::Assembled => "assembled",
            Self::Returned => "returned",
            Self::Rejected => "rejected",
            Self::NotFound => "not_found",
            Self::OutOfRange => "out_of_range",
        };
        f.write_str(s)
    }
}

/// Transaction log, temporal index and checkpoints behind one handle.
///
/// Appends go through a single writer lock and update the log, the index and
/// the checkpoints before the new tail is published. Queries capture the
/// published tail once at start and never look past it, so they never see a
/// record the index does not know about yet. Checkpoints are an optimization:
/// failing to take one is logged and the record is still published.
pub struct NymLedger {
    log: TransactionLog,
    index: TemporalIndex,
    checkpoints: CheckpointStore,
    writer: Mutex<()>,
    published: AtomicU64,
}

impl NymLedger {
    /// Open the ledger described by `config`, rebuilding the index and
    /// checkpoints from whatever the log already holds.
    pub fn open(config: &NodeConfig, clock: Arc<dyn Clock>) -> QueryResult<Self> {
        let log = match &config.log_path {
            Some(path) => TransactionLog::open(path, config.wal_config(), clock)?,
            None => TransactionLog::in_memory(clock),
        };
        Self::from_log(log, config.checkpoint_interval)
    }

    pub fn in_memory(clock: Arc<dyn Clock>, checkpoint_interval: usize) -> Self {
        Self {
            log: TransactionLog::in_memory(clock),
            index: TemporalIndex::new(),
            checkpoints: CheckpointStore::new(checkpoint_interval),
            writer: Mutex::new(()),
            published: AtomicU64::new(0),
        }
    }

    fn from_log(log: TransactionLog, checkpoint_interval: usize) -> QueryResult<Self> {
        let index = TemporalIndex::rebuild(&log)?;
        let checkpoints = CheckpointStore::rebuild(&log, checkpoint_interval)?;
        let tail = log.tail();
        info!(
            tail,
            dests = index.dest_count(),
            durable = log.is_durable(),
            "nym ledger ready"
        );
        Ok(Self {
            log,
            index,
            checkpoints,
            writer: Mutex::new(()),
            published: AtomicU64::new(tail),
        })
    }

    /// Flush the log. The ledger is consumed.
    pub fn close(self) -> QueryResult<()> {
        self.log.close()?;
        Ok(())
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    pub fn index(&self) -> &TemporalIndex {
        &self.index
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Last seqNo visible to queries.
    pub fn tail(&self) -> SeqNo {
        self.published.load(Ordering::Acquire)
    }

    /// Commit an update and return its seqNo.
    pub fn append(&self, update: AttributeUpdate) -> QueryResult<SeqNo> {
        let _writer = self.lock_writer()?;
        let txn = self.log.append(update)?;
        self.publish(&txn)
    }

    /// Commit a JSON-encoded update. A malformed `dest` fails with an
    /// integrity error and leaves the ledger untouched.
    pub fn append_json(&self, json: &str) -> QueryResult<SeqNo> {
        let _writer = self.lock_writer()?;
        let txn = self.log.append_json(json)?;
        self.publish(&txn)
    }

    /// Commit a record sequenced elsewhere.
    pub fn append_committed(&self, txn: NymTxn) -> QueryResult<SeqNo> {
        let _writer = self.lock_writer()?;
        let txn = self.log.append_committed(txn)?;
        self.publish(&txn)
    }

    fn lock_writer(&self) -> QueryResult<std::sync::MutexGuard<'_, ()>> {
        self.writer.lock().map_err(|_| {
            QueryError::Integrity(LedgerError::Halted {
                reason: "writer lock poisoned".into(),
            })
        })
    }

    /// Index and checkpoint a committed record, then make it visible.
    fn publish(&self, txn: &NymTxn) -> QueryResult<SeqNo> {
        if let Err(e) = self.index.record(txn.dest(), txn.txn_time, txn.seq_no) {
            let reason = e.to_string();
            self.log.halt(&reason);
            return Err(QueryError::Integrity(LedgerError::Halted { reason }));
        }
        let updates = self.index.len(txn.dest());
        if let Err(e) = self.checkpoints.observe(&self.log, txn, updates) {
            warn!(seq_no = txn.seq_no, dest = %txn.dest(), error = %e, "checkpoint skipped");
        }
        self.published.store(txn.seq_no, Ordering::Release);
        Ok(txn.seq_no)
    }

    /// Answer a GET_NYM request.
    pub fn get_nym(&self, request: &GetNymRequest) -> QueryResult<GetNymReply> {
        debug!(stage = %QueryStage::Received, dest = %request.dest, "get_nym");
        let result = self.run_query(request);
        match &result {
            Ok(reply) => debug!(
                stage = %QueryStage::Returned,
                dest = %reply.dest,
                seq_no = reply.seq_no,
                "get_nym"
            ),
            Err(e) => debug!(stage = %QueryStage::of_error(e), error = %e, "get_nym"),
        }
        result
    }

    fn run_query(&self, request: &GetNymRequest) -> QueryResult<GetNymReply> {
        let query = QueryValidator::validate(request)?;
        debug!(stage = %QueryStage::Validated, bound = %query.bound, "get_nym");

        let record = self.resolve(&query.dest, query.bound)?;
        debug!(stage = %QueryStage::Merged, seq_no = record.seq_no, "get_nym");

        let reply = ResultAssembler::assemble(&query, &record)?;
        debug!(stage = %QueryStage::Assembled, bytes = reply.data.len(), "get_nym");
        Ok(reply)
    }

    /// Record of `dest` as of `bound`, against the tail published right now.
    pub fn resolve(&self, dest: &Did, bound: ResolutionBound) -> QueryResult<EffectiveRecord> {
        let tail = self.tail();
        let seq_no = self.bound_seq_no(dest, bound, tail)?;
        debug!(stage = %QueryStage::BoundResolved, %dest, seq_no, tail, "get_nym");

        RecordMerger::with_checkpoints(&self.log, &self.checkpoints)
            .resolve(dest, seq_no)
            .map_err(|e| match e {
                QueryError::NotFound { dest, .. } => QueryError::NotFound {
                    dest,
                    bound: bound.to_string(),
                },
                other => other,
            })
    }

    fn bound_seq_no(&self, dest: &Did, bound: ResolutionBound, tail: SeqNo) -> QueryResult<SeqNo> {
        match bound {
            ResolutionBound::Latest => Ok(tail),
            ResolutionBound::SeqNo(seq_no) if seq_no > tail => {
                Err(QueryError::OutOfRange { seq_no, tail })
            }
            ResolutionBound::SeqNo(seq_no) => Ok(seq_no),
            ResolutionBound::Timestamp(timestamp) => {
                Ok(self.index.floor_seq_no(dest, timestamp, tail)?)
            }
        }
    }

    /// Effective record after each of `dest`'s updates, oldest first.
    pub fn history(&self, dest: &Did) -> QueryResult<Vec<EffectiveRecord>> {
        let txns = self.log.iterate_by_dest(dest, self.tail())?;
        let mut out: Vec<EffectiveRecord> = Vec::with_capacity(txns.len());
        for txn in &txns {
            let next = match out.last() {
                None => EffectiveRecord::baseline(txn),
                Some(prev) => {
                    let mut next = prev.clone();
                    next.apply(txn);
                    next
                }
            };
            out.push(next);
        }
        Ok(out)
    }

    /// Full integrity scan of the log.
    pub fn verify(&self) -> QueryResult<ValidationReport> {
        Ok(StreamValidator::validate_log(&self.log)?)
    }
}
