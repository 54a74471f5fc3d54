use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use nym_types::{AttributeUpdate, Did, SeqNo, TxnTime};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::records::{DestHistory, NymTxn, TxnRef};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::StreamValidator;
use crate::wal::{WalConfig, WriteAheadLog};

/// The append-only NYM transaction log.
///
/// One writer, many readers. Appends are serialized behind `writer`; readers
/// take the state read lock only long enough to clone `Arc`ed records, so a
/// long fold never holds up the writer. The tail is published through an
/// atomic after the record is visible in the state, so any tail a reader
/// observes is fully readable.
///
/// Once an integrity violation is detected the log halts and refuses all
/// further appends. Reads keep working.
pub struct TransactionLog {
    clock: Arc<dyn Clock>,
    wal: Option<WriteAheadLog>,
    writer: Mutex<()>,
    inner: RwLock<LogState>,
    tail: AtomicU64,
    halted: RwLock<Option<String>>,
}

#[derive(Default)]
struct LogState {
    txns: Vec<Arc<NymTxn>>,
    by_dest: HashMap<Did, Vec<SeqNo>>,
}

impl LogState {
    fn push(&mut self, txn: NymTxn) -> Arc<NymTxn> {
        let txn = Arc::new(txn);
        self.by_dest
            .entry(txn.dest().clone())
            .or_default()
            .push(txn.seq_no);
        self.txns.push(txn.clone());
        txn
    }

    fn last(&self) -> Option<&NymTxn> {
        self.txns.last().map(|t| t.as_ref())
    }
}

impl TransactionLog {
    /// A log that lives only in memory.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            wal: None,
            writer: Mutex::new(()),
            inner: RwLock::new(LogState::default()),
            tail: AtomicU64::new(0),
            halted: RwLock::new(None),
        }
    }

    /// Open a durable log backed by the WAL at `path`, replaying and
    /// validating everything already stored there.
    pub fn open(path: &Path, config: WalConfig, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        let wal = WriteAheadLog::open(path, config)?;
        let recovery = wal.recover()?;
        if let Some(offset) = recovery.damaged {
            return Err(LedgerError::IntegrityViolation {
                seq_no: recovery.entries.len() as SeqNo + 1,
                reason: format!("WAL frame at byte {offset} is corrupt but later frames are intact"),
            });
        }
        if recovery.valid_len < wal.offset() {
            warn!(
                path = %path.display(),
                valid_len = recovery.valid_len,
                file_len = wal.offset(),
                "discarding torn WAL tail"
            );
            wal.truncate_to(recovery.valid_len)?;
        }

        StreamValidator::validate_records(&recovery.entries).into_result()?;

        let mut state = LogState::default();
        for txn in recovery.entries {
            state.push(txn);
        }
        let tail = state.txns.len() as SeqNo;
        info!(path = %path.display(), tail, dests = state.by_dest.len(), "transaction log opened");

        Ok(Self {
            clock,
            wal: Some(wal),
            writer: Mutex::new(()),
            inner: RwLock::new(state),
            tail: AtomicU64::new(tail),
            halted: RwLock::new(None),
        })
    }

    /// Flush and sync the backing WAL. The log must not be used afterwards.
    pub fn close(self) -> Result<(), LedgerError> {
        if let Some(wal) = &self.wal {
            wal.sync()?;
        }
        info!(tail = self.tail(), "transaction log closed");
        Ok(())
    }

    pub fn is_durable(&self) -> bool {
        self.wal.is_some()
    }

    /// Reason the log stopped accepting appends, if it did.
    pub fn halted_reason(&self) -> Option<String> {
        self.halted.read().ok().and_then(|h| h.clone())
    }

    /// Stop accepting appends.
    pub fn halt(&self, reason: &str) {
        error!(reason, tail = self.tail(), "transaction log halted");
        if let Ok(mut halted) = self.halted.write() {
            halted.get_or_insert_with(|| reason.to_string());
        }
    }

    /// Append a JSON-encoded update as handed over by the ordering layer.
    /// A malformed `dest` is rejected before anything else is decoded.
    pub fn append_json(&self, json: &str) -> Result<NymTxn, LedgerError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let dest = value.get("dest").and_then(|d| d.as_str()).unwrap_or_default();
        if let Err(e) = Did::parse(dest) {
            return Err(LedgerError::MalformedDest {
                dest: dest.to_string(),
                reason: e.to_string(),
            });
        }
        let update: AttributeUpdate =
            serde_json::from_value(value).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        self.append(update)
    }

    fn check_not_halted(&self) -> Result<(), LedgerError> {
        match self.halted_reason() {
            Some(reason) => Err(LedgerError::Halted { reason }),
            None => Ok(()),
        }
    }

    fn violation(&self, seq_no: SeqNo, reason: String) -> LedgerError {
        self.halt(&reason);
        LedgerError::IntegrityViolation { seq_no, reason }
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, LogState>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::IntegrityViolation {
                seq_no: 0,
                reason: "ledger read lock poisoned".into(),
            })
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LogState>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::IntegrityViolation {
                seq_no: 0,
                reason: "ledger write lock poisoned".into(),
            })
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>, LedgerError> {
        self.writer.lock().map_err(|_| LedgerError::IntegrityViolation {
            seq_no: 0,
            reason: "ledger writer lock poisoned".into(),
        })
    }

    /// Position the next record would occupy.
    fn next_position(&self) -> Result<(SeqNo, TxnTime, Option<[u8; 32]>), LedgerError> {
        let state = self.read_state()?;
        let last = state.last();
        let seq_no = state.txns.len() as SeqNo + 1;
        let now = self.clock.now();
        let txn_time = last.map(|l| now.max(l.txn_time)).unwrap_or(now);
        Ok((seq_no, txn_time, last.map(|l| l.txn_hash)))
    }

    /// Persist and publish a record. Caller holds the writer lock and has
    /// already checked it against the tail.
    fn commit(&self, txn: NymTxn) -> Result<NymTxn, LedgerError> {
        if let Some(wal) = &self.wal {
            if let Err(e) = wal.append(&txn) {
                if e.is_integrity() {
                    self.halt(&e.to_string());
                }
                return Err(e);
            }
        }
        let seq_no = txn.seq_no;
        {
            let mut state = self.write_state()?;
            state.push(txn.clone());
        }
        self.tail.store(seq_no, Ordering::Release);
        debug!(seq_no, txn_time = txn.txn_time, dest = %txn.dest(), "nym txn committed");
        Ok(txn)
    }
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::in_memory(Arc::new(SystemClock))
    }
}

impl LedgerWriter for TransactionLog {
    fn append(&self, update: AttributeUpdate) -> Result<NymTxn, LedgerError> {
        let _writer = self.lock_writer()?;
        self.check_not_halted()?;

        let (seq_no, txn_time, prev_hash) = self.next_position()?;
        let txn = NymTxn::seal(seq_no, txn_time, prev_hash, update)?;
        self.commit(txn)
    }

    fn append_committed(&self, txn: NymTxn) -> Result<NymTxn, LedgerError> {
        let _writer = self.lock_writer()?;
        self.check_not_halted()?;

        let (expected_seq, _, expected_prev) = self.next_position()?;
        if txn.seq_no != expected_seq {
            return Err(self.violation(
                txn.seq_no,
                format!("append out of order; expected seqNo {expected_seq}"),
            ));
        }

        let last_time = self.read_state()?.last().map(|l| l.txn_time);
        if let Some(last_time) = last_time {
            if txn.txn_time < last_time {
                return Err(self.violation(
                    txn.seq_no,
                    format!("txnTime {} precedes tail txnTime {last_time}", txn.txn_time),
                ));
            }
        }

        if txn.prev_hash != expected_prev {
            return Err(self.violation(txn.seq_no, "previous hash link mismatch".into()));
        }
        if txn.compute_hash()? != txn.txn_hash {
            return Err(self.violation(txn.seq_no, "transaction hash mismatch".into()));
        }

        self.commit(txn)
    }
}

impl LedgerReader for TransactionLog {
    fn tail(&self) -> SeqNo {
        self.tail.load(Ordering::Acquire)
    }

    fn head(&self) -> Result<Option<TxnRef>, LedgerError> {
        let tail = self.tail();
        if tail == 0 {
            return Ok(None);
        }
        Ok(Some(TxnRef::from(self.get_by_seq_no(tail)?.as_ref())))
    }

    fn get_by_seq_no(&self, seq_no: SeqNo) -> Result<Arc<NymTxn>, LedgerError> {
        let tail = self.tail();
        if seq_no == 0 || seq_no > tail {
            return Err(LedgerError::NotFound { seq_no, tail });
        }
        let state = self.read_state()?;
        state
            .txns
            .get((seq_no - 1) as usize)
            .cloned()
            .ok_or(LedgerError::NotFound { seq_no, tail })
    }

    fn read_range(&self, from_seq: SeqNo, to_seq: SeqNo) -> Result<Vec<Arc<NymTxn>>, LedgerError> {
        if from_seq == 0 || to_seq == 0 || from_seq > to_seq {
            return Err(LedgerError::InvalidRange {
                from: from_seq,
                to: to_seq,
            });
        }

        let end = to_seq.min(self.tail()) as usize;
        let start = (from_seq - 1) as usize;
        if start >= end {
            return Ok(vec![]);
        }
        let state = self.read_state()?;
        Ok(state.txns[start..end].to_vec())
    }

    fn iterate_by_dest_after(
        &self,
        dest: &Did,
        after: SeqNo,
        upto: SeqNo,
    ) -> Result<DestHistory, LedgerError> {
        let upto = upto.min(self.tail());
        if after >= upto {
            return Ok(DestHistory::default());
        }

        let state = self.read_state()?;
        let Some(positions) = state.by_dest.get(dest) else {
            return Ok(DestHistory::default());
        };

        let start = positions.partition_point(|s| *s <= after);
        let end = positions.partition_point(|s| *s <= upto);
        let entries = positions[start..end]
            .iter()
            .map(|s| state.txns[(*s - 1) as usize].clone())
            .collect();
        Ok(DestHistory::new(entries))
    }

    fn dests(&self) -> Result<Vec<Did>, LedgerError> {
        let state = self.read_state()?;
        let mut dests: Vec<_> = state.by_dest.keys().cloned().collect();
        dests.sort();
        Ok(dests)
    }
}
