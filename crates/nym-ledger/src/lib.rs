//! Append-only NYM transaction log.
//!
//! This crate is the ground truth of the NYM ledger. It provides:
//! - [`NymTxn`] committed records with a BLAKE3 hash chain
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - [`TransactionLog`], in-memory or backed by a CRC-framed write-ahead log
//! - Snapshot reads of one identity's history ([`DestHistory`])
//! - Stream validation (sequence gaps, duplicates, time regressions, hash links)

pub mod clock;
pub mod error;
pub mod log;
pub mod records;
pub mod traits;
pub mod validation;
pub mod wal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LedgerError;
pub use log::TransactionLog;
pub use records::{DestHistory, NymTxn, TxnRef};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{StreamValidator, ValidationReport, Violation, ViolationKind};
pub use wal::{SyncMode, WalConfig, WriteAheadLog};
