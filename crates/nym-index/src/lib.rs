//! Temporal index for the NYM ledger.
//!
//! Maps a wall-clock timestamp to the latest transaction of one identity
//! committed at or before it, without scanning the whole ledger.
//!
//! # Key Types
//!
//! - [`TemporalIndex`] -- Per-identity sorted `(txnTime, seqNo)` vectors
//! - [`TimeEntry`] -- One indexed transaction
//! - [`IndexError`] -- Lookup and maintenance failures

pub mod entry;
pub mod error;
pub mod temporal;

pub use entry::TimeEntry;
pub use error::{IndexError, IndexResult};
pub use temporal::TemporalIndex;
