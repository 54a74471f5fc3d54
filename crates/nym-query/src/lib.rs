//! Point-in-time resolution of NYM records.
//!
//! A query flows through four stages:
//!
//! 1. [`QueryValidator`] turns a [`GetNymRequest`] into one unambiguous
//!    [`ResolutionBound`], rejecting requests that carry both a seqNo and a
//!    timestamp.
//! 2. A timestamp bound is mapped to a seqNo through the temporal index.
//! 3. [`RecordMerger`] folds the identity's updates up to that seqNo into an
//!    [`EffectiveRecord`], starting from the nearest checkpoint when
//!    compaction is enabled.
//! 4. [`ResultAssembler`] renders the record into a [`GetNymReply`].
//!
//! [`NymLedger`] owns the log, the index and the checkpoints and drives both
//! the single writer path and the concurrent query path.

pub mod assembler;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod ledger;
pub mod merger;
pub mod record;
pub mod request;
pub mod validator;

pub use assembler::{GetNymReply, NymData, ResultAssembler};
pub use checkpoint::CheckpointStore;
pub use config::NodeConfig;
pub use error::{ErrorReply, QueryError, QueryResult};
pub use ledger::{NymLedger, QueryStage};
pub use merger::RecordMerger;
pub use record::EffectiveRecord;
pub use request::GetNymRequest;
pub use validator::{QueryValidator, ResolutionBound, ValidatedQuery, BOTH_BOUNDS_MESSAGE};
