//! Foundation types for the NYM ledger.
//!
//! This crate provides the identity and update types shared by the ledger,
//! the temporal index and the query pipeline.
//!
//! # Key Types
//!
//! - [`Did`]: Validated base58 decentralized identifier
//! - [`Role`]: Ledger role granted to an identity
//! - [`FieldUpdate`]: Explicit `Unset | Set(value)` tag for partial updates
//! - [`AttributeUpdate`]: One NYM write as submitted by the ordering layer
//! - [`NymVersion`]: Schema-version marker of a NYM

pub mod did;
pub mod error;
pub mod field;
pub mod role;
pub mod update;

pub use did::Did;
pub use error::TypeError;
pub use field::FieldUpdate;
pub use role::Role;
pub use update::{AttributeUpdate, NymVersion};

/// Ledger-wide transaction position, assigned at commit. The first
/// committed transaction has `SeqNo` 1; 0 means "nothing committed".
pub type SeqNo = u64;

/// Commit timestamp in unix seconds.
pub type TxnTime = u64;
