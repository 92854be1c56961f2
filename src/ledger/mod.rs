//! Proposal ledger and confirmation tracking.
//!
//! - Append-only proposal sequence, indexed from zero, never reordered
//! - Per-proposal, per-member confirmation flags
//! - Ordered, short-circuiting precondition checks before any mutation
//! - CBOR snapshots of the durable layout

pub mod confirmations;
pub mod proposal;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod proptests;

pub use confirmations::ConfirmationMatrix;
pub use proposal::{ExecutionOutcome, Proposal};
pub use snapshot::{LedgerSnapshot, SnapshotError};
pub use state::{DispatchTicket, LedgerState};
