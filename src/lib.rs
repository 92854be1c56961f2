//! Custody - Shared-Custody Approval Ledger
//!
//! A fixed committee of members jointly controls a pooled resource. Any
//! member may propose a transfer plus call; once a quorum of distinct members
//! has confirmed, any member may execute it, exactly once.
//!
//! Key principles:
//! - Committee and quorum are write-once
//! - Proposals are append-only and addressed by position
//! - A proposal is closed before its effect is attempted, never re-armed
//! - The effect itself is delegated to a [`custodian::Custodian`]

pub mod audit;
pub mod committee;
pub mod custodian;
pub mod error;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod serialization;
pub mod vault;

pub use committee::Committee;
pub use error::{LedgerError, LedgerResult};
pub use events::LedgerEvent;
pub use identity::AccountId;
pub use vault::Vault;
