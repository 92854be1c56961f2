//! Trait abstraction for the resource custodian.
//!
//! The custodian holds the pooled resource and performs outgoing effects.
//! The vault treats it as an untrusted collaborator: a dispatch can fail,
//! stall, or call back into the vault before returning.

use crate::identity::AccountId;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Quantity of pooled resource.
pub type Amount = u128;

/// Result type for custodian operations.
pub type CustodianResult<T> = Result<T, CustodianError>;

/// Custodian operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodianError {
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Amount, available: Amount },

    #[error("balance overflow")]
    Overflow,

    /// The target refused or reverted the call.
    #[error("call rejected by {target}: {reason}")]
    CallRejected { target: AccountId, reason: String },

    #[error("dispatch timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Custodian: Send + Sync {
    /// Current pooled balance.
    async fn balance(&self) -> CustodianResult<Amount>;

    /// Accept incoming value. Returns the new pooled balance.
    async fn deposit(&self, from: &AccountId, amount: Amount) -> CustodianResult<Amount>;

    /// Transfer `value` to `target` and deliver `payload` to it.
    ///
    /// On error no value may have left the pool.
    async fn dispatch(
        &self,
        target: &AccountId,
        value: Amount,
        payload: &[u8],
    ) -> CustodianResult<()>;
}
