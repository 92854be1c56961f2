//! In-memory custodian.
//!
//! Keeps the pooled balance, per-target credits, and a log of delivered
//! calls. Used by the replay CLI and by tests, which can make targets reject
//! calls or make the next dispatch fail.

use super::traits::*;
use crate::identity::AccountId;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A call delivered to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredCall {
    pub target: AccountId,
    pub value: Amount,
    pub payload: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct InMemoryCustodian {
    state: Arc<Mutex<PoolState>>,
}

#[derive(Default)]
struct PoolState {
    balance: Amount,
    credits: HashMap<AccountId, Amount>,
    delivered: Vec<DeliveredCall>,
    rejecting: HashSet<AccountId>,
    fail_next: Option<String>,
}

impl InMemoryCustodian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing pooled balance.
    pub fn with_balance(balance: Amount) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                balance,
                ..Default::default()
            })),
        }
    }

    /// Every future call to `target` is rejected.
    pub async fn reject_calls_to(&self, target: AccountId) {
        self.state.lock().await.rejecting.insert(target);
    }

    /// The next dispatch fails with `reason`, whatever its target.
    pub async fn fail_next_dispatch(&self, reason: impl Into<String>) {
        self.state.lock().await.fail_next = Some(reason.into());
    }

    /// Total value received by `target`.
    pub async fn credited(&self, target: &AccountId) -> Amount {
        self.state
            .lock()
            .await
            .credits
            .get(target)
            .copied()
            .unwrap_or(0)
    }

    /// Calls delivered so far, in order.
    pub async fn delivered(&self) -> Vec<DeliveredCall> {
        self.state.lock().await.delivered.clone()
    }
}

#[async_trait]
impl Custodian for InMemoryCustodian {
    async fn balance(&self) -> CustodianResult<Amount> {
        Ok(self.state.lock().await.balance)
    }

    async fn deposit(&self, from: &AccountId, amount: Amount) -> CustodianResult<Amount> {
        let mut state = self.state.lock().await;
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or(CustodianError::Overflow)?;
        debug!(from = %from.short(), amount, balance = state.balance, "deposit accepted");
        Ok(state.balance)
    }

    async fn dispatch(
        &self,
        target: &AccountId,
        value: Amount,
        payload: &[u8],
    ) -> CustodianResult<()> {
        let mut state = self.state.lock().await;

        if let Some(reason) = state.fail_next.take() {
            return Err(CustodianError::Other(reason));
        }
        if state.rejecting.contains(target) {
            return Err(CustodianError::CallRejected {
                target: *target,
                reason: "target reverted".to_string(),
            });
        }
        if value > state.balance {
            return Err(CustodianError::InsufficientFunds {
                requested: value,
                available: state.balance,
            });
        }

        let credit = state.credits.get(target).copied().unwrap_or(0);
        let credit = credit.checked_add(value).ok_or(CustodianError::Overflow)?;
        state.balance -= value;
        state.credits.insert(*target, credit);
        state.delivered.push(DeliveredCall {
            target: *target,
            value,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
