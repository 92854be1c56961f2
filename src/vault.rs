//! Shared-custody vault.
//!
//! One vault instance owns one ledger. All ledger state sits behind a single
//! async mutex, so every submit/confirm/revoke/execute appears atomic to
//! every other call on the same instance, and the counter/matrix invariant is
//! never observable half-updated.
//!
//! Execution is split around the custodian call:
//! 1. under the lock: check, then mark `executed = true`
//! 2. lock released: dispatch to the custodian (may fail, stall, re-enter)
//! 3. under the lock: record the outcome
//!
//! Step 1 is what makes re-entrant or repeated execution impossible. A failed
//! or timed-out dispatch never clears the mark.

use crate::committee::Committee;
use crate::custodian::{Amount, Custodian, CustodianError};
use crate::error::{LedgerError, LedgerResult};
use crate::events::{EventBus, EventSubscription, LedgerEvent};
use crate::identity::AccountId;
use crate::ledger::{ExecutionOutcome, LedgerSnapshot, LedgerState, Proposal, SnapshotError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct Vault<C: Custodian> {
    state: Mutex<LedgerState>,
    custodian: Arc<C>,
    events: EventBus,
    dispatch_timeout: Option<Duration>,
}

impl<C: Custodian> Vault<C> {
    /// Create a vault over a validated committee.
    pub fn new(committee: Committee, custodian: Arc<C>) -> Self {
        info!(
            members = committee.len(),
            quorum = committee.quorum(),
            "vault created"
        );
        Self::from_state(LedgerState::new(committee), custodian)
    }

    /// Validate the committee and create a vault.
    pub fn create(members: Vec<AccountId>, quorum: u32, custodian: Arc<C>) -> LedgerResult<Self> {
        let committee = Committee::new(members, quorum)?;
        Ok(Self::new(committee, custodian))
    }

    /// Rebuild a vault from a snapshot.
    pub fn restore(snapshot: LedgerSnapshot, custodian: Arc<C>) -> Result<Self, SnapshotError> {
        let state = snapshot.into_state()?;
        info!(proposals = state.count(), "vault restored from snapshot");
        Ok(Self::from_state(state, custodian))
    }

    fn from_state(state: LedgerState, custodian: Arc<C>) -> Self {
        Self {
            state: Mutex::new(state),
            custodian,
            events: EventBus::default(),
            dispatch_timeout: None,
        }
    }

    /// Bound each custodian dispatch. A timeout fails the execution.
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    pub fn custodian(&self) -> &Arc<C> {
        &self.custodian
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Caller-facing operations
    // ------------------------------------------------------------------

    /// Accept incoming value from any caller.
    pub async fn deposit(
        &self,
        sender: &AccountId,
        amount: Amount,
    ) -> Result<Amount, CustodianError> {
        let balance = self.custodian.deposit(sender, amount).await?;
        info!(sender = %sender.short(), amount, balance, "deposit");
        self.events.publish(LedgerEvent::Deposited {
            sender: *sender,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Propose a transfer plus call. Members only.
    pub async fn submit(
        &self,
        caller: &AccountId,
        target: AccountId,
        value: Amount,
        payload: Vec<u8>,
    ) -> LedgerResult<u64> {
        let mut state = self.state.lock().await;
        let index = state
            .submit(caller, target, value, payload.clone())
            .inspect_err(|e| reject("submit", caller, None, e))?;

        info!(
            index,
            proposer = %caller.short(),
            target = %target.short(),
            value,
            "proposal submitted"
        );
        self.events.publish(LedgerEvent::ProposalSubmitted {
            proposer: *caller,
            index,
            target,
            value,
            payload,
        });
        Ok(index)
    }

    /// Record the caller's confirmation of proposal `index`.
    pub async fn confirm(&self, caller: &AccountId, index: u64) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let confirmations = state
            .confirm(caller, index)
            .inspect_err(|e| reject("confirm", caller, Some(index), e))?;

        info!(index, member = %caller.short(), confirmations, "confirmation recorded");
        self.events.publish(LedgerEvent::ConfirmationRecorded {
            member: *caller,
            index,
        });
        Ok(())
    }

    /// Withdraw the caller's confirmation of proposal `index`.
    pub async fn revoke(&self, caller: &AccountId, index: u64) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let confirmations = state
            .revoke(caller, index)
            .inspect_err(|e| reject("revoke", caller, Some(index), e))?;

        info!(index, member = %caller.short(), confirmations, "confirmation withdrawn");
        self.events.publish(LedgerEvent::ConfirmationWithdrawn {
            member: *caller,
            index,
        });
        Ok(())
    }

    /// Perform proposal `index` once quorum is met.
    pub async fn execute(&self, caller: &AccountId, index: u64) -> LedgerResult<()> {
        let ticket = {
            let mut state = self.state.lock().await;
            state
                .begin_execution(caller, index)
                .inspect_err(|e| reject("execute", caller, Some(index), e))?
        };
        debug!(index, target = %ticket.target.short(), value = ticket.value, "dispatching");

        let dispatch = self
            .custodian
            .dispatch(&ticket.target, ticket.value, &ticket.payload);
        let result = match self.dispatch_timeout {
            Some(limit) => tokio::time::timeout(limit, dispatch)
                .await
                .unwrap_or(Err(CustodianError::TimedOut(limit))),
            None => dispatch.await,
        };

        match result {
            Ok(()) => {
                self.state
                    .lock()
                    .await
                    .record_outcome(index, ExecutionOutcome::Succeeded);
                info!(index, member = %caller.short(), "proposal executed");
                self.events.publish(LedgerEvent::ProposalExecuted {
                    member: *caller,
                    index,
                });
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.state.lock().await.record_outcome(
                    index,
                    ExecutionOutcome::Failed {
                        reason: reason.clone(),
                    },
                );
                warn!(
                    index,
                    member = %caller.short(),
                    %reason,
                    "execution failed, proposal stays closed"
                );
                self.events.publish(LedgerEvent::ProposalExecutionFailed {
                    member: *caller,
                    index,
                    reason: reason.clone(),
                });
                Err(LedgerError::ExecutionFailed(reason))
            }
        }
    }

    // ------------------------------------------------------------------
    // Read accessors (snapshots, never live references)
    // ------------------------------------------------------------------

    /// Committee members in creation order.
    pub async fn members(&self) -> Vec<AccountId> {
        self.state.lock().await.committee().members().to_vec()
    }

    pub async fn quorum(&self) -> u32 {
        self.state.lock().await.committee().quorum()
    }

    pub async fn is_member(&self, identity: &AccountId) -> bool {
        self.state.lock().await.committee().is_member(identity)
    }

    pub async fn transaction_count(&self) -> u64 {
        self.state.lock().await.count()
    }

    pub async fn proposal(&self, index: u64) -> LedgerResult<Proposal> {
        self.state.lock().await.get(index).cloned()
    }

    /// Confirmation count recomputed by scanning every member's flag.
    pub async fn approval_count(&self, index: u64) -> LedgerResult<u32> {
        self.state.lock().await.approval_count(index)
    }

    pub async fn is_confirmed(&self, index: u64, member: &AccountId) -> LedgerResult<bool> {
        self.state.lock().await.is_confirmed(index, member)
    }

    pub async fn balance(&self) -> Result<Amount, CustodianError> {
        self.custodian.balance().await
    }

    /// Capture the durable state.
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock().await;
        debug!(proposals = state.count(), "snapshot captured");
        LedgerSnapshot::capture(&state)
    }
}

fn reject(operation: &str, caller: &AccountId, index: Option<u64>, error: &LedgerError) {
    match error {
        LedgerError::Unauthorized => {
            warn!(operation, caller = %caller.short(), "rejected non-member call");
        }
        _ => {
            debug!(operation, caller = %caller.short(), ?index, %error, "precondition failed");
        }
    }
}
