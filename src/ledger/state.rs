//! Ledger state machine: proposal sequence plus confirmation matrix.
//!
//! Every mutating method runs its precondition checks in a fixed order and
//! returns on the first failure before touching any field:
//! 1. caller is a member (`Unauthorized`)
//! 2. index exists (`NotFound`)
//! 3. proposal not executed (`AlreadyExecuted`)
//! 4. operation-specific check
//!
//! After every successful mutation, each proposal's `confirmations` equals
//! the number of set flags in its matrix row.

use super::confirmations::ConfirmationMatrix;
use super::proposal::{ExecutionOutcome, Proposal};
use crate::committee::Committee;
use crate::custodian::Amount;
use crate::error::{LedgerError, LedgerResult};
use crate::identity::AccountId;

/// The sole mutable state of a vault.
#[derive(Debug, Clone)]
pub struct LedgerState {
    committee: Committee,
    proposals: Vec<Proposal>,
    matrix: ConfirmationMatrix,
}

/// What the execution engine needs to dispatch once the proposal is marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTicket {
    pub index: u64,
    pub target: AccountId,
    pub value: Amount,
    pub payload: Vec<u8>,
}

impl LedgerState {
    pub fn new(committee: Committee) -> Self {
        let matrix = ConfirmationMatrix::new(committee.len());
        Self {
            committee,
            proposals: Vec::new(),
            matrix,
        }
    }

    /// Reassemble from stored parts. Callers validate consistency first.
    pub(crate) fn from_parts(
        committee: Committee,
        proposals: Vec<Proposal>,
        matrix: ConfirmationMatrix,
    ) -> Self {
        Self {
            committee,
            proposals,
            matrix,
        }
    }

    pub fn committee(&self) -> &Committee {
        &self.committee
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn matrix(&self) -> &ConfirmationMatrix {
        &self.matrix
    }

    pub fn count(&self) -> u64 {
        self.proposals.len() as u64
    }

    /// Read-only lookup.
    pub fn get(&self, index: u64) -> LedgerResult<&Proposal> {
        let count = self.count();
        usize::try_from(index)
            .ok()
            .and_then(|i| self.proposals.get(i))
            .ok_or(LedgerError::NotFound { index, count })
    }

    /// Confirmation count recomputed from the matrix, independent of the
    /// maintained counter.
    pub fn approval_count(&self, index: u64) -> LedgerResult<u32> {
        self.get(index)?;
        Ok(self.matrix.count(index as usize))
    }

    /// Whether `member` currently confirms proposal `index`.
    pub fn is_confirmed(&self, index: u64, member: &AccountId) -> LedgerResult<bool> {
        self.get(index)?;
        Ok(self
            .committee
            .position(member)
            .map(|column| self.matrix.get(index as usize, column))
            .unwrap_or(false))
    }

    /// Append a new proposal. Any single member may propose.
    pub fn submit(
        &mut self,
        caller: &AccountId,
        target: AccountId,
        value: Amount,
        payload: Vec<u8>,
    ) -> LedgerResult<u64> {
        self.committee.authorize(caller)?;

        let index = self.count();
        self.proposals.push(Proposal::new(*caller, target, value, payload));
        self.matrix.push_row();
        Ok(index)
    }

    /// Record `caller`'s confirmation. Returns the new count.
    pub fn confirm(&mut self, caller: &AccountId, index: u64) -> LedgerResult<u32> {
        let (row, column) = self.pending_slot(caller, index)?;
        if self.matrix.get(row, column) {
            return Err(LedgerError::AlreadyConfirmed);
        }

        self.matrix.set(row, column, true);
        let proposal = &mut self.proposals[row];
        proposal.confirmations += 1;
        Ok(proposal.confirmations)
    }

    /// Withdraw `caller`'s confirmation. Returns the new count.
    pub fn revoke(&mut self, caller: &AccountId, index: u64) -> LedgerResult<u32> {
        let (row, column) = self.pending_slot(caller, index)?;
        if !self.matrix.get(row, column) {
            return Err(LedgerError::NotConfirmed);
        }

        self.matrix.set(row, column, false);
        let proposal = &mut self.proposals[row];
        proposal.confirmations -= 1;
        Ok(proposal.confirmations)
    }

    /// Check quorum and mark the proposal executed.
    ///
    /// The mark is set here, before any effect is attempted, and is never
    /// cleared. A re-entrant call that reaches this method again for the same
    /// index fails with `AlreadyExecuted`.
    pub fn begin_execution(
        &mut self,
        caller: &AccountId,
        index: u64,
    ) -> LedgerResult<DispatchTicket> {
        let (row, _) = self.pending_slot(caller, index)?;
        let quorum = self.committee.quorum();
        let proposal = &mut self.proposals[row];
        if proposal.confirmations < quorum {
            return Err(LedgerError::QuorumNotMet {
                confirmations: proposal.confirmations,
                quorum,
            });
        }

        proposal.executed = true;
        Ok(DispatchTicket {
            index,
            target: proposal.target,
            value: proposal.value,
            payload: proposal.payload.clone(),
        })
    }

    /// Record how the dispatch ended. `executed` is left untouched.
    pub fn record_outcome(&mut self, index: u64, outcome: ExecutionOutcome) {
        if let Some(proposal) = usize::try_from(index)
            .ok()
            .and_then(|i| self.proposals.get_mut(i))
        {
            proposal.outcome = Some(outcome);
        }
    }

    /// Membership, existence and not-yet-executed checks, in that order.
    fn pending_slot(&self, caller: &AccountId, index: u64) -> LedgerResult<(usize, usize)> {
        let column = self.committee.authorize(caller)?;
        let proposal = self.get(index)?;
        if proposal.executed {
            return Err(LedgerError::AlreadyExecuted);
        }
        Ok((index as usize, column))
    }

    /// Index of the first proposal whose counter disagrees with its matrix row.
    pub fn first_inconsistency(&self) -> Option<u64> {
        self.proposals
            .iter()
            .enumerate()
            .find(|(row, p)| p.confirmations != self.matrix.count(*row))
            .map(|(row, _)| row as u64)
    }
}
