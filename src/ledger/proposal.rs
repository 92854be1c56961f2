//! Proposal records.

use crate::custodian::Amount;
use crate::identity::AccountId;
use serde::{Deserialize, Serialize};

/// One entry in the proposal ledger, identified by its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Member that submitted the proposal.
    pub proposer: AccountId,

    /// Destination identity for the effect.
    pub target: AccountId,

    /// Pooled resource to transfer (may be zero).
    pub value: Amount,

    /// Opaque call description delivered to the target.
    pub payload: Vec<u8>,

    /// Flips false -> true exactly once, before the effect is attempted.
    pub executed: bool,

    /// Members whose confirmation flag is currently set.
    pub confirmations: u32,

    /// What happened when the effect was attempted.
    ///
    /// `None` while pending, and also while a dispatch is in flight.
    #[serde(default)]
    pub outcome: Option<ExecutionOutcome>,
}

/// Result of the one-time effect dispatch.
///
/// Both variants are terminal: a failed proposal stays `executed` and can
/// never be re-armed. A new proposal is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Succeeded,
    Failed { reason: String },
}

impl Proposal {
    pub(crate) fn new(
        proposer: AccountId,
        target: AccountId,
        value: Amount,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            proposer,
            target,
            value,
            payload,
            executed: false,
            confirmations: 0,
            outcome: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.executed
    }

    /// Executed and the custodian reported failure.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Some(ExecutionOutcome::Failed { .. }))
    }

    /// Short status word for display.
    pub fn status(&self) -> &'static str {
        match (self.executed, &self.outcome) {
            (false, _) => "pending",
            (true, None) => "dispatching",
            (true, Some(ExecutionOutcome::Succeeded)) => "executed",
            (true, Some(ExecutionOutcome::Failed { .. })) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> Proposal {
        Proposal::new(
            AccountId::from_label("a"),
            AccountId::from_label("d"),
            5,
            vec![0xde, 0xad],
        )
    }

    #[test]
    fn test_new_proposal_is_pending() {
        let p = proposal();
        assert!(p.is_pending());
        assert_eq!(p.confirmations, 0);
        assert_eq!(p.outcome, None);
        assert_eq!(p.status(), "pending");
    }

    #[test]
    fn test_status_words() {
        let mut p = proposal();
        p.executed = true;
        assert_eq!(p.status(), "dispatching");
        p.outcome = Some(ExecutionOutcome::Succeeded);
        assert_eq!(p.status(), "executed");
        assert!(!p.is_failed());
        p.outcome = Some(ExecutionOutcome::Failed {
            reason: "reverted".to_string(),
        });
        assert_eq!(p.status(), "failed");
        assert!(p.is_failed());
    }
}
