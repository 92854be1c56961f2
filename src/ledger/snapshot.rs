//! Durable ledger layout.
//!
//! A snapshot holds exactly the persisted state: the write-once committee,
//! the append-only proposal sequence, and the confirmation matrix. Restoring
//! re-validates the committee and the counter/matrix invariant, so a
//! tampered or truncated file never produces a live vault.

use super::confirmations::ConfirmationMatrix;
use super::proposal::Proposal;
use super::state::LedgerState;
use crate::committee::{Committee, CommitteeRecord};
use crate::error::LedgerError;
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot schema.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub schema_version: u32,
    pub committee: CommitteeRecord,
    pub proposals: Vec<Proposal>,
    /// One row per proposal, one column per member in committee order.
    pub confirmations: Vec<Vec<bool>>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot committee is invalid: {0}")]
    Committee(#[from] LedgerError),

    #[error("snapshot has {proposals} proposals but {rows} confirmation rows")]
    RowCount { proposals: usize, rows: usize },

    #[error("confirmation rows must have {expected} columns")]
    RowWidth { expected: usize },

    #[error("proposal {index} records {recorded} confirmations but matrix holds {actual}")]
    CountMismatch { index: u64, recorded: u32, actual: u32 },

    #[error("proposal {index} has an outcome but is not executed")]
    OutcomeWithoutExecution { index: u64 },
}

impl LedgerSnapshot {
    pub fn capture(state: &LedgerState) -> Self {
        Self {
            schema_version: SNAPSHOT_VERSION,
            committee: state.committee().to_record(),
            proposals: state.proposals().to_vec(),
            confirmations: state.matrix().rows().to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }

    /// Validate and rebuild live state.
    pub fn into_state(self) -> Result<LedgerState, SnapshotError> {
        if self.schema_version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.schema_version));
        }

        let committee = Committee::try_from(self.committee)?;

        if self.proposals.len() != self.confirmations.len() {
            return Err(SnapshotError::RowCount {
                proposals: self.proposals.len(),
                rows: self.confirmations.len(),
            });
        }

        let matrix = ConfirmationMatrix::from_rows(committee.len(), self.confirmations).ok_or(
            SnapshotError::RowWidth {
                expected: committee.len(),
            },
        )?;

        for (row, proposal) in self.proposals.iter().enumerate() {
            let index = row as u64;
            let actual = matrix.count(row);
            if proposal.confirmations != actual {
                return Err(SnapshotError::CountMismatch {
                    index,
                    recorded: proposal.confirmations,
                    actual,
                });
            }
            if !proposal.executed && proposal.outcome.is_some() {
                return Err(SnapshotError::OutcomeWithoutExecution { index });
            }
        }

        Ok(LedgerState::from_parts(committee, self.proposals, matrix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountId;

    fn member(label: &str) -> AccountId {
        AccountId::from_label(label)
    }

    fn populated_state() -> LedgerState {
        let committee = Committee::new(vec![member("a"), member("b"), member("c")], 2).unwrap();
        let mut state = LedgerState::new(committee);
        state.submit(&member("a"), member("d"), 5, vec![7]).unwrap();
        state.submit(&member("b"), member("e"), 0, vec![]).unwrap();
        state.confirm(&member("a"), 0).unwrap();
        state.confirm(&member("c"), 0).unwrap();
        state.confirm(&member("b"), 1).unwrap();
        state
    }

    #[test]
    fn test_capture_and_restore() {
        let state = populated_state();
        let snapshot = LedgerSnapshot::capture(&state);
        let bytes = snapshot.to_bytes().unwrap();

        let restored = LedgerSnapshot::from_bytes(&bytes)
            .unwrap()
            .into_state()
            .unwrap();
        assert_eq!(restored.proposals(), state.proposals());
        assert_eq!(restored.matrix(), state.matrix());
        assert_eq!(restored.committee(), state.committee());
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let mut snapshot = LedgerSnapshot::capture(&populated_state());
        snapshot.proposals[0].confirmations = 3;

        let err = snapshot.into_state().unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::CountMismatch {
                index: 0,
                recorded: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_missing_row_rejected() {
        let mut snapshot = LedgerSnapshot::capture(&populated_state());
        snapshot.confirmations.pop();
        assert!(matches!(
            snapshot.into_state(),
            Err(SnapshotError::RowCount { .. })
        ));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let mut snapshot = LedgerSnapshot::capture(&populated_state());
        snapshot.confirmations[1].push(true);
        assert!(matches!(
            snapshot.into_state(),
            Err(SnapshotError::RowWidth { expected: 3 })
        ));
    }

    #[test]
    fn test_invalid_committee_rejected() {
        let mut snapshot = LedgerSnapshot::capture(&populated_state());
        snapshot.committee.quorum = 4;
        assert!(matches!(
            snapshot.into_state(),
            Err(SnapshotError::Committee(LedgerError::InvalidConfiguration(_)))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut snapshot = LedgerSnapshot::capture(&populated_state());
        snapshot.schema_version = 99;
        assert!(matches!(
            snapshot.into_state(),
            Err(SnapshotError::UnsupportedVersion(99))
        ));
    }
}
