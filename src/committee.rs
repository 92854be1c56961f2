//! Committee registry.
//!
//! The committee is a frozen value: the member list and quorum are validated
//! once at construction and never change afterwards. There is deliberately no
//! add/remove-member operation.

use crate::error::{LedgerError, LedgerResult};
use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed committee of members plus the confirmation threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committee {
    /// Members in creation order.
    members: Vec<AccountId>,
    /// Member -> column in the confirmation matrix.
    positions: HashMap<AccountId, usize>,
    quorum: u32,
}

impl Committee {
    /// Validate and freeze a committee.
    ///
    /// Fails with `InvalidConfiguration` if the list is empty, contains the
    /// zero identity or a duplicate, or if `quorum` is outside `1..=len`.
    pub fn new(members: Vec<AccountId>, quorum: u32) -> LedgerResult<Self> {
        if members.is_empty() {
            return Err(LedgerError::InvalidConfiguration(
                "committee requires at least one member".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(members.len());
        for (position, member) in members.iter().enumerate() {
            if member.is_zero() {
                return Err(LedgerError::InvalidConfiguration(format!(
                    "member {} is the zero identity",
                    position
                )));
            }
            if positions.insert(*member, position).is_some() {
                return Err(LedgerError::InvalidConfiguration(format!(
                    "duplicate member {}",
                    member
                )));
            }
        }

        if quorum == 0 || quorum as usize > members.len() {
            return Err(LedgerError::InvalidConfiguration(format!(
                "quorum {} outside 1..={}",
                quorum,
                members.len()
            )));
        }

        Ok(Self {
            members,
            positions,
            quorum,
        })
    }

    pub fn is_member(&self, identity: &AccountId) -> bool {
        self.positions.contains_key(identity)
    }

    pub fn quorum(&self) -> u32 {
        self.quorum
    }

    /// Members in creation order.
    pub fn members(&self) -> &[AccountId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a constructed committee.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Column of `identity` in the confirmation matrix.
    pub(crate) fn position(&self, identity: &AccountId) -> Option<usize> {
        self.positions.get(identity).copied()
    }

    /// Authorization gate run first by every privileged operation.
    pub(crate) fn authorize(&self, caller: &AccountId) -> LedgerResult<usize> {
        self.position(caller).ok_or(LedgerError::Unauthorized)
    }

    pub fn to_record(&self) -> CommitteeRecord {
        CommitteeRecord {
            members: self.members.clone(),
            quorum: self.quorum,
        }
    }
}

/// Write-once durable form of the committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeRecord {
    pub members: Vec<AccountId>,
    pub quorum: u32,
}

impl TryFrom<CommitteeRecord> for Committee {
    type Error = LedgerError;

    fn try_from(record: CommitteeRecord) -> Result<Self, Self::Error> {
        Committee::new(record.members, record.quorum)
    }
}
