//! Property-based tests for the ledger state machine
//!
//! Random operation sequences from members and outsiders, checked after
//! every step against:
//! - counter == matrix row count, for every proposal
//! - executed never goes true -> false
//! - begin_execution succeeds iff the pending proposal has quorum
//! - failed operations leave the state untouched

use super::state::LedgerState;
use crate::committee::Committee;
use crate::error::LedgerError;
use crate::identity::AccountId;
use proptest::prelude::*;

const MEMBERS: u8 = 4;

#[derive(Debug, Clone)]
enum Op {
    Submit { caller: u8 },
    Confirm { caller: u8, index: u64 },
    Revoke { caller: u8, index: u64 },
    Execute { caller: u8, index: u64 },
}

fn account(id: u8) -> AccountId {
    AccountId::from_bytes([id + 1; 32])
}

// Callers 0..MEMBERS are members, the rest are outsiders.
fn arb_op() -> impl Strategy<Value = Op> {
    let caller = 0u8..MEMBERS + 2;
    let index = 0u64..6;
    prop_oneof![
        caller.clone().prop_map(|caller| Op::Submit { caller }),
        (caller.clone(), index.clone()).prop_map(|(caller, index)| Op::Confirm { caller, index }),
        (caller.clone(), index.clone()).prop_map(|(caller, index)| Op::Revoke { caller, index }),
        (caller, index).prop_map(|(caller, index)| Op::Execute { caller, index }),
    ]
}

fn new_state(quorum: u32) -> LedgerState {
    let members = (0..MEMBERS).map(account).collect();
    LedgerState::new(Committee::new(members, quorum).unwrap())
}

fn apply(state: &mut LedgerState, op: &Op) -> Result<(), LedgerError> {
    match op {
        Op::Submit { caller } => state
            .submit(&account(*caller), account(200), 1, vec![*caller])
            .map(|_| ()),
        Op::Confirm { caller, index } => state.confirm(&account(*caller), *index).map(|_| ()),
        Op::Revoke { caller, index } => state.revoke(&account(*caller), *index).map(|_| ()),
        Op::Execute { caller, index } => state
            .begin_execution(&account(*caller), *index)
            .map(|_| ()),
    }
}

proptest! {
    /// Property: counter equals matrix count after every operation
    #[test]
    fn counter_matches_matrix(
        quorum in 1u32..=MEMBERS as u32,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let mut state = new_state(quorum);
        for op in &ops {
            let _ = apply(&mut state, op);
            prop_assert_eq!(state.first_inconsistency(), None, "after {:?}", op);
            for index in 0..state.count() {
                prop_assert_eq!(
                    state.get(index).unwrap().confirmations,
                    state.approval_count(index).unwrap()
                );
            }
        }
    }

    /// Property: executed is monotonic
    #[test]
    fn executed_never_reverts(
        quorum in 1u32..=MEMBERS as u32,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let mut state = new_state(quorum);
        for op in &ops {
            let before: Vec<bool> = state.proposals().iter().map(|p| p.executed).collect();
            let _ = apply(&mut state, op);
            for (i, was_executed) in before.iter().enumerate() {
                if *was_executed {
                    prop_assert!(state.proposals()[i].executed);
                }
            }
        }
    }

    /// Property: execution succeeds iff quorum is met at call time
    #[test]
    fn execution_iff_quorum(
        quorum in 1u32..=MEMBERS as u32,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let mut state = new_state(quorum);
        for op in &ops {
            if let Op::Execute { caller, index } = op {
                let eligible = *caller < MEMBERS
                    && state
                        .get(*index)
                        .map(|p| !p.executed && p.confirmations >= quorum)
                        .unwrap_or(false);
                let result = state.begin_execution(&account(*caller), *index);
                prop_assert_eq!(result.is_ok(), eligible);
            } else {
                let _ = apply(&mut state, op);
            }
        }
    }

    /// Property: a rejected operation mutates nothing
    #[test]
    fn failures_leave_state_unchanged(
        quorum in 1u32..=MEMBERS as u32,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let mut state = new_state(quorum);
        for op in &ops {
            let before = state.clone();
            if apply(&mut state, op).is_err() {
                prop_assert_eq!(state.proposals(), before.proposals());
                prop_assert_eq!(state.matrix(), before.matrix());
            }
        }
    }

    /// Property: confirm then revoke restores the prior count
    #[test]
    fn confirm_revoke_roundtrip(
        caller in 0u8..MEMBERS,
        others in prop::collection::btree_set(0u8..MEMBERS, 0..MEMBERS as usize),
    ) {
        let mut state = new_state(MEMBERS as u32);
        state.submit(&account(0), account(200), 0, vec![]).unwrap();
        for other in others.iter().filter(|o| **o != caller) {
            state.confirm(&account(*other), 0).unwrap();
        }

        let before = state.get(0).unwrap().confirmations;
        state.confirm(&account(caller), 0).unwrap();
        state.revoke(&account(caller), 0).unwrap();

        prop_assert_eq!(state.get(0).unwrap().confirmations, before);
        prop_assert!(!state.is_confirmed(0, &account(caller)).unwrap());
    }
}
