//! Ledger notifications.
//!
//! Every state transition publishes one event to a broadcast bus. External
//! subscribers read them as an async stream or drain them synchronously.
//! A slow subscriber never blocks the vault: once it falls more than the bus
//! capacity behind, it skips the missed events.

use crate::custodian::Amount;
use crate::identity::AccountId;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Deposited {
        sender: AccountId,
        amount: Amount,
        balance: Amount,
    },
    ProposalSubmitted {
        proposer: AccountId,
        index: u64,
        target: AccountId,
        value: Amount,
        payload: Vec<u8>,
    },
    ConfirmationRecorded {
        member: AccountId,
        index: u64,
    },
    ConfirmationWithdrawn {
        member: AccountId,
        index: u64,
    },
    ProposalExecuted {
        member: AccountId,
        index: u64,
    },
    /// The proposal is marked executed but its effect failed.
    ProposalExecutionFailed {
        member: AccountId,
        index: u64,
        reason: String,
    },
}

impl LedgerEvent {
    /// Identity that caused the event.
    pub fn actor(&self) -> &AccountId {
        match self {
            Self::Deposited { sender, .. } => sender,
            Self::ProposalSubmitted { proposer, .. } => proposer,
            Self::ConfirmationRecorded { member, .. }
            | Self::ConfirmationWithdrawn { member, .. }
            | Self::ProposalExecuted { member, .. }
            | Self::ProposalExecutionFailed { member, .. } => member,
        }
    }

    /// Proposal the event refers to, if any.
    pub fn proposal_index(&self) -> Option<u64> {
        match self {
            Self::Deposited { .. } => None,
            Self::ProposalSubmitted { index, .. }
            | Self::ConfirmationRecorded { index, .. }
            | Self::ConfirmationWithdrawn { index, .. }
            | Self::ProposalExecuted { index, .. }
            | Self::ProposalExecutionFailed { index, .. } => Some(*index),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deposited { .. } => "Deposited",
            Self::ProposalSubmitted { .. } => "ProposalSubmitted",
            Self::ConfirmationRecorded { .. } => "ConfirmationRecorded",
            Self::ConfirmationWithdrawn { .. } => "ConfirmationWithdrawn",
            Self::ProposalExecuted { .. } => "ProposalExecuted",
            Self::ProposalExecutionFailed { .. } => "ProposalExecutionFailed",
        }
    }
}

/// Broadcast bus shared by a vault and its subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every current subscriber. No subscribers is not an error.
    pub fn publish(&self, event: LedgerEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A subscription that sees every event published after it was created.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: broadcast::Receiver<LedgerEvent>,
}

impl EventSubscription {
    /// Take every event already published, without waiting.
    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged");
                }
                Err(_) => break,
            }
        }
        events
    }

    pub fn into_stream(self) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.receiver),
        }
    }
}

/// Async stream of ledger events. Ends when the vault is dropped.
pub struct EventStream {
    inner: BroadcastStream<LedgerEvent>,
}

impl Stream for EventStream {
    type Item = LedgerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "event stream lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
