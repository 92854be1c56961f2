//! Audit trail.
//!
//! Append-only, sequenced record of ledger events. Entries are never removed
//! or rewritten; the sequence number gives a total order even when two
//! entries share a timestamp.

use crate::events::{EventStream, EventSubscription, LedgerEvent};
use crate::identity::AccountId;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Single audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the trail, from zero.
    pub sequence: u64,
    /// Unix timestamp (seconds since epoch) when recorded.
    pub timestamp: u64,
    pub event: LedgerEvent,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<4} {:<24}", self.sequence, self.event.kind())?;
        match &self.event {
            LedgerEvent::Deposited {
                sender,
                amount,
                balance,
            } => write!(
                f,
                " sender={} amount={} balance={}",
                sender.short(),
                amount,
                balance
            ),
            LedgerEvent::ProposalSubmitted {
                proposer,
                index,
                target,
                value,
                payload,
            } => write!(
                f,
                " index={} proposer={} target={} value={} payload={}",
                index,
                proposer.short(),
                target.short(),
                value,
                hex::encode(payload)
            ),
            LedgerEvent::ConfirmationRecorded { member, index }
            | LedgerEvent::ConfirmationWithdrawn { member, index }
            | LedgerEvent::ProposalExecuted { member, index } => {
                write!(f, " index={} member={}", index, member.short())
            }
            LedgerEvent::ProposalExecutionFailed {
                member,
                index,
                reason,
            } => write!(
                f,
                " index={} member={} reason={:?}",
                index,
                member.short(),
                reason
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event with the current timestamp.
    pub fn record(&mut self, event: LedgerEvent) -> &AuditEntry {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let sequence = self.entries.len() as u64;
        self.entries.push(AuditEntry {
            sequence,
            timestamp,
            event,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Append everything a subscription has buffered.
    pub fn record_pending(&mut self, subscription: &mut EventSubscription) -> usize {
        let events = subscription.drain();
        let recorded = events.len();
        for event in events {
            self.record(event);
        }
        recorded
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries about one proposal, in order.
    pub fn for_proposal(&self, index: u64) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.event.proposal_index() == Some(index))
            .collect()
    }

    /// Entries caused by one identity, in order.
    pub fn by_actor(&self, actor: &AccountId) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.event.actor() == actor)
            .collect()
    }
}

/// Record a stream into a shared trail until the stream ends.
pub fn spawn_recorder(mut stream: EventStream) -> (Arc<Mutex<AuditTrail>>, JoinHandle<()>) {
    let trail = Arc::new(Mutex::new(AuditTrail::new()));
    let sink = Arc::clone(&trail);
    let handle = tokio::spawn(async move {
        while let Some(event) = stream.next().await {
            sink.lock().await.record(event);
        }
    });
    (trail, handle)
}
