//! Ledger error taxonomy.
//!
//! Every failure is local and synchronous. Retry policy, if any, belongs to
//! the caller: all of these are input-driven (permission, state precondition,
//! or collaborator failure).

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Construction-time only. No instance is created.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A non-member attempted a privileged operation.
    #[error("caller is not a committee member")]
    Unauthorized,

    #[error("proposal {index} not found (ledger holds {count})")]
    NotFound { index: u64, count: u64 },

    #[error("proposal already executed")]
    AlreadyExecuted,

    #[error("proposal already confirmed by caller")]
    AlreadyConfirmed,

    #[error("proposal not confirmed by caller")]
    NotConfirmed,

    #[error("quorum not met: {confirmations} of {quorum} confirmations")]
    QuorumNotMet { confirmations: u32, quorum: u32 },

    /// The custodian reported failure while performing the effect.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl LedgerError {
    /// Variant name, stable for scripts and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "InvalidConfiguration",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound { .. } => "NotFound",
            Self::AlreadyExecuted => "AlreadyExecuted",
            Self::AlreadyConfirmed => "AlreadyConfirmed",
            Self::NotConfirmed => "NotConfirmed",
            Self::QuorumNotMet { .. } => "QuorumNotMet",
            Self::ExecutionFailed(_) => "ExecutionFailed",
        }
    }
}
