//! Transaction slot state machine.
//!
//! # Design
//!
//! Every write the client issues is tracked by one [`TxHandle`]. Lifecycle
//! events are applied through [`TxHandle::apply`], which enforces:
//!
//! 1. **Legal transitions only.** Illegal events return [`TransitionError`].
//! 2. **Edge reporting.** `apply` returns `Ok(true)` only when the state
//!    actually changed. Coordinators hang their one-shot follow-ups (dependent
//!    submission, read refresh) on that edge, so a duplicate confirmation can
//!    never fire them twice.
//!
//! # State diagram
//!
//! ```text
//!   new()          Submit            Signed{hash}          Mined
//!   ─────► Idle ─────────► WalletPending ─────────► ChainPending ─────► Confirmed (term.)
//!                             │     │                   │
//!                     Abandon │     │ Failed            │ Reverted | Failed
//!                             ▼     ▼                   ▼
//!                           Idle   Failed (term.) ◄─────┘
//! ```
//!
//! Abandon is only legal before broadcast; once a hash exists the
//! transaction is out of the client's hands.

use std::fmt;

use rdx_schemas::TxHash;

use crate::contract::ReceiptStatus;

// ---------------------------------------------------------------------------
// TxState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxState {
    /// Created, nothing requested yet.
    Idle,
    /// Signature requested from the wallet.
    WalletPending,
    /// Broadcast; waiting for inclusion.
    ChainPending,
    /// Included and successful. **Terminal.**
    Confirmed,
    /// Rejected, errored or reverted. **Terminal.**
    Failed,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::WalletPending | Self::ChainPending)
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    WalletRejected,
    Network,
    Reverted,
}

/// Why a handle ended in [`TxState::Failed`]. `message` is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFailure {
    pub kind: FailureKind,
    pub message: String,
}

// ---------------------------------------------------------------------------
// TxEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    /// The wallet was asked to sign.
    Submit,
    /// The wallet signed and the node accepted the transaction.
    Signed { hash: TxHash },
    /// A receipt was observed.
    Mined(ReceiptStatus),
    /// Wallet rejection or transport failure.
    Failed(TxFailure),
    /// The signature prompt was dropped before an answer arrived.
    Abandon,
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: TxState,
    pub event: String,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal transaction transition: {:?} + {}", self.from, self.event)
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// TxHandle
// ---------------------------------------------------------------------------

/// One tracked write.
#[derive(Debug, Clone)]
pub struct TxHandle {
    /// Slot name used in logs ("approval", "creation", "action").
    pub label: &'static str,
    pub state: TxState,
    pub hash: Option<TxHash>,
    pub failure: Option<TxFailure>,
}

impl TxHandle {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: TxState::Idle,
            hash: None,
            failure: None,
        }
    }

    /// Apply `event`. Returns whether the state changed.
    ///
    /// `Mined(Pending)` and a repeated `Mined(Success)` on an already
    /// confirmed handle are accepted as no-ops.
    pub fn apply(&mut self, event: &TxEvent) -> Result<bool, TransitionError> {
        let next = match (self.state, event) {
            (TxState::Idle, TxEvent::Submit) => TxState::WalletPending,

            (TxState::WalletPending, TxEvent::Signed { hash }) => {
                self.hash = Some(*hash);
                TxState::ChainPending
            }
            (TxState::WalletPending, TxEvent::Failed(f)) => {
                self.failure = Some(f.clone());
                TxState::Failed
            }
            (TxState::WalletPending, TxEvent::Abandon) => TxState::Idle,

            (TxState::ChainPending, TxEvent::Mined(ReceiptStatus::Pending)) => return Ok(false),
            (TxState::ChainPending, TxEvent::Mined(ReceiptStatus::Success)) => TxState::Confirmed,
            (TxState::ChainPending, TxEvent::Mined(ReceiptStatus::Reverted)) => {
                self.failure = Some(TxFailure {
                    kind: FailureKind::Reverted,
                    message: "transaction reverted".to_string(),
                });
                TxState::Failed
            }
            (TxState::ChainPending, TxEvent::Failed(f)) => {
                self.failure = Some(f.clone());
                TxState::Failed
            }

            (TxState::Confirmed, TxEvent::Mined(ReceiptStatus::Success)) => return Ok(false),

            (from, ev) => {
                return Err(TransitionError {
                    from,
                    event: format!("{ev:?}"),
                })
            }
        };

        tracing::debug!(
            slot = self.label,
            from = ?self.state,
            to = ?next,
            "tx transition"
        );
        self.state = next;
        Ok(true)
    }
}
