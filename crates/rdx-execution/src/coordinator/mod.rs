//! Sequenced transaction coordinators.
//!
//! Two flows share the same machinery:
//!
//! - [`CreateFlow`]: approval (prerequisite) → creation (dependent) → read
//!   refresh. The creation write is only ever issued from the approval's
//!   confirmation edge, and at most once per approval.
//! - [`ManagePanel`]: one shared action slot (add participants / execute),
//!   refused while in flight or once the raindrop is closed; each confirmed
//!   action triggers exactly one read refresh.
//!
//! All chain access goes through the injected [`ContractClient`]; the wallet
//! session is only ever read.

mod create;
mod manage;

pub use create::{CreateFlow, CreateForm, CreatePhase, DistributionIntent};
pub use manage::{ActionOutcome, ManageAction, ManagePanel};

use std::fmt;

use rdx_schemas::{Address, RaindropStatus, TxHash};

use crate::contract::{ClientError, ContractCall, ContractClient, WalletSession};
use crate::tx::{FailureKind, TransitionError, TxEvent, TxFailure, TxHandle, TxState};
use crate::validate::ValidationError;

// ---------------------------------------------------------------------------
// CoordinatorError
// ---------------------------------------------------------------------------

/// Why a coordinator operation did not go ahead (or did not finish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Local input problem; nothing was sent.
    Validation(ValidationError),
    NotConnected,
    /// A slot of this flow is already in flight.
    Busy { slot: &'static str },
    /// No details snapshot yet, so closed-ness is unknown.
    DetailsNotLoaded,
    /// The raindrop no longer accepts writes.
    Closed(RaindropStatus),
    /// The dependent step was requested without a confirmed prerequisite.
    PrerequisiteNotConfirmed,
    /// A receipt arrived for a slot with nothing broadcast.
    NothingPending { slot: &'static str },
    Client(ClientError),
    Transition(TransitionError),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::Validation(e) => write!(f, "invalid input: {e}"),
            CoordinatorError::NotConnected => write!(f, "connect a wallet first"),
            CoordinatorError::Busy { slot } => write!(f, "{slot} transaction already in flight"),
            CoordinatorError::DetailsNotLoaded => {
                write!(f, "raindrop details have not been loaded")
            }
            CoordinatorError::Closed(status) => {
                write!(f, "raindrop is {} and accepts no further actions", status.label())
            }
            CoordinatorError::PrerequisiteNotConfirmed => {
                write!(f, "approval has not been confirmed")
            }
            CoordinatorError::NothingPending { slot } => {
                write!(f, "no {slot} transaction awaiting confirmation")
            }
            CoordinatorError::Client(e) => write!(f, "{e}"),
            CoordinatorError::Transition(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CoordinatorError {}

impl From<ValidationError> for CoordinatorError {
    fn from(e: ValidationError) -> Self {
        CoordinatorError::Validation(e)
    }
}

impl From<ClientError> for CoordinatorError {
    fn from(e: ClientError) -> Self {
        CoordinatorError::Client(e)
    }
}

impl From<TransitionError> for CoordinatorError {
    fn from(e: TransitionError) -> Self {
        CoordinatorError::Transition(e)
    }
}

// ---------------------------------------------------------------------------
// Shared slot helpers
// ---------------------------------------------------------------------------

fn failure_from(err: &ClientError) -> TxFailure {
    TxFailure {
        kind: if err.is_wallet_rejection() {
            FailureKind::WalletRejected
        } else {
            FailureKind::Network
        },
        message: err.to_string(),
    }
}

fn connected_account(session: &dyn WalletSession) -> Result<Address, CoordinatorError> {
    session.account().ok_or(CoordinatorError::NotConnected)
}

/// Drive a fresh handle through signature and broadcast.
///
/// If the returned future is dropped while the wallet is prompting, the
/// handle is left in `WalletPending`; the owning flow's `abandon` clears it.
async fn send(
    client: &dyn ContractClient,
    from: Address,
    call: &ContractCall,
    handle: &mut TxHandle,
) -> Result<TxHash, CoordinatorError> {
    handle.apply(&TxEvent::Submit)?;
    match client.write(from, call).await {
        Ok(hash) => {
            handle.apply(&TxEvent::Signed { hash })?;
            tracing::info!(slot = handle.label, %hash, function = call.function.name, "broadcast");
            Ok(hash)
        }
        Err(e) => {
            handle.apply(&TxEvent::Failed(failure_from(&e)))?;
            tracing::warn!(slot = handle.label, error = %e, "write failed");
            Err(CoordinatorError::Client(e))
        }
    }
}

/// Query the receipt of a broadcast handle and apply it.
///
/// Returns `Ok(true)` on the edge into `Confirmed`. A failed lookup is
/// terminal for the handle and is also returned as an error.
async fn observe(client: &dyn ContractClient, handle: &mut TxHandle) -> Result<bool, CoordinatorError> {
    let hash = match (handle.state, handle.hash) {
        (TxState::ChainPending, Some(h)) => h,
        _ => return Err(CoordinatorError::NothingPending { slot: handle.label }),
    };
    match client.receipt(hash).await {
        Ok(status) => apply_receipt(handle, status),
        Err(e) => {
            handle.apply(&TxEvent::Failed(failure_from(&e)))?;
            tracing::warn!(slot = handle.label, %hash, error = %e, "receipt lookup failed");
            Err(CoordinatorError::Client(e))
        }
    }
}

fn apply_receipt(
    handle: &mut TxHandle,
    status: crate::contract::ReceiptStatus,
) -> Result<bool, CoordinatorError> {
    let changed = handle.apply(&TxEvent::Mined(status))?;
    if !changed {
        return Ok(false);
    }
    match handle.state {
        TxState::Confirmed => {
            tracing::info!(slot = handle.label, hash = ?handle.hash, "confirmed");
            Ok(true)
        }
        TxState::Failed => {
            tracing::warn!(slot = handle.label, hash = ?handle.hash, "reverted");
            Ok(false)
        }
        _ => Ok(false),
    }
}

fn awaiting_receipt(handle: Option<&TxHandle>) -> bool {
    handle.map(|h| h.state == TxState::ChainPending).unwrap_or(false)
}

fn in_flight(handle: Option<&TxHandle>) -> bool {
    handle.map(|h| h.state.is_in_flight()).unwrap_or(false)
}
