//! Per-transaction lifecycle tracking.

mod state_machine;

pub use state_machine::{FailureKind, TransitionError, TxEvent, TxFailure, TxHandle, TxState};
