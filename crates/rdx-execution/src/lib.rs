//! rdx-execution
//!
//! Client-side sequencing for the Raindrop escrow.
//! - `units` / `validate`: pure input handling, no I/O
//! - `abi` / `surface`: calldata for the token and escrow functions
//! - `contract`: the async seams every chain adapter implements
//! - `tx`: per-transaction state machine
//! - `coordinator`: approve → create → refresh, and the manage panel
//!
//! Coordinators never talk to the network except through
//! [`ContractClient`]; the wallet session is injected and only read.

pub mod abi;
pub mod contract;
pub mod coordinator;
pub mod surface;
pub mod tx;
pub mod units;
pub mod validate;

#[cfg(test)]
mod testing;

pub use contract::{ClientError, Connector, ContractCall, ContractClient, ReceiptStatus, WalletSession};
pub use coordinator::{
    ActionOutcome, CoordinatorError, CreateFlow, CreateForm, CreatePhase, DistributionIntent,
    ManageAction, ManagePanel,
};
pub use rdx_schemas::U256;
pub use tx::{FailureKind, TxFailure, TxHandle, TxState};
pub use units::{format_units, parse_units, AmountError, TOKEN_DECIMALS};
pub use validate::{is_address, parse_participants, ScheduleZone, ValidationError};
