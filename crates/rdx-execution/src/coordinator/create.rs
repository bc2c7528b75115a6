//! Approve → create → refresh.

use std::sync::Arc;
use std::time::Duration;

use rdx_schemas::{Address, RaindropDetails, TxHash, U256};

use super::{
    apply_receipt, awaiting_receipt, connected_account, observe, send,
    CoordinatorError,
};
use crate::contract::{ClientError, ContractClient, ReceiptStatus, WalletSession};
use crate::surface::{approve_call, create_call, decode_details, details_call};
use crate::tx::{TxEvent, TxFailure, TxHandle, TxState};
use crate::units::{parse_units, TOKEN_DECIMALS};
use crate::validate::{parse_address, validate_id, ScheduleZone, ValidationError};

// ---------------------------------------------------------------------------
// Form → intent
// ---------------------------------------------------------------------------

/// Raw user input for a new raindrop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub id: String,
    pub token: String,
    /// Decimal token amount, e.g. `"1000"` or `"12.5"`.
    pub amount: String,
    /// Calendar date-time, e.g. `"2025-01-01T00:00"`.
    pub scheduled_at: String,
}

/// A validated, immutable creation request. Captured once when the approval
/// is submitted; the creation call is always built from this snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionIntent {
    pub id: String,
    pub token: Address,
    /// Base units (`amount × 10^18`).
    pub amount: U256,
    /// Unix seconds.
    pub scheduled_at: u64,
}

impl DistributionIntent {
    pub fn from_form(form: &CreateForm, zone: &ScheduleZone) -> Result<Self, ValidationError> {
        Ok(Self {
            id: validate_id(&form.id)?,
            token: parse_address("token", &form.token)?,
            amount: parse_units(&form.amount, TOKEN_DECIMALS)?,
            scheduled_at: zone.timestamp(&form.scheduled_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// CreatePhase
// ---------------------------------------------------------------------------

/// Coarse progress of the flow, used for the submit button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    Ready,
    RequestingApproval,
    ConfirmingApproval,
    /// Approval confirmed but the creation write was never sent (for
    /// example the wallet disconnected in between). Retry with
    /// [`CreateFlow::submit_dependent`].
    ReadyToCreate,
    Creating,
    Finalizing,
    Created,
    Failed,
}

impl CreatePhase {
    pub fn label(&self) -> &'static str {
        match self {
            CreatePhase::RequestingApproval => "Requesting Approval...",
            CreatePhase::ConfirmingApproval => "Confirming Approval...",
            CreatePhase::ReadyToCreate => "Create Raindrop",
            CreatePhase::Creating => "Creating Raindrop...",
            CreatePhase::Finalizing => "Finalizing Transaction...",
            CreatePhase::Ready | CreatePhase::Created | CreatePhase::Failed => {
                "Approve & Create Raindrop"
            }
        }
    }

    /// True while the submit control must stay disabled.
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            CreatePhase::Ready
                | CreatePhase::ReadyToCreate
                | CreatePhase::Created
                | CreatePhase::Failed
        )
    }
}

// ---------------------------------------------------------------------------
// CreateFlow
// ---------------------------------------------------------------------------

pub struct CreateFlow {
    client: Arc<dyn ContractClient>,
    session: Arc<dyn WalletSession>,
    escrow: Address,
    zone: ScheduleZone,
    intent: Option<DistributionIntent>,
    approval: Option<TxHandle>,
    creation: Option<TxHandle>,
    /// One-shot guard: set before the creation write is awaited.
    dependent_fired: bool,
    /// Why the last creation attempt stopped before anything was sent.
    dependent_error: Option<CoordinatorError>,
    details: Option<RaindropDetails>,
    read_error: Option<ClientError>,
}

impl CreateFlow {
    pub fn new(
        client: Arc<dyn ContractClient>,
        session: Arc<dyn WalletSession>,
        escrow: Address,
        zone: ScheduleZone,
    ) -> Self {
        Self {
            client,
            session,
            escrow,
            zone,
            intent: None,
            approval: None,
            creation: None,
            dependent_fired: false,
            dependent_error: None,
            details: None,
            read_error: None,
        }
    }

    pub fn phase(&self) -> CreatePhase {
        if let Some(c) = &self.creation {
            return match c.state {
                TxState::Idle | TxState::WalletPending => CreatePhase::Creating,
                TxState::ChainPending => CreatePhase::Finalizing,
                TxState::Confirmed => CreatePhase::Created,
                TxState::Failed => CreatePhase::Failed,
            };
        }
        match self.approval.as_ref().map(|a| a.state) {
            None => CreatePhase::Ready,
            Some(TxState::Idle) | Some(TxState::WalletPending) => CreatePhase::RequestingApproval,
            Some(TxState::ChainPending) => CreatePhase::ConfirmingApproval,
            Some(TxState::Confirmed) => CreatePhase::ReadyToCreate,
            Some(TxState::Failed) => CreatePhase::Failed,
        }
    }

    pub fn intent(&self) -> Option<&DistributionIntent> {
        self.intent.as_ref()
    }

    pub fn approval(&self) -> Option<&TxHandle> {
        self.approval.as_ref()
    }

    pub fn creation(&self) -> Option<&TxHandle> {
        self.creation.as_ref()
    }

    /// Details read after the creation confirmed.
    pub fn details(&self) -> Option<&RaindropDetails> {
        self.details.as_ref()
    }

    pub fn read_error(&self) -> Option<&ClientError> {
        self.read_error.as_ref()
    }

    /// Set while the phase is [`CreatePhase::ReadyToCreate`] after a
    /// creation attempt was refused locally.
    pub fn dependent_error(&self) -> Option<&CoordinatorError> {
        self.dependent_error.as_ref()
    }

    /// The first failure of the flow, approval before creation.
    pub fn failure(&self) -> Option<&TxFailure> {
        self.approval
            .as_ref()
            .and_then(|h| h.failure.as_ref())
            .or_else(|| self.creation.as_ref().and_then(|h| h.failure.as_ref()))
    }

    /// Validate `form`, capture it as the flow's intent and request the
    /// token approval (`approve(escrow, amount)`).
    ///
    /// Validation runs before anything else touches the wallet or network.
    /// Any previous terminal run is discarded.
    pub async fn submit_prerequisite(&mut self, form: &CreateForm) -> Result<TxHash, CoordinatorError> {
        if self.phase().is_busy() {
            return Err(CoordinatorError::Busy {
                slot: if self.creation.is_some() || self.dependent_fired {
                    "creation"
                } else {
                    "approval"
                },
            });
        }
        let intent = DistributionIntent::from_form(form, &self.zone)?;
        let from = connected_account(self.session.as_ref())?;

        tracing::info!(
            id = %intent.id,
            token = %intent.token,
            amount = %intent.amount,
            scheduled_at = intent.scheduled_at,
            "requesting approval"
        );

        let call = approve_call(intent.token, self.escrow, intent.amount);
        self.intent = Some(intent);
        self.creation = None;
        self.dependent_fired = false;
        self.dependent_error = None;
        self.details = None;
        self.read_error = None;

        let handle = self.approval.insert(TxHandle::new("approval"));
        send(self.client.as_ref(), from, &call, handle).await
    }

    /// Apply an approval receipt. On the confirmation edge the creation
    /// write is submitted and its hash returned.
    pub async fn on_prerequisite_receipt(
        &mut self,
        status: ReceiptStatus,
    ) -> Result<Option<TxHash>, CoordinatorError> {
        let handle = self
            .approval
            .as_mut()
            .ok_or(CoordinatorError::NothingPending { slot: "approval" })?;
        if apply_receipt(handle, status)? {
            return self.submit_dependent().await.map(Some);
        }
        Ok(None)
    }

    /// Issue `createRaindrop` from the captured intent.
    ///
    /// Refused unless the approval is confirmed and the creation has not
    /// already been issued for it. A refusal after the approval confirmed
    /// (no connected account) leaves the flow in
    /// [`CreatePhase::ReadyToCreate`] with the error kept in
    /// [`CreateFlow::dependent_error`], so this call can simply be retried.
    pub async fn submit_dependent(&mut self) -> Result<TxHash, CoordinatorError> {
        let confirmed = self
            .approval
            .as_ref()
            .map(|a| a.state == TxState::Confirmed)
            .unwrap_or(false);
        if !confirmed {
            return Err(CoordinatorError::PrerequisiteNotConfirmed);
        }
        if self.dependent_fired {
            return Err(CoordinatorError::Busy { slot: "creation" });
        }
        let intent = self
            .intent
            .as_ref()
            .ok_or(CoordinatorError::PrerequisiteNotConfirmed)?;
        let from = match connected_account(self.session.as_ref()) {
            Ok(from) => from,
            Err(e) => {
                tracing::warn!(id = %intent.id, error = %e, "creation not sent");
                self.dependent_error = Some(e.clone());
                return Err(e);
            }
        };

        let call = create_call(
            self.escrow,
            &intent.id,
            intent.token,
            intent.amount,
            intent.scheduled_at,
        );
        self.dependent_fired = true;
        self.dependent_error = None;
        let handle = self.creation.insert(TxHandle::new("creation"));
        send(self.client.as_ref(), from, &call, handle).await
    }

    /// Apply a creation receipt. On the confirmation edge the details are
    /// re-read once; returns whether that refresh happened.
    pub async fn on_dependent_receipt(&mut self, status: ReceiptStatus) -> Result<bool, CoordinatorError> {
        let handle = self
            .creation
            .as_mut()
            .ok_or(CoordinatorError::NothingPending { slot: "creation" })?;
        if apply_receipt(handle, status)? {
            self.refresh().await;
            return Ok(true);
        }
        Ok(false)
    }

    /// Check whichever slot is waiting for inclusion and advance the flow.
    pub async fn poll(&mut self) -> Result<(), CoordinatorError> {
        if awaiting_receipt(self.approval.as_ref()) {
            if let Some(handle) = self.approval.as_mut() {
                if observe(self.client.as_ref(), handle).await? {
                    self.submit_dependent().await?;
                }
            }
            return Ok(());
        }
        if awaiting_receipt(self.creation.as_ref()) {
            if let Some(handle) = self.creation.as_mut() {
                if observe(self.client.as_ref(), handle).await? {
                    self.refresh().await;
                }
            }
        }
        Ok(())
    }

    /// Poll every `interval` until nothing is awaiting inclusion. There is
    /// no overall timeout.
    pub async fn run_to_completion(&mut self, interval: Duration) -> Result<CreatePhase, CoordinatorError> {
        loop {
            self.poll().await?;
            if !awaiting_receipt(self.approval.as_ref()) && !awaiting_receipt(self.creation.as_ref()) {
                return Ok(self.phase());
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Drop a signature prompt that never answered. Only legal before
    /// broadcast; the flow returns to `Ready` and can be resubmitted.
    pub fn abandon(&mut self) -> Result<(), CoordinatorError> {
        for handle in [self.approval.as_mut(), self.creation.as_mut()].into_iter().flatten() {
            if handle.state == TxState::WalletPending {
                handle.apply(&TxEvent::Abandon)?;
            } else if handle.state == TxState::ChainPending {
                return Err(CoordinatorError::Busy { slot: handle.label });
            }
        }
        tracing::info!("create flow abandoned");
        self.intent = None;
        self.approval = None;
        self.creation = None;
        self.dependent_fired = false;
        self.dependent_error = None;
        Ok(())
    }

    async fn refresh(&mut self) {
        let Some(intent) = self.intent.as_ref() else {
            return;
        };
        let call = details_call(self.escrow, &intent.id);
        let result = match self.client.read(&call).await {
            Ok(values) => decode_details(&values),
            Err(e) => Err(e),
        };
        match result {
            Ok(d) => {
                self.details = Some(d);
                self.read_error = None;
            }
            Err(e) => {
                tracing::warn!(id = %intent.id, error = %e, "details refresh failed");
                self.read_error = Some(e);
            }
        }
    }
}
