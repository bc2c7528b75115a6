//! Inspect a raindrop by id and run management actions against it.

use std::sync::Arc;
use std::time::Duration;

use rdx_schemas::{Address, RaindropDetails, TxHash};

use super::{
    apply_receipt, awaiting_receipt, connected_account, in_flight, observe, send,
    CoordinatorError,
};
use crate::contract::{ClientError, ContractClient, ReceiptStatus, WalletSession};
use crate::surface::{add_participants_call, decode_details, details_call, execute_call};
use crate::tx::{TxEvent, TxHandle, TxState};
use crate::validate::{parse_participants, ValidationError};

/// Write actions that share the panel's single slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManageAction {
    /// Free-text address list, split on whitespace and commas.
    AddParticipants { addresses: String },
    Execute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Submitted(TxHash),
    /// Nothing in the list parsed as an address; no call was made.
    NoValidAddresses,
}

pub struct ManagePanel {
    client: Arc<dyn ContractClient>,
    session: Arc<dyn WalletSession>,
    escrow: Address,
    id: Option<String>,
    details: Option<RaindropDetails>,
    read_error: Option<ClientError>,
    action: Option<TxHandle>,
}

impl ManagePanel {
    pub fn new(client: Arc<dyn ContractClient>, session: Arc<dyn WalletSession>, escrow: Address) -> Self {
        Self {
            client,
            session,
            escrow,
            id: None,
            details: None,
            read_error: None,
            action: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Last successfully read snapshot. Kept across failed refreshes.
    pub fn details(&self) -> Option<&RaindropDetails> {
        self.details.as_ref()
    }

    pub fn read_error(&self) -> Option<&ClientError> {
        self.read_error.as_ref()
    }

    pub fn action(&self) -> Option<&TxHandle> {
        self.action.as_ref()
    }

    /// Both action controls share this answer.
    pub fn controls_enabled(&self) -> bool {
        match &self.details {
            Some(d) => !d.is_closed() && !in_flight(self.action.as_ref()),
            None => false,
        }
    }

    /// Select `id` and read its details. An empty id clears the panel
    /// without querying; any other string is queried as-is.
    pub async fn load(&mut self, id: &str) -> Result<(), ClientError> {
        if id.is_empty() {
            self.id = None;
            self.details = None;
            self.read_error = None;
            self.action = None;
            return Ok(());
        }
        if self.id.as_deref() != Some(id) {
            self.details = None;
            self.read_error = None;
            self.action = None;
            self.id = Some(id.to_string());
        }
        self.refresh().await
    }

    /// Re-read details for the selected id. On failure the previous
    /// snapshot stays in place and the error is recorded.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let Some(id) = self.id.as_deref() else {
            return Ok(());
        };
        let call = details_call(self.escrow, id);
        let result = match self.client.read(&call).await {
            Ok(values) => decode_details(&values),
            Err(e) => Err(e),
        };
        match result {
            Ok(d) => {
                tracing::debug!(%id, status = d.status().label(), "details loaded");
                self.details = Some(d);
                self.read_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "details read failed");
                self.read_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Submit `action` for the selected raindrop.
    ///
    /// Refused while the slot is in flight, before details are loaded, or
    /// once the snapshot shows the raindrop executed or cancelled.
    pub async fn submit(&mut self, action: ManageAction) -> Result<ActionOutcome, CoordinatorError> {
        let id = self
            .id
            .clone()
            .ok_or(CoordinatorError::Validation(ValidationError::EmptyId))?;
        if in_flight(self.action.as_ref()) {
            return Err(CoordinatorError::Busy { slot: "action" });
        }
        let details = self.details.as_ref().ok_or(CoordinatorError::DetailsNotLoaded)?;
        if details.is_closed() {
            return Err(CoordinatorError::Closed(details.status()));
        }

        let call = match action {
            ManageAction::AddParticipants { addresses } => {
                let participants = parse_participants(&addresses);
                if participants.is_empty() {
                    tracing::info!(%id, "no valid addresses in participant list");
                    return Ok(ActionOutcome::NoValidAddresses);
                }
                tracing::info!(%id, count = participants.len(), "adding participants");
                add_participants_call(self.escrow, &id, participants)
            }
            ManageAction::Execute => {
                tracing::info!(%id, "executing raindrop");
                execute_call(self.escrow, &id)
            }
        };
        let from = connected_account(self.session.as_ref())?;

        let handle = self.action.insert(TxHandle::new("action"));
        send(self.client.as_ref(), from, &call, handle)
            .await
            .map(ActionOutcome::Submitted)
    }

    /// Apply an action receipt. On the confirmation edge the details are
    /// re-read once; returns whether that refresh happened.
    pub async fn on_action_receipt(&mut self, status: ReceiptStatus) -> Result<bool, CoordinatorError> {
        let handle = self
            .action
            .as_mut()
            .ok_or(CoordinatorError::NothingPending { slot: "action" })?;
        if apply_receipt(handle, status)? {
            // Best-effort: a read failure is recorded, not propagated.
            let _ = self.refresh().await;
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn poll(&mut self) -> Result<(), CoordinatorError> {
        if !awaiting_receipt(self.action.as_ref()) {
            return Ok(());
        }
        if let Some(handle) = self.action.as_mut() {
            if observe(self.client.as_ref(), handle).await? {
                let _ = self.refresh().await;
            }
        }
        Ok(())
    }

    /// Poll every `interval` until the action slot is no longer waiting for
    /// inclusion. Returns the slot's final state.
    pub async fn run_to_completion(&mut self, interval: Duration) -> Result<Option<TxState>, CoordinatorError> {
        loop {
            self.poll().await?;
            if !awaiting_receipt(self.action.as_ref()) {
                return Ok(self.action.as_ref().map(|h| h.state));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Release a slot stuck at the signature prompt.
    pub fn abandon(&mut self) -> Result<(), CoordinatorError> {
        if let Some(handle) = self.action.as_mut() {
            match handle.state {
                TxState::WalletPending => {
                    handle.apply(&TxEvent::Abandon)?;
                    self.action = None;
                }
                TxState::ChainPending => return Err(CoordinatorError::Busy { slot: "action" }),
                _ => {}
            }
        }
        Ok(())
    }
}
