//! Shared fixtures for scenario tests.
//!
//! [`PaperWorld`] wires a [`PaperChain`] behind a [`RecordingClient`] and
//! hands out coordinators bound to it. The chain doubles as the wallet
//! session, so the connected account is the paper wallet.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use rdx_chain_paper::types::PaperRaindrop;
use rdx_chain_paper::PaperChain;
use rdx_execution::{CreateFlow, CreateForm, ManagePanel, ScheduleZone};
use rdx_schemas::{Address, RaindropDetails, U256};

mod recording;

pub use recording::{Recorded, RecordingClient};

pub const ESCROW: Address = Address::from_bytes([0xee; 20]);
pub const HOST: Address = Address::from_bytes([0x11; 20]);
pub const TOKEN: Address = Address::from_bytes([0x22; 20]);

pub struct PaperWorld {
    pub chain: Arc<PaperChain>,
    pub client: Arc<RecordingClient>,
}

impl Default for PaperWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperWorld {
    pub fn new() -> Self {
        let chain = Arc::new(PaperChain::new(ESCROW, HOST));
        let client = Arc::new(RecordingClient::new(chain.clone()));
        Self { chain, client }
    }

    /// Schedule input is read as UTC so expectations do not depend on the
    /// host zone.
    pub fn create_flow(&self) -> CreateFlow {
        CreateFlow::new(
            self.client.clone(),
            self.chain.clone(),
            ESCROW,
            ScheduleZone::Named(Tz::UTC),
        )
    }

    pub fn manage_panel(&self) -> ManagePanel {
        ManagePanel::new(self.client.clone(), self.chain.clone(), ESCROW)
    }

    /// Put a raindrop hosted by [`HOST`] straight into escrow storage.
    pub fn seed(&self, id: &str, details: &RaindropDetails) {
        self.chain.insert_raindrop(
            id,
            PaperRaindrop {
                host: details.host,
                token: details.token,
                total_amount: details.total_amount,
                scheduled_at: details.scheduled_at,
                executed: details.executed,
                cancelled: details.cancelled,
                participants: vec![Address::ZERO; details.participant_count as usize],
            },
        );
    }
}

/// A valid form for `id`: 1000 tokens of [`TOKEN`] at 2025-01-01T00:00 UTC.
pub fn create_form(id: &str) -> CreateForm {
    CreateForm {
        id: id.to_string(),
        token: TOKEN.to_string(),
        amount: "1000".to_string(),
        scheduled_at: "2025-01-01T00:00".to_string(),
    }
}

/// An open raindrop hosted by [`HOST`].
pub fn open_details() -> RaindropDetails {
    RaindropDetails {
        host: HOST,
        token: TOKEN,
        total_amount: U256::from(1_000_000_000_000_000_000_000u128),
        scheduled_at: 1_735_689_600,
        executed: false,
        cancelled: false,
        participant_count: 0,
    }
}

/// Load a details fixture written as JSON.
pub fn load_details_json(path: &str) -> Result<RaindropDetails> {
    let s = fs::read_to_string(path).with_context(|| format!("read details fixture: {path}"))?;
    let details: RaindropDetails = serde_json::from_str(&s).context("parse details json")?;
    Ok(details)
}
