//! `raindrop details`, `add-participants` and `execute`.

use anyhow::{bail, Context, Result};
use rdx_execution::{ActionOutcome, ManageAction, ManagePanel, TxState};

use super::{print_details, Client};

fn panel(client: &Client) -> ManagePanel {
    ManagePanel::new(
        client.rpc.clone(),
        client.rpc.clone(),
        client.config.contracts.escrow,
    )
}

pub async fn details(config_paths: &[String], id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("INPUT_INVALID: raindrop id is required");
    }
    let client = Client::load(config_paths)?;
    let mut panel = panel(&client);
    panel
        .load(id)
        .await
        .with_context(|| format!("details read failed for '{id}'"))?;

    match panel.details() {
        Some(d) if d.is_empty() => println!("id={id} found=false"),
        Some(d) => print_details(id, d),
        None => {}
    }
    Ok(())
}

pub async fn act(config_paths: &[String], id: &str, action: ManageAction) -> Result<()> {
    if id.is_empty() {
        bail!("INPUT_INVALID: raindrop id is required");
    }
    let client = Client::load(config_paths)?;
    let mut panel = panel(&client);
    panel
        .load(id)
        .await
        .with_context(|| format!("details read failed for '{id}'"))?;
    if panel.details().is_some_and(|d| d.is_empty()) {
        bail!("RAINDROP_NOT_FOUND: id={id}");
    }

    client.connect().await?;

    match panel.submit(action).await.context("action refused")? {
        ActionOutcome::NoValidAddresses => {
            println!("submitted=false notice=\"no valid addresses\"");
            return Ok(());
        }
        ActionOutcome::Submitted(_) => {}
    }
    if let Some(h) = panel.action() {
        client.print_tx(h);
    }

    let state = panel
        .run_to_completion(client.poll_interval())
        .await
        .context("action failed")?;
    if state != Some(TxState::Confirmed) {
        let reason = panel
            .action()
            .and_then(|h| h.failure.as_ref())
            .map(|f| f.message.clone())
            .unwrap_or_else(|| format!("{state:?}"));
        bail!("ACTION_FAILED: {reason}");
    }
    println!("confirmed=true");

    match (panel.details(), panel.read_error()) {
        (_, Some(e)) => eprintln!("WARN: details refresh failed: {e}"),
        (Some(d), None) => print_details(id, d),
        (None, None) => {}
    }
    Ok(())
}
