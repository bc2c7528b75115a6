//! `raindrop create`: approve → create → refresh.

use anyhow::{anyhow, bail, Context, Result};
use rdx_execution::{CreateFlow, CreateForm, CreatePhase, DistributionIntent, ScheduleZone};

use super::{print_details, Client};

pub async fn run(config_paths: &[String], form: CreateForm) -> Result<()> {
    let client = Client::load(config_paths)?;
    let zone = ScheduleZone::from_config(client.config.schedule_zone()?);

    // Reject bad input before the node is contacted at all.
    let intent = DistributionIntent::from_form(&form, &zone)
        .map_err(|e| anyhow!("INPUT_INVALID: {e}"))?;
    println!(
        "id={} token={} amount_base_units={} scheduled_at={}",
        intent.id, intent.token, intent.amount, intent.scheduled_at
    );

    client.connect().await?;

    let mut flow = CreateFlow::new(
        client.rpc.clone(),
        client.rpc.clone(),
        client.config.contracts.escrow,
        zone,
    );

    println!("phase={}", CreatePhase::RequestingApproval.label());
    flow.submit_prerequisite(&form)
        .await
        .context("approval request failed")?;
    if let Some(h) = flow.approval() {
        client.print_tx(h);
    }
    println!("phase={}", flow.phase().label());

    let phase = flow
        .run_to_completion(client.poll_interval())
        .await
        .context("create flow failed")?;
    if let Some(h) = flow.creation() {
        client.print_tx(h);
    }

    if phase != CreatePhase::Created {
        let reason = flow
            .failure()
            .map(|f| f.message.clone())
            .or_else(|| {
                flow.dependent_error()
                    .map(|e| format!("approval confirmed but creation not sent: {e}"))
            })
            .unwrap_or_else(|| format!("{phase:?}"));
        bail!("CREATE_FAILED: {reason}");
    }
    println!("created=true");

    match (flow.details(), flow.read_error()) {
        (Some(d), _) => print_details(&intent.id, d),
        (None, Some(e)) => eprintln!("WARN: details refresh failed: {e}"),
        (None, None) => {}
    }
    Ok(())
}
