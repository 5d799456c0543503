//! One full probe -> classify -> render -> publish -> persist pass.
//!
//! Cycles run strictly one at a time, so the state file needs no locking.
//! A failed cycle is logged by the caller and must never block the next one.

use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;

use crate::core::doctor::Doctor;
use crate::core::ent::{HealthReading, PersistedState, StatusLevel};
use crate::core::notifier::{Notifier, NotifyError};
use crate::core::probe::Probe;
use crate::core::{presenter, state};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("dashboard publish failed: {0}")]
    Publish(#[from] NotifyError),
    #[error("state persist failed: {0}")]
    Persist(#[from] std::io::Error),
}

/// Built once at startup, read-only afterwards.
pub struct Context {
    pub probe: Probe,
    pub doctor: Doctor,
    pub notifier: Notifier,
    pub state_file: PathBuf,
    pub target_label: String,
}

pub async fn run_cycle(ctx: &Context) -> Result<StatusLevel, CycleError> {
    cycle_with(ctx, None).await
}

/// Final pass on shutdown: publish a forced DOWN state so the dashboard
/// does not go stale silently. No alert; the operator asked for this.
pub async fn run_shutdown_cycle(ctx: &Context) -> Result<StatusLevel, CycleError> {
    cycle_with(ctx, Some(HealthReading::offline())).await
}

async fn cycle_with(
    ctx: &Context,
    forced: Option<HealthReading>,
) -> Result<StatusLevel, CycleError> {
    let state = state::load(&ctx.state_file);
    let shutting_down = forced.is_some();
    let reading = match forced {
        Some(reading) => reading,
        None => ctx.probe.sample().await,
    };
    let status = ctx.doctor.classify(&reading);
    tracing::info!("check {}: {:?}", ctx.target_label, status);

    let payload = presenter::render(status, &reading, &ctx.target_label, Utc::now());
    let message_id = ctx
        .notifier
        .publish(&payload, state.message_id.as_deref())
        .await?;
    if !shutting_down {
        ctx.notifier
            .maybe_alert(status, state.last_status, &payload)
            .await;
    }
    state::save(
        &ctx.state_file,
        &PersistedState {
            message_id: Some(message_id),
            last_status: Some(status),
        },
    )?;
    Ok(status)
}
