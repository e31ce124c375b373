//! Keep-alive — periodic full re-initialization of the device session.
//!
//! The device drops realtime mode and expires tokens on its own schedule.
//! Re-running the complete init sequence on a fixed cadence recovers from
//! both without the driver having to notice. A failed refresh is logged and
//! retried on the next tick; the previous token and link stay in place.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::device::DeviceClient;

/// Spawn the keep-alive task. The first refresh happens one period from now;
/// startup performs its own init.
pub fn spawn_keepalive_task(device: Arc<DeviceClient>, every: Duration) -> JoinHandle<()> {
    info!(every_secs = every.as_secs(), "device keep-alive configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            refresh(&device).await;
        }
    })
}

/// Re-run the device init sequence once. Returns whether it succeeded.
pub async fn refresh(device: &DeviceClient) -> bool {
    match device.init().await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "device keep-alive failed; retrying next period");
            false
        }
    }
}

#[cfg(test)]
#[path = "keepalive_test.rs"]
mod tests;
