use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Periodically expire bookings whose holds lapsed without payment.
/// Runs until the task is aborted.
pub async fn run_hold_sweeper(state: AppState, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = every.as_secs(), "hold sweeper started");

    loop {
        ticker.tick().await;
        sweep_once(&state).await;
    }
}

pub async fn sweep_once(state: &AppState) -> usize {
    match state.manager.sweep_expired_holds().await {
        Ok(0) => {
            debug!("hold sweep found nothing to expire");
            0
        }
        Ok(expired) => {
            state.metrics.expirations.inc_by(expired as u64);
            info!(expired, "hold sweep expired bookings");
            expired
        }
        Err(e) => {
            error!(error = %e, "hold sweep failed");
            0
        }
    }
}
