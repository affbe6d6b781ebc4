//! Background release of expired cart reservations.

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{services::reservation_service::sweep_expired_reservations, state::AppState};

pub fn spawn(state: AppState) -> JoinHandle<()> {
    let period = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(every_secs = period.as_secs(), "reservation sweeper started");

        loop {
            ticker.tick().await;
            match sweep_expired_reservations(&state).await {
                Ok(report) if report.is_empty() => {}
                Ok(report) => tracing::info!(
                    released = report.released,
                    promoted_orders = report.promoted_orders,
                    promoted_cart_items = report.promoted_cart_items,
                    pruned_sessions = report.pruned_sessions,
                    "reservations swept"
                ),
                Err(err) => tracing::warn!(error = %err, "reservation sweep failed"),
            }
        }
    })
}
