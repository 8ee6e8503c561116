//! Periodic liveness log.

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;

use crate::{domain::RoomStats, usecase::SessionBroker};

/// Log room counters every `period` until the task is aborted.
pub async fn heartbeat_loop(broker: Arc<SessionBroker>, period: Duration) {
    run_heartbeat(broker, period, |stats| {
        tracing::info!(
            "Server heartbeat - Users: {}, Messages: {}",
            stats.users,
            stats.messages
        );
    })
    .await
}

/// Hand the room counters to `on_beat` once per `period`, starting one period in.
async fn run_heartbeat<F>(broker: Arc<SessionBroker>, period: Duration, mut on_beat: F)
where
    F: FnMut(RoomStats),
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        on_beat(broker.stats().await);
    }
}
