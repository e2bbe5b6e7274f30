// Alarm notifier: turns CROSSED_HIGH events into a single user-visible notification each.
// CLEARED only re-arms the alarm; it is logged but not delivered.

use crate::alarm::AlarmEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Spawns the notifier. `delivered` counts notifications sent. Exits when the poller's
/// event channel closes.
pub fn spawn(
    mut events: broadcast::Receiver<AlarmEvent>,
    delivered: Arc<AtomicU64>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AlarmEvent::CrossedHigh { value, limit }) => {
                    tracing::warn!(
                        value,
                        limit,
                        "memory usage crossed limit: {:.1}% > {:.0}%",
                        value,
                        limit
                    );
                    delivered.fetch_add(1, Ordering::Relaxed);
                }
                Ok(AlarmEvent::Cleared) => {
                    tracing::info!("memory usage back at or below limit");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("alarm notifier lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("Alarm notifier shutting down");
    })
}
