//! Background poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vitrine_core::repository::ChatRepository;

use crate::engine::{ChatSyncEngine, PollOutcome};

/// Milliseconds in `period`, saturating instead of wrapping.
fn interval_millis(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}

/// Poll `engine` every `poll_interval` until `cancel` fires.
///
/// The first poll runs immediately. Ticks that find the engine ineligible
/// (no panel open, not an admin) do nothing. A slow fetch delays the next
/// tick instead of queueing extra ones.
pub fn spawn_poller<R>(engine: Arc<ChatSyncEngine<R>>, cancel: CancellationToken) -> JoinHandle<()>
where
    R: ChatRepository + 'static,
{
    tokio::spawn(async move {
        let period = engine.config().poll_interval;
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = interval_millis(period), "Chat poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let outcome = engine.poll().await;
                    if outcome != PollOutcome::Skipped {
                        debug!(?outcome, "Chat poll finished");
                    }
                }
            }
        }

        info!("Chat poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_millis_saturates() {
        assert_eq!(interval_millis(Duration::from_secs(5)), 5_000);
        assert_eq!(interval_millis(Duration::MAX), u64::MAX);
    }
}
