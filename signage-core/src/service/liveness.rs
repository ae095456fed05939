//! Liveness reaper
//!
//! Demotes online players whose heartbeat is older than the offline timeout.
//! Each sweep is one bulk conditional update, so a heartbeat landing during
//! the sweep is never overwritten.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{repository::PlayerRepository, Error, Result};

/// Periodic online → offline sweep
#[derive(Clone)]
pub struct LivenessReaper {
    players: Arc<dyn PlayerRepository>,
    timeout: Duration,
    guard: Arc<Mutex<()>>,
}

impl std::fmt::Debug for LivenessReaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessReaper")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl LivenessReaper {
    #[must_use]
    pub fn new(players: Arc<dyn PlayerRepository>, timeout: Duration) -> Self {
        Self {
            players,
            timeout,
            guard: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one sweep against `now`, returning how many players went offline.
    ///
    /// Waits for any sweep already in progress.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64> {
        let _running = self.guard.lock().await;
        self.sweep_locked(now).await
    }

    /// Like [`sweep`](Self::sweep), but returns `None` instead of waiting
    /// when another sweep is still running.
    pub async fn try_sweep(&self, now: DateTime<Utc>) -> Option<Result<u64>> {
        let _running = self.guard.try_lock().ok()?;
        Some(self.sweep_locked(now).await)
    }

    async fn sweep_locked(&self, now: DateTime<Utc>) -> Result<u64> {
        let timeout = chrono::Duration::from_std(self.timeout)
            .map_err(|e| Error::Internal(format!("Invalid offline timeout: {e}")))?;
        let demoted = self.players.mark_offline_before(now - timeout).await?;

        if demoted > 0 {
            tracing::info!(count = demoted, "Marked stale players offline");
        }
        Ok(demoted)
    }

    /// Sweep every `period` until `shutdown` flips to `true` or its sender is dropped.
    #[must_use]
    pub fn spawn(&self, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let reaper = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                period_secs = period.as_secs(),
                timeout_secs = reaper.timeout.as_secs(),
                "Liveness reaper started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match reaper.try_sweep(Utc::now()).await {
                            None => {
                                tracing::debug!("Previous liveness sweep still running, skipping");
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => tracing::error!("Liveness sweep failed: {}", e),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Liveness reaper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, PlayerStatus};
    use crate::repository::{MemoryStore, MockPlayerRepository, PlayerRepository};

    async fn paired(store: &MemoryStore, device: &str, last_heartbeat: DateTime<Utc>) {
        store
            .create_unpaired(&Player::new_unpaired(device, device, last_heartbeat))
            .await
            .unwrap();
        store
            .confirm_pairing(device, device, None, last_heartbeat)
            .await
            .unwrap();
    }

    async fn status(store: &MemoryStore, device: &str) -> PlayerStatus {
        store.get_by_device(device).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_sweep_demotes_only_stale_players() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        paired(&store, "stale", now - chrono::Duration::seconds(45)).await;
        paired(&store, "fresh", now - chrono::Duration::seconds(5)).await;
        let stale_pairing = now - chrono::Duration::hours(1);
        store
            .create_unpaired(&Player::new_unpaired("pending", "999", stale_pairing))
            .await
            .unwrap();

        let reaper = LivenessReaper::new(store.clone(), Duration::from_secs(30));
        assert_eq!(reaper.sweep(now).await.unwrap(), 1);

        assert_eq!(status(&store, "stale").await, PlayerStatus::Offline);
        assert_eq!(status(&store, "fresh").await, PlayerStatus::Online);
        assert_eq!(status(&store, "pending").await, PlayerStatus::Unpaired);

        // Already offline players are not counted again
        assert_eq!(reaper.sweep(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_try_sweep_skips_while_running() {
        let store = Arc::new(MemoryStore::new());
        let reaper = LivenessReaper::new(store, Duration::from_secs(30));

        let held = reaper.guard.lock().await;
        assert!(reaper.try_sweep(Utc::now()).await.is_none());
        drop(held);
        assert!(reaper.try_sweep(Utc::now()).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_uses_timeout_cutoff() {
        let now = Utc::now();
        let mut players = MockPlayerRepository::new();
        players
            .expect_mark_offline_before()
            .withf(move |cutoff| *cutoff == now - chrono::Duration::seconds(30))
            .times(1)
            .returning(|_| Ok(2));

        let reaper = LivenessReaper::new(Arc::new(players), Duration::from_secs(30));
        assert_eq!(reaper.sweep(now).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_reaper_sweeps_until_shutdown() {
        let store = Arc::new(MemoryStore::new());
        paired(&store, "stale", Utc::now() - chrono::Duration::seconds(90)).await;

        let (tx, rx) = watch::channel(false);
        let reaper = LivenessReaper::new(store.clone(), Duration::from_secs(30));
        let handle = reaper.spawn(Duration::from_secs(30), rx);

        // The first tick fires immediately
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(status(&store, "stale").await, PlayerStatus::Offline);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
