//! Real-time driver for the Study Arena.
//!
//! An [`ArenaTicker`] owns the single tokio task that feeds one-second ticks
//! into a shared [`GameStore`]. The task ends by itself when the battle
//! completes or its token goes stale, and is aborted by [`ArenaTicker::cancel`]
//! or when the ticker is dropped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::game::arena::{TickOutcome, TickToken};
use crate::game::store::GameStore;

pub type SharedStore = Arc<Mutex<GameStore>>;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct ArenaTicker {
    handle: Option<JoinHandle<()>>,
}

impl ArenaTicker {
    /// Spawn the tick task for `token`. Must be called inside a tokio runtime.
    pub fn spawn(store: SharedStore, token: TickToken, period: Duration) -> Self {
        Self::spawn_with_rng(store, token, period, StdRng::from_entropy())
    }

    /// Like [`ArenaTicker::spawn`] with a caller-provided damage RNG.
    pub fn spawn_with_rng(store: SharedStore, token: TickToken, period: Duration, mut rng: StdRng) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;

                let outcome = {
                    let mut guard = match store.lock() {
                        Ok(guard) => guard,
                        Err(_) => {
                            warn!("arena ticker stopping: store lock poisoned");
                            break;
                        }
                    };
                    guard.arena_tick(token, &mut rng)
                };

                match outcome {
                    Ok(TickOutcome::Advanced { .. }) => {}
                    Ok(TickOutcome::Completed(reward)) => {
                        info!("arena ticker finished: +{} xp, +{} coins", reward.xp, reward.coins);
                        break;
                    }
                    Ok(TickOutcome::Ignored) => {
                        debug!("arena ticker stopping: token no longer current");
                        break;
                    }
                    // The store has already paused the battle.
                    Err(e) => {
                        warn!("arena ticker stopping: {}", e);
                        break;
                    }
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Abort the tick task. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for ArenaTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
