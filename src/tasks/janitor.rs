//! Janitor Task
//!
//! Background task that periodically removes expired items from a cache.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Something the janitor can sweep.
pub trait Sweep: Send + Sync + 'static {
    /// Removes expired items, returning how many were removed.
    fn sweep(&self) -> usize;
}

/// Lifecycle of a [`Janitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JanitorState {
    Running,
    Stopped,
}

// == Janitor ==
/// Handle to a running sweep loop.
///
/// The loop holds only a weak reference to its target and exits once the
/// target is dropped, [`Janitor::stop`] is called, or the janitor itself is
/// dropped.
#[derive(Debug)]
pub struct Janitor {
    interval: Duration,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawns a sweep loop on `runtime` that calls [`Sweep::sweep`] on every
    /// tick of `interval`.
    pub(crate) fn spawn<T: Sweep>(target: &Arc<T>, interval: Duration, runtime: &Handle) -> Self {
        let target: Weak<T> = Arc::downgrade(target);
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = runtime.spawn(async move {
            debug!(?interval, "Janitor started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(target) = target.upgrade() else {
                            break;
                        };
                        let removed = target.sweep();
                        if removed > 0 {
                            debug!(removed, "Janitor removed expired items");
                        } else {
                            trace!("Janitor found no expired items");
                        }
                    }
                }
            }

            debug!("Janitor stopped");
        });

        Self {
            interval,
            token,
            handle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signals the loop to exit. Calling this more than once has no further effect.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn state(&self) -> JanitorState {
        if self.token.is_cancelled() || self.handle.is_finished() {
            JanitorState::Stopped
        } else {
            JanitorState::Running
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTarget {
        sweeps: AtomicUsize,
    }

    impl Sweep for CountingTarget {
        fn sweep(&self) -> usize {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test]
    async fn test_janitor_sweeps_on_every_tick() {
        let target = Arc::new(CountingTarget::default());
        let janitor = Janitor::spawn(&target, Duration::from_millis(5), &Handle::current());

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(target.sweeps.load(Ordering::SeqCst) >= 2);
        assert_eq!(janitor.state(), JanitorState::Running);
        assert_eq!(janitor.interval(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_janitor_stop_is_idempotent() {
        let target = Arc::new(CountingTarget::default());
        let janitor = Janitor::spawn(&target, Duration::from_millis(5), &Handle::current());

        janitor.stop();
        janitor.stop();
        assert_eq!(janitor.state(), JanitorState::Stopped);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(janitor.is_finished(), "Loop should exit after stop");

        let sweeps = target.sweeps.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(target.sweeps.load(Ordering::SeqCst), sweeps);
    }

    #[tokio::test]
    async fn test_janitor_exits_when_target_dropped() {
        let target = Arc::new(CountingTarget::default());
        let janitor = Janitor::spawn(&target, Duration::from_millis(5), &Handle::current());

        drop(target);
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(janitor.is_finished());
        assert_eq!(janitor.state(), JanitorState::Stopped);
    }
}
