//! TTL Sweeper Task
//!
//! Background task that periodically purges expired cache entries.

use std::sync::Weak;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Something the sweeper can ask to drop its expired entries.
pub(crate) trait Purge {
    /// Removes expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

// == Sweeper ==
/// Handle to a background sweep loop bound to one store.
///
/// The loop runs on its own named thread with a single-threaded tokio
/// runtime, so a store can be created and used from sync or async code alike.
/// It starts running on construction. Once stopped it cannot be restarted.
pub struct Sweeper {
    interval: Duration,
    stop_tx: watch::Sender<bool>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawns a sweep loop calling `target.purge_expired()` every `interval`.
    ///
    /// The loop holds only a weak reference and exits on its own once the
    /// target is gone.
    ///
    /// # Panics
    /// Panics if `interval` is zero.
    pub(crate) fn spawn<T>(target: Weak<T>, interval: Duration) -> std::io::Result<Self>
    where
        T: Purge + Send + Sync + 'static,
    {
        assert!(!interval.is_zero(), "sweep interval must be non-zero");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = thread::Builder::new()
            .name("ttl-sweeper".to_string())
            .spawn(move || runtime.block_on(run(target, interval, stop_rx)))?;

        Ok(Self {
            interval,
            stop_tx,
            thread_id: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Signals the loop to stop and waits for its thread to exit.
    ///
    /// Every caller returns only after the thread is gone, including callers
    /// racing each other; later calls return at once. When called from the
    /// sweeper thread (e.g. a store dropped inside an eviction callback) it
    /// signals without joining.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);

        if self.thread_id == thread::current().id() {
            return;
        }

        // Held across the join so concurrent callers wait for the exit too
        let mut handle = self.handle.lock();
        if let Some(handle) = handle.take() {
            if handle.join().is_err() {
                warn!("TTL sweeper thread panicked");
            }
        }
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Period between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("interval", &self.interval)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Sweep loop. Races every tick against the stop signal so a stop lands
/// immediately, even mid-wait.
async fn run<T: Purge>(target: Weak<T>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    info!("Starting TTL sweeper with interval of {:?}", period);

    // First sweep one full period after start
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let Some(target) = target.upgrade() else {
                    debug!("TTL sweeper target dropped");
                    break;
                };

                let removed = target.purge_expired();
                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
            }
        }
    }

    info!("TTL sweeper stopped");
}
