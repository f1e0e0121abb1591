use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Counters for one poller. Readable from any thread while the poller runs.
#[derive(Debug, Default)]
pub struct PollerStats {
    issued: AtomicU64,
    skipped: AtomicU64,
    delivered: AtomicU64,
}

impl PollerStats {
    /// Fetches started, including the immediate first one.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    /// Ticks dropped because the previous fetch had not completed.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Acquire)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }
}

/// Re-reads one resource on a fixed cadence.
///
/// The first fetch is issued immediately on start. At most one fetch is in
/// flight; a tick that finds one outstanding is skipped, not queued. Once
/// stopped, no further fetch is issued and no in-flight result reaches the sink.
#[derive(Debug, Clone)]
pub struct Poller {
    name: String,
    interval: Duration,
}

impl Poller {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
        }
    }

    /// Spawns the polling task. Must be called from within a tokio runtime.
    pub fn start<F, Fut, T, S>(self, fetch: F, sink: S) -> PollerHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        S: Fn(T) + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let stats = Arc::new(PollerStats::default());
        let sink = Arc::new(sink);
        let in_flight = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn({
            let cancel = cancel.clone();
            let stats = stats.clone();
            let Poller { name, interval } = self;
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                engine_debug!("poller {} started ({:?})", name, interval);

                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }

                    if in_flight.swap(true, Ordering::AcqRel) {
                        stats.skipped.fetch_add(1, Ordering::AcqRel);
                        engine_trace!("poller {}: fetch still in flight, tick skipped", name);
                        continue;
                    }
                    stats.issued.fetch_add(1, Ordering::AcqRel);

                    let pending = fetch();
                    let cancel = cancel.clone();
                    let stats = stats.clone();
                    let sink = sink.clone();
                    let in_flight = in_flight.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {}
                            output = pending => {
                                if !cancel.is_cancelled() {
                                    stats.delivered.fetch_add(1, Ordering::AcqRel);
                                    sink(output);
                                }
                            }
                        }
                        in_flight.store(false, Ordering::Release);
                    });
                }

                engine_debug!("poller {} stopped", name);
            }
        });

        PollerHandle {
            cancel,
            stats,
            task,
        }
    }
}

/// Owns a running poller. Dropping the handle stops it.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    stats: Arc<PollerStats>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn stats(&self) -> &PollerStats {
        &self.stats
    }

    /// Whether the tick loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
