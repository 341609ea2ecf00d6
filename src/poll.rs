//! Periodic budget refresh for long-running dashboards.

use core::time::Duration;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::backend::Backend;
use crate::ledger::Ledger;

/// Interval between scheduled refreshes unless overridden.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background task re-aggregating budget spending on a fixed interval.
///
/// The first refresh runs immediately. Stopping (or dropping) the poller
/// prevents further refreshes; a refresh already in flight still
/// completes and updates the cache.
///
/// ```rust,no_run
/// # async fn demo() -> spendline::error::Result<()> {
/// use std::sync::Arc;
///
/// use spendline::backend::InMemoryBackend;
/// use spendline::ledger::Ledger;
/// use spendline::poll::{BudgetPoller, DEFAULT_POLL_INTERVAL};
///
/// let ledger = Arc::new(Ledger::builder().backend(InMemoryBackend::new()).build()?);
/// let poller = BudgetPoller::start(Arc::clone(&ledger), DEFAULT_POLL_INTERVAL);
/// let mut events = ledger.subscribe();
/// let _first = events.recv().await;
/// poller.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BudgetPoller {
    /// Flips to `true` on stop; dropping it also ends the task.
    stop: watch::Sender<bool>,
    /// The spawned refresh loop.
    handle: JoinHandle<()>,
}

impl BudgetPoller {
    /// Spawns the refresh loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[inline]
    #[must_use]
    pub fn start<B: Backend + 'static>(ledger: Arc<Ledger<B>>, every: Duration) -> Self {
        let (stop, stopped) = watch::channel(false);
        let every = every.max(Duration::from_millis(1));
        tracing::debug!(interval_ms = every.as_millis(), "starting budget poller");
        let handle = tokio::spawn(run(ledger, every, stopped));
        Self { stop, handle }
    }

    /// Requests the loop to stop after the current refresh, if any.
    #[inline]
    pub fn stop(&self) {
        let _was_stopped = self.stop.send_replace(true);
    }

    /// Returns `true` once the loop has exited.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the loop and waits for it to exit.
    #[inline]
    pub async fn shutdown(self) {
        let Self { stop, handle } = self;
        let _was_stopped = stop.send_replace(true);
        if let Err(err) = handle.await {
            tracing::warn!(error = %err, "budget poller task failed");
        }
    }
}

/// Refresh loop: refresh, then wait `every` or until stopped.
async fn run<B: Backend>(ledger: Arc<Ledger<B>>, every: Duration, mut stopped: watch::Receiver<bool>) {
    while !*stopped.borrow_and_update() {
        if let Err(err) = ledger.refresh_budgets().await {
            tracing::debug!(error = %err, "scheduled budget refresh failed");
        }
        if time::timeout(every, stopped.changed()).await.is_ok() {
            // Stop requested, or the poller was dropped.
            break;
        }
    }
    tracing::debug!("budget poller stopped");
}
