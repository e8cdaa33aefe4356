//! Background removal of pages nobody has read within the retention window.

use crate::metrics::{PAGES_PURGED, SWEEP_DURATION, SWEEP_FAILURES, SWEEPS_SKIPPED};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use txtpages_core::config::SweepConfig;
use txtpages_store::{ExpiryRepo, PageStore};

/// Result of a single sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another sweep was still running.
    Skipped,
    Completed { purged: usize },
    /// The purge failed; the error has been logged.
    Failed,
}

/// Periodically purges expired pages.
///
/// Clones share the run token, so at most one purge runs at a time no
/// matter how many ticks fire.
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn PageStore>,
    interval: Duration,
    retention: time::Duration,
    run_on_startup: bool,
    run_token: Arc<Mutex<()>>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn PageStore>, interval: Duration, retention: time::Duration) -> Self {
        Self {
            store,
            interval,
            retention,
            run_on_startup: false,
            run_token: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(store: Arc<dyn PageStore>, config: &SweepConfig) -> Self {
        Self::new(store, config.interval(), config.retention()).run_on_startup(config.run_on_startup)
    }

    /// Sweep as soon as the loop starts instead of waiting one interval.
    pub fn run_on_startup(mut self, enabled: bool) -> Self {
        self.run_on_startup = enabled;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Purge once, unless a purge is already in progress.
    pub async fn run_once(&self) -> SweepOutcome {
        let Ok(_guard) = self.run_token.try_lock() else {
            SWEEPS_SKIPPED.inc();
            tracing::debug!("Expiry sweep still running, skipping tick");
            return SweepOutcome::Skipped;
        };

        let timer = SWEEP_DURATION.start_timer();
        let result = self.store.purge_older_than(self.retention).await;
        timer.observe_duration();

        match result {
            Ok(purged) => {
                for page in &purged {
                    tracing::info!(
                        page_id = page.page_id,
                        slug = %page.slug,
                        title = %page.title,
                        last_read_at = %page.last_read_at,
                        "Purged expired page"
                    );
                }
                PAGES_PURGED.inc_by(purged.len() as u64);
                tracing::info!(
                    purged = purged.len(),
                    retention_days = self.retention.whole_days(),
                    "Expiry sweep completed"
                );
                SweepOutcome::Completed {
                    purged: purged.len(),
                }
            }
            Err(e) => {
                SWEEP_FAILURES.inc();
                tracing::error!(error = %e, "Expiry sweep failed");
                SweepOutcome::Failed
            }
        }
    }

    /// Run the sweep loop until `shutdown` is cancelled.
    ///
    /// Each tick runs on its own task so a slow purge never holds up the
    /// ticker. In-flight purges are awaited before the loop returns.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            if !self.run_on_startup {
                ticker.tick().await;
            }

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                retention_days = self.retention.whole_days(),
                "Expiry sweeper started"
            );

            let mut running = JoinSet::new();
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        while running.try_join_next().is_some() {}
                        let sweeper = self.clone();
                        running.spawn(async move { sweeper.run_once().await });
                    }
                }
            }

            while let Some(joined) = running.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Expiry sweep task panicked");
                }
            }
            tracing::info!("Expiry sweeper stopped");
        })
    }
}
