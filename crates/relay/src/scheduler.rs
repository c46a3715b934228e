//! Periodic timer that drives [`RelayPipeline::tick`].

use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    futures::FutureExt,
    tokio::{
        task::JoinHandle,
        time::{MissedTickBehavior, interval_at},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use mediacopy_metrics::{counter, scheduler as scheduler_metrics};

use crate::pipeline::{RelayPipeline, TickReport};

/// Shortest interval between ticks.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Runs one batch every `batch_delay` until cancelled.
///
/// Started once after the platform connection is ready; later
/// [`start`](Self::start) calls are no-ops, so reconnects do not spawn a
/// second loop.
pub struct BatchScheduler {
    pipeline: Arc<RelayPipeline>,
    started: AtomicBool,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BatchScheduler {
    pub fn new(pipeline: Arc<RelayPipeline>, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            started: AtomicBool::new(false),
            cancel,
            handle: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<RelayPipeline> {
        &self.pipeline
    }

    /// Started, not cancelled, and the loop task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst)
            && !self.cancel.is_cancelled()
            && self
                .handle
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Tick interval: the pipeline's batch delay, at least [`MIN_PERIOD`].
    #[must_use]
    pub fn period(&self) -> Duration {
        self.pipeline.batch_delay().max(MIN_PERIOD)
    }

    /// Spawn the timer loop. Returns `false` if it was already started.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("batch scheduler already started");
            return false;
        }
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.timer_loop().await;
        });
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        if self.pipeline.batch_delay() < MIN_PERIOD {
            warn!(
                batch_delay_ms = self.pipeline.batch_delay().as_millis() as u64,
                "batch delay below one second, using one second"
            );
        }
        info!(
            interval_secs = self.period().as_secs_f64(),
            "batch scheduler started"
        );
        true
    }

    /// Cancel the loop and wait for the current tick to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            error!(error = %e, "batch scheduler task ended abnormally");
        }
        info!("batch scheduler stopped");
    }

    /// Run one batch now.
    pub async fn tick(&self) -> TickReport {
        self.pipeline.tick().await
    }

    async fn timer_loop(&self) {
        let period = self.period();
        let mut interval = interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = interval.tick() => {},
            }
            match AssertUnwindSafe(self.tick()).catch_unwind().await {
                Ok(report) => {
                    if report.due > 0 {
                        debug!(
                            due = report.due,
                            sent = report.sent,
                            skipped = report.skipped,
                            failed = report.failed,
                            queued = report.queued,
                            "batch tick"
                        );
                    }
                },
                Err(_) => {
                    error!("batch tick panicked, continuing");
                    #[cfg(feature = "metrics")]
                    counter!(scheduler_metrics::TICK_PANICS_TOTAL).increment(1);
                },
            }
        }
    }
}
