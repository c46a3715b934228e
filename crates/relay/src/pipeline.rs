//! The shared intake/relay state and the operations that touch it.

use std::{
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use {
    futures::FutureExt,
    mediacopy_channels::{ChatGateway, InboundMessage, MessageId},
    mediacopy_config::{RelayConfig, SettingsStore},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use mediacopy_metrics::{
    counter, gauge, histogram, intake as intake_metrics, ledger as ledger_metrics,
    relay as relay_metrics, scheduler as scheduler_metrics,
};

use crate::{
    classify::{contains_url, is_media},
    clock::Clock,
    eligibility::{Ineligible, check_routing},
    executor::{RelayExecutor, RelayLimits, RelayOutcome},
    fetch::AttachmentFetcher,
    ledger::{DedupLedger, IdentityState, LedgerLimits},
    queue::{IntakeQueue, QueueLimits},
};

/// Queue and ledger, guarded together by one mutex that is never held
/// across an `.await`.
#[derive(Debug)]
pub(crate) struct PipelineState {
    pub(crate) ledger: DedupLedger,
    pub(crate) queue: IntakeQueue,
}

pub(crate) type SharedState = Arc<Mutex<PipelineState>>;

pub(crate) fn lock_state(state: &Mutex<PipelineState>) -> MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Result of submitting an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    Enqueued,
    FromBot,
    /// Same event delivered again within the seen window.
    Duplicate,
    NotRoutable(Ineligible),
    /// No media and no link that could still render a preview.
    NothingToRelay,
    AlreadyQueued,
    AlreadyRelayed,
}

/// Counts from one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub sent: usize,
    pub skipped: usize,
    /// Entries that errored or panicked.
    pub failed: usize,
    /// Entries purged from the queue after the batch.
    pub removed: usize,
    /// Entries still queued after the batch.
    pub queued: usize,
}

pub struct RelayPipeline {
    pub(crate) state: SharedState,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    executor: RelayExecutor,
    batch_delay: Duration,
}

impl RelayPipeline {
    pub fn new(
        config: &RelayConfig,
        settings: Arc<dyn SettingsStore>,
        gateway: Arc<dyn ChatGateway>,
        fetcher: Arc<dyn AttachmentFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = Arc::new(Mutex::new(PipelineState {
            ledger: DedupLedger::new(LedgerLimits::from(config)),
            queue: IntakeQueue::new(QueueLimits::from(config)),
        }));
        let executor = RelayExecutor::new(
            Arc::clone(&state),
            Arc::clone(&settings),
            gateway,
            fetcher,
            RelayLimits::from(config),
        );
        Self {
            state,
            settings,
            clock,
            executor,
            batch_delay: config.batch_delay(),
        }
    }

    /// Interval between scheduler ticks.
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    #[must_use]
    pub fn executor(&self) -> &RelayExecutor {
        &self.executor
    }

    /// Intake path for every inbound message event.
    pub async fn submit(&self, message: InboundMessage) -> Intake {
        #[cfg(feature = "metrics")]
        counter!(intake_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

        if message.author.bot {
            return Intake::FromBot;
        }

        let now = self.clock.now();
        {
            let mut state = lock_state(&self.state);
            if state.ledger.has_seen(message.id) {
                debug!(message_id = %message.id, "duplicate delivery");
                #[cfg(feature = "metrics")]
                counter!(intake_metrics::DUPLICATES_TOTAL).increment(1);
                return Intake::Duplicate;
            }
            state.ledger.mark_seen(message.id, now);
        }

        let settings = match message.guild_id {
            Some(guild_id) => match self.settings.get(guild_id).await {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(guild_id = %guild_id, error = %e, "settings lookup failed");
                    None
                },
            },
            None => None,
        };
        if let Err(reason) = check_routing(&message, settings.as_ref()) {
            return Intake::NotRoutable(reason);
        }
        if !is_media(&message) && !contains_url(&message.content) {
            return Intake::NothingToRelay;
        }

        let id = message.id;
        let mut state = lock_state(&self.state);
        if state.ledger.is_relayed(id) {
            return Intake::AlreadyRelayed;
        }
        let PipelineState { ledger, queue } = &mut *state;
        if !queue.enqueue(message, now, ledger) {
            return Intake::AlreadyQueued;
        }
        debug!(message_id = %id, queued = queue.len(), "queued candidate");
        #[cfg(feature = "metrics")]
        {
            counter!(intake_metrics::ENQUEUED_TOTAL).increment(1);
            gauge!(intake_metrics::QUEUE_DEPTH).set(queue.len() as f64);
        }
        Intake::Enqueued
    }

    #[must_use]
    pub fn identity_state(&self, id: MessageId) -> IdentityState {
        let state = lock_state(&self.state);
        state.ledger.state_of(id, state.queue.contains(id))
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        lock_state(&self.state).queue.len()
    }

    #[must_use]
    pub fn relayed_len(&self) -> usize {
        lock_state(&self.state).ledger.relayed_len()
    }

    /// Run one batch: relay every due candidate, then clean up.
    ///
    /// Entries are relayed one after another. An entry that errors or
    /// panics is logged and counted; the rest of the batch still runs.
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let due = {
            let mut state = lock_state(&self.state);
            state.ledger.evict_expired(now);
            state.queue.drain_due(now)
        };

        let mut report = TickReport {
            due: due.len(),
            ..Default::default()
        };
        for entry in &due {
            match AssertUnwindSafe(self.executor.relay(entry))
                .catch_unwind()
                .await
            {
                Ok(Ok(RelayOutcome::Sent { .. })) => {
                    report.sent += 1;
                    #[cfg(feature = "metrics")]
                    histogram!(relay_metrics::LATENCY_SECONDS).record(
                        self.clock
                            .now()
                            .saturating_duration_since(entry.arrival)
                            .as_secs_f64(),
                    );
                },
                Ok(Ok(RelayOutcome::SendFailed)) => report.failed += 1,
                Ok(Ok(_)) => report.skipped += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    error!(message_id = %entry.id, error = %e, "relay failed");
                    #[cfg(feature = "metrics")]
                    counter!(relay_metrics::FAILURES_TOTAL).increment(1);
                },
                Err(_) => {
                    report.failed += 1;
                    error!(message_id = %entry.id, "relay panicked");
                    #[cfg(feature = "metrics")]
                    counter!(relay_metrics::FAILURES_TOTAL).increment(1);
                },
            }
        }

        let ids: Vec<MessageId> = due.iter().map(|entry| entry.id).collect();
        let mut state = lock_state(&self.state);
        state.queue.mark_processed(&ids);
        report.removed = state.queue.remove_processed(self.clock.now());
        state.ledger.cap_relayed();
        report.queued = state.queue.len();

        #[cfg(feature = "metrics")]
        {
            counter!(scheduler_metrics::TICKS_TOTAL).increment(1);
            histogram!(scheduler_metrics::DUE_PER_TICK).record(report.due as f64);
            gauge!(intake_metrics::QUEUE_DEPTH).set(report.queued as f64);
            gauge!(ledger_metrics::RELAYED_SIZE).set(state.ledger.relayed_len() as f64);
            gauge!(ledger_metrics::SEEN_SIZE).set(state.ledger.seen_len() as f64);
        }
        drop(state);

        if report.sent > 0 {
            info!(sent = report.sent, queued = report.queued, "batch relayed");
        }
        report
    }
}
