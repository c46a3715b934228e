//! Metric name and label definitions.
//!
//! All metric names used by mediacopy live here so the exported set is
//! documented in one place.

/// Inbound message intake
pub mod intake {
    /// Messages delivered by the gateway, before any filtering
    pub const MESSAGES_RECEIVED_TOTAL: &str = "mediacopy_messages_received_total";
    /// Duplicate deliveries of an already-seen message
    pub const DUPLICATES_TOTAL: &str = "mediacopy_intake_duplicates_total";
    /// Messages accepted into the intake queue
    pub const ENQUEUED_TOTAL: &str = "mediacopy_enqueued_total";
    /// Current number of queued candidates
    pub const QUEUE_DEPTH: &str = "mediacopy_queue_depth";
}

/// Relay execution
pub mod relay {
    /// Relays posted to a destination channel
    pub const RELAYED_TOTAL: &str = "mediacopy_relayed_total";
    /// Candidates dropped at relay time, labelled by `reason`
    pub const SKIPPED_TOTAL: &str = "mediacopy_relay_skipped_total";
    /// Relays that failed while sending or unexpectedly errored
    pub const FAILURES_TOTAL: &str = "mediacopy_relay_failures_total";
    /// Attachments not re-uploaded because they exceed the size ceiling
    pub const OVERSIZE_ATTACHMENTS_TOTAL: &str = "mediacopy_relay_oversize_attachments_total";
    /// Time from arrival to send, in seconds
    pub const LATENCY_SECONDS: &str = "mediacopy_relay_latency_seconds";
}

/// Scheduler ticks
pub mod scheduler {
    /// Completed scheduler ticks
    pub const TICKS_TOTAL: &str = "mediacopy_scheduler_ticks_total";
    /// Due entries processed per tick
    pub const DUE_PER_TICK: &str = "mediacopy_scheduler_due_per_tick";
    /// Ticks that panicked and were recovered
    pub const TICK_PANICS_TOTAL: &str = "mediacopy_scheduler_tick_panics_total";
}

/// Dedup ledger
pub mod ledger {
    /// Identities currently held in the relayed set. Includes candidates
    /// skipped after their wait, so this is not a send count; see
    /// `relay::RELAYED_TOTAL` for that.
    pub const RELAYED_SIZE: &str = "mediacopy_ledger_relayed_size";
    /// Identities currently held in the seen set
    pub const SEEN_SIZE: &str = "mediacopy_ledger_seen_size";
}

/// Common label keys
pub mod labels {
    pub const REASON: &str = "reason";
    pub const GUILD: &str = "guild";
}

/// Histogram bucket boundaries
pub mod buckets {
    use once_cell::sync::Lazy;

    /// Relay latency buckets (in seconds)
    /// Covers the wait windows up to the stale-entry cutoff
    pub static RELAY_LATENCY: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            1.0, 2.0, 3.0, 5.0, 8.0, 10.0, 15.0, 20.0, 30.0, 60.0, 120.0, 300.0,
        ]
    });
}
