//! Candidates waiting for their link previews to render.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use {
    mediacopy_channels::{ChannelId, GuildId, InboundMessage, MessageId},
    mediacopy_config::RelayConfig,
};

use crate::{classify::contains_twitter_link, ledger::DedupLedger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    pub wait: Duration,
    /// Wait for messages linking to Twitter/X.
    pub twitter_wait: Duration,
    /// Entries older than this are purged whatever their state.
    pub stale_after: Duration,
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for QueueLimits {
    fn from(config: &RelayConfig) -> Self {
        Self {
            wait: config.wait(),
            twitter_wait: config.twitter_wait(),
            stale_after: config.stale_entry_age(),
        }
    }
}

/// A message held until `arrival + required_wait`.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
    pub id: MessageId,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub arrival: Instant,
    pub has_twitter_link: bool,
    pub required_wait: Duration,
    pub processed: bool,
    /// The message as first delivered; used when a re-fetch fails.
    pub snapshot: InboundMessage,
}

impl CandidateEntry {
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        !self.processed && now.saturating_duration_since(self.arrival) >= self.required_wait
    }
}

#[derive(Debug, Default)]
pub struct IntakeQueue {
    limits: QueueLimits,
    entries: HashMap<MessageId, CandidateEntry>,
}

impl IntakeQueue {
    #[must_use]
    pub fn new(limits: QueueLimits) -> Self {
        Self {
            limits,
            entries: HashMap::new(),
        }
    }

    /// Queue `message` unless its id is already queued or relayed.
    pub fn enqueue(&mut self, message: InboundMessage, now: Instant, ledger: &DedupLedger) -> bool {
        if self.entries.contains_key(&message.id) || ledger.is_relayed(message.id) {
            return false;
        }
        let has_twitter_link = contains_twitter_link(&message.content);
        let required_wait = if has_twitter_link {
            self.limits.twitter_wait
        } else {
            self.limits.wait
        };
        self.entries.insert(message.id, CandidateEntry {
            id: message.id,
            guild_id: message.guild_id,
            channel_id: message.channel_id,
            arrival: now,
            has_twitter_link,
            required_wait,
            processed: false,
            snapshot: message,
        });
        true
    }

    /// Unprocessed entries whose wait has elapsed, oldest first. Entries
    /// stay queued until [`mark_processed`](Self::mark_processed).
    #[must_use]
    pub fn drain_due(&self, now: Instant) -> Vec<CandidateEntry> {
        let mut due: Vec<_> = self
            .entries
            .values()
            .filter(|entry| entry.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|entry| (entry.arrival, entry.id));
        due
    }

    pub fn mark_processed(&mut self, ids: &[MessageId]) {
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.processed = true;
            }
        }
    }

    /// Drop processed entries and anything older than the stale cutoff.
    /// Returns the number removed.
    pub fn remove_processed(&mut self, now: Instant) -> usize {
        let stale_after = self.limits.stale_after;
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            !entry.processed && now.saturating_duration_since(entry.arrival) < stale_after
        });
        before - self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&CandidateEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
