//! Seen/relayed bookkeeping keyed by message id.
//!
//! The seen map suppresses duplicate deliveries of the same event for a
//! short retention window. The relayed set is the at-most-once guard; it
//! is bounded by evicting the oldest ids once it grows past a ceiling.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::{Duration, Instant},
};

use {mediacopy_channels::MessageId, mediacopy_config::RelayConfig};

/// Where an id currently stands, resolved relayed > queued > seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    Unknown,
    Seen,
    Queued,
    Relayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerLimits {
    pub seen_retention: Duration,
    pub relayed_max: usize,
    pub relayed_keep: usize,
}

impl Default for LedgerLimits {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for LedgerLimits {
    fn from(config: &RelayConfig) -> Self {
        Self {
            seen_retention: config.seen_retention(),
            relayed_max: config.relayed_max,
            // keep > max would never shrink the set
            relayed_keep: config.relayed_keep.min(config.relayed_max),
        }
    }
}

#[derive(Debug, Default)]
pub struct DedupLedger {
    limits: LedgerLimits,
    /// id -> instant after which the entry is dropped
    seen: HashMap<MessageId, Instant>,
    relayed: HashSet<MessageId>,
    /// insertion order of `relayed`, oldest first
    relayed_order: VecDeque<MessageId>,
}

impl DedupLedger {
    #[must_use]
    pub fn new(limits: LedgerLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn has_seen(&self, id: MessageId) -> bool {
        self.seen.contains_key(&id)
    }

    /// Record a sighting. A repeated sighting does not extend the window.
    pub fn mark_seen(&mut self, id: MessageId, now: Instant) {
        self.seen
            .entry(id)
            .or_insert(now + self.limits.seen_retention);
    }

    /// Drop seen entries whose retention window has passed. Returns how
    /// many were dropped.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.seen.len();
        self.seen.retain(|_, expiry| now < *expiry);
        before - self.seen.len()
    }

    #[must_use]
    pub fn is_relayed(&self, id: MessageId) -> bool {
        self.relayed.contains(&id)
    }

    /// Record `id` as relayed, then apply the ceiling. Returns `false` when
    /// the id was already recorded.
    pub fn mark_relayed(&mut self, id: MessageId) -> bool {
        if !self.relayed.insert(id) {
            return false;
        }
        self.relayed_order.push_back(id);
        self.cap_relayed();
        true
    }

    /// Once the relayed set exceeds `relayed_max`, keep only the newest
    /// `relayed_keep` ids.
    pub fn cap_relayed(&mut self) -> usize {
        if self.relayed.len() <= self.limits.relayed_max {
            return 0;
        }
        let excess = self.relayed_order.len() - self.limits.relayed_keep;
        for id in self.relayed_order.drain(..excess) {
            self.relayed.remove(&id);
        }
        excess
    }

    #[must_use]
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn relayed_len(&self) -> usize {
        self.relayed.len()
    }

    /// State of `id` given whether the queue currently holds it.
    #[must_use]
    pub fn state_of(&self, id: MessageId, queued: bool) -> IdentityState {
        if self.is_relayed(id) {
            IdentityState::Relayed
        } else if queued {
            IdentityState::Queued
        } else if self.has_seen(id) {
            IdentityState::Seen
        } else {
            IdentityState::Unknown
        }
    }
}
