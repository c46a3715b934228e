//! Media relay pipeline.
//!
//! Inbound messages go through [`RelayPipeline::submit`], which drops
//! duplicates and messages from unwatched channels and queues the rest.
//! A [`BatchScheduler`] ticks every few seconds, picks the queue entries
//! whose wait window has passed and hands them to the [`RelayExecutor`],
//! which re-fetches the message and copies its media to the guild's
//! destination channel at most once.

pub mod classify;
pub mod clock;
pub mod eligibility;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod ledger;
pub mod pipeline;
pub mod queue;
pub mod scheduler;

pub use {
    classify::{contains_twitter_link, contains_url, is_media, is_relayable_embed},
    clock::{Clock, ManualClock, SystemClock},
    eligibility::{Ineligible, is_eligible, is_routable, route},
    error::{Error, Result},
    executor::{RelayExecutor, RelayLimits, RelayOutcome, compose_payload},
    fetch::{AttachmentFetcher, HttpAttachmentFetcher},
    ledger::{DedupLedger, IdentityState, LedgerLimits},
    pipeline::{Intake, RelayPipeline, TickReport},
    queue::{CandidateEntry, IntakeQueue, QueueLimits},
    scheduler::BatchScheduler,
};

#[cfg(test)]
pub(crate) mod test_support;
