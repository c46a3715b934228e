//! Re-fetches a due candidate and copies its media to the destination.

use std::{sync::Arc, time::Duration};

use {
    mediacopy_channels::{
        ChatGateway, Embed, EmbedAuthor, EmbedField, InboundMessage, MAX_EMBEDS_PER_MESSAGE,
        OutboundFile, RelayPayload,
    },
    mediacopy_config::{RelayConfig, SettingsStore},
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use mediacopy_metrics::{counter, labels, relay as relay_metrics};

use crate::{
    Result,
    classify::is_relayable_embed,
    eligibility::{Ineligible, route},
    fetch::AttachmentFetcher,
    pipeline::{SharedState, lock_state},
    queue::CandidateEntry,
};

/// Colour of the metadata embed.
const INFO_COLOUR: u32 = 0x00ff00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    /// Larger attachments are not re-uploaded.
    pub max_attachment_bytes: u64,
    pub max_original_embeds: usize,
    pub description_max_chars: usize,
    /// Pause before posting.
    pub send_delay: Duration,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for RelayLimits {
    fn from(config: &RelayConfig) -> Self {
        Self {
            max_attachment_bytes: config.max_attachment_bytes,
            max_original_embeds: config
                .max_original_embeds
                .min(MAX_EMBEDS_PER_MESSAGE - 1),
            description_max_chars: config.description_max_chars,
            send_delay: config.send_delay(),
        }
    }
}

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Already in the relayed set; nothing was done.
    AlreadyRelayed,
    /// Fresh content failed a gate.
    NotEligible(Ineligible),
    DestinationMissing,
    MissingPermissions,
    /// The platform rejected the send. Not retried.
    SendFailed,
    Sent { files: usize, embeds: usize },
}

impl RelayOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyRelayed => "already_relayed",
            Self::NotEligible(reason) => reason.as_str(),
            Self::DestinationMissing => "destination_missing",
            Self::MissingPermissions => "missing_permissions",
            Self::SendFailed => "send_failed",
            Self::Sent { .. } => "sent",
        }
    }
}

pub struct RelayExecutor {
    state: SharedState,
    settings: Arc<dyn SettingsStore>,
    gateway: Arc<dyn ChatGateway>,
    fetcher: Arc<dyn AttachmentFetcher>,
    limits: RelayLimits,
}

impl RelayExecutor {
    pub(crate) fn new(
        state: SharedState,
        settings: Arc<dyn SettingsStore>,
        gateway: Arc<dyn ChatGateway>,
        fetcher: Arc<dyn AttachmentFetcher>,
        limits: RelayLimits,
    ) -> Self {
        Self {
            state,
            settings,
            gateway,
            fetcher,
            limits,
        }
    }

    /// Relay one candidate at most once.
    ///
    /// The id is recorded as relayed before any network call, so a failure
    /// further down loses the relay rather than risking a duplicate.
    ///
    /// # Errors
    ///
    /// Only when the settings store fails; every platform problem is
    /// reported through [`RelayOutcome`].
    pub async fn relay(&self, entry: &CandidateEntry) -> Result<RelayOutcome> {
        if !lock_state(&self.state).ledger.mark_relayed(entry.id) {
            debug!(message_id = %entry.id, "already relayed, skipping");
            return Ok(RelayOutcome::AlreadyRelayed);
        }

        let message = match self.gateway.fetch_message(entry.channel_id, entry.id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                debug!(message_id = %entry.id, error = %e, "re-fetch failed, using first snapshot");
                entry.snapshot.clone()
            },
        };

        let settings = match message.guild_id {
            Some(guild_id) => self.settings.get(guild_id).await?,
            None => None,
        };
        if let Err(reason) = route(&message, settings.as_ref()) {
            debug!(message_id = %entry.id, reason = %reason, "not eligible after wait");
            return Ok(self.skipped(RelayOutcome::NotEligible(reason)));
        }
        let (Some(guild_id), Some(settings)) = (message.guild_id, settings) else {
            return Ok(self.skipped(RelayOutcome::NotEligible(Ineligible::NoSettings)));
        };
        let Some(destination) = settings.destination_channel else {
            return Ok(self.skipped(RelayOutcome::NotEligible(Ineligible::NoDestination)));
        };

        let access = match self.gateway.destination_access(guild_id, destination).await {
            Ok(access) => access,
            Err(e) => {
                warn!(guild_id = %guild_id, channel_id = %destination, error = %e, "destination lookup failed");
                None
            },
        };
        let Some(access) = access else {
            warn!(guild_id = %guild_id, channel_id = %destination, "destination channel not found");
            return Ok(self.skipped(RelayOutcome::DestinationMissing));
        };
        if !access.can_relay() {
            warn!(
                guild_id = %guild_id,
                channel = %access.name,
                can_send = access.can_send,
                can_attach = access.can_attach,
                "missing permissions in destination channel"
            );
            return Ok(self.skipped(RelayOutcome::MissingPermissions));
        }

        let files = self.download_attachments(&message).await;
        let payload = compose_payload(&message, settings.include_author, &self.limits, files);
        let outcome = RelayOutcome::Sent {
            files: payload.files.len(),
            embeds: payload.embeds.len(),
        };

        tokio::time::sleep(self.limits.send_delay).await;
        if let Err(e) = self.gateway.send_relay(destination, payload).await {
            error!(message_id = %entry.id, channel = %access.name, error = %e, "failed to send relay");
            #[cfg(feature = "metrics")]
            counter!(relay_metrics::FAILURES_TOTAL).increment(1);
            return Ok(RelayOutcome::SendFailed);
        }

        info!(
            message_id = %entry.id,
            source = message.channel_name.as_deref().unwrap_or_default(),
            destination = %access.name,
            "relayed media"
        );
        #[cfg(feature = "metrics")]
        counter!(relay_metrics::RELAYED_TOTAL).increment(1);
        Ok(outcome)
    }

    fn skipped(&self, outcome: RelayOutcome) -> RelayOutcome {
        #[cfg(feature = "metrics")]
        counter!(relay_metrics::SKIPPED_TOTAL, labels::REASON => outcome.as_str()).increment(1);
        outcome
    }

    /// Download every attachment within the size limit. Oversize and
    /// failed downloads are left out.
    async fn download_attachments(&self, message: &InboundMessage) -> Vec<OutboundFile> {
        let mut files = Vec::new();
        for attachment in &message.attachments {
            if attachment.size > self.limits.max_attachment_bytes {
                debug!(
                    filename = %attachment.filename,
                    size = attachment.size,
                    "attachment over size limit, not re-uploading"
                );
                #[cfg(feature = "metrics")]
                counter!(relay_metrics::OVERSIZE_ATTACHMENTS_TOTAL).increment(1);
                continue;
            }
            match self.fetcher.fetch(attachment).await {
                Ok(data) => files.push(OutboundFile {
                    filename: attachment.filename.clone(),
                    data,
                    spoiler: attachment.spoiler,
                }),
                Err(e) => {
                    error!(filename = %attachment.filename, error = %e, "attachment download failed");
                },
            }
        }
        files
    }
}

/// Build the relayed message: relayable original embeds first, then one
/// metadata embed crediting the source.
#[must_use]
pub fn compose_payload(
    message: &InboundMessage,
    include_author: bool,
    limits: &RelayLimits,
    files: Vec<OutboundFile>,
) -> RelayPayload {
    let max_original = limits.max_original_embeds.min(MAX_EMBEDS_PER_MESSAGE - 1);
    let mut embeds: Vec<Embed> = message
        .embeds
        .iter()
        .filter(|embed| is_relayable_embed(embed))
        .take(max_original)
        .cloned()
        .collect();
    embeds.push(info_embed(message, include_author, limits.description_max_chars));
    RelayPayload { files, embeds }
}

fn info_embed(message: &InboundMessage, include_author: bool, max_chars: usize) -> Embed {
    let description = (!message.content.is_empty())
        .then(|| message.content.chars().take(max_chars).collect::<String>());
    let author = include_author.then(|| EmbedAuthor {
        name: message.author.display_name().to_string(),
        url: None,
        icon_url: message.author.avatar_url.clone(),
    });
    let source = match &message.channel_name {
        Some(name) => format!("#{name}"),
        None => format!("<#{}>", message.channel_id),
    };

    Embed {
        description,
        colour: Some(INFO_COLOUR),
        timestamp: Some(message.created_at),
        author,
        fields: vec![
            EmbedField {
                name: "Source".into(),
                value: source,
                inline: true,
            },
            EmbedField {
                name: "Jump to Original".into(),
                value: format!("[Click here]({})", message.jump_url),
                inline: true,
            },
        ],
        ..Default::default()
    }
}
