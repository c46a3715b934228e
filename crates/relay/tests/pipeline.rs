#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end scenarios: submit through the pipeline, drive ticks with a
//! manual clock, observe what reaches the fake gateway.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock, Weak},
    time::Duration,
};

use {
    async_trait::async_trait,
    bytes::Bytes,
    chrono::Utc,
    mediacopy_channels::{
        Attachment, Author, ChannelAccess, ChannelId, ChatGateway, Embed, EmbedMedia, GuildId,
        InboundMessage, MessageId, RelayPayload,
    },
    mediacopy_config::{GuildSettings, MemorySettingsStore, RelayConfig},
    mediacopy_relay::{
        AttachmentFetcher, Clock, IdentityState, Intake, ManualClock, RelayPipeline,
    },
};

const GUILD: GuildId = GuildId(7);
const DESTINATION: ChannelId = ChannelId(500);

#[derive(Default)]
struct Recorded {
    live: HashMap<MessageId, InboundMessage>,
    fetches: usize,
    sent: Vec<(ChannelId, RelayPayload)>,
    state_at_fetch: Vec<IdentityState>,
}

#[derive(Default)]
struct Gateway {
    recorded: Mutex<Recorded>,
    pipeline: OnceLock<Weak<RelayPipeline>>,
}

impl Gateway {
    fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

#[async_trait]
impl ChatGateway for Gateway {
    async fn fetch_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> mediacopy_channels::Result<InboundMessage> {
        let state = self
            .pipeline
            .get()
            .and_then(Weak::upgrade)
            .map(|p| p.identity_state(message_id));
        let mut recorded = self.recorded();
        recorded.fetches += 1;
        recorded.state_at_fetch.extend(state);
        recorded
            .live
            .get(&message_id)
            .cloned()
            .ok_or_else(|| mediacopy_channels::Error::message_not_found(message_id))
    }

    async fn destination_access(
        &self,
        _guild_id: GuildId,
        _channel_id: ChannelId,
    ) -> mediacopy_channels::Result<Option<ChannelAccess>> {
        Ok(Some(ChannelAccess {
            name: "media".into(),
            can_send: true,
            can_attach: true,
        }))
    }

    async fn send_relay(
        &self,
        channel_id: ChannelId,
        payload: RelayPayload,
    ) -> mediacopy_channels::Result<()> {
        self.recorded().sent.push((channel_id, payload));
        Ok(())
    }
}

struct Fetcher;

#[async_trait]
impl AttachmentFetcher for Fetcher {
    async fn fetch(&self, _attachment: &Attachment) -> mediacopy_relay::Result<Bytes> {
        Ok(Bytes::from_static(b"png"))
    }
}

struct World {
    pipeline: Arc<RelayPipeline>,
    gateway: Arc<Gateway>,
    clock: Arc<ManualClock>,
}

impl World {
    fn new(settings: GuildSettings) -> Self {
        let gateway = Arc::new(Gateway::default());
        let clock = Arc::new(ManualClock::new());
        let config = RelayConfig {
            send_delay_ms: 0,
            ..Default::default()
        };
        let pipeline = Arc::new(RelayPipeline::new(
            &config,
            Arc::new(MemorySettingsStore::with_guilds([(GUILD, settings)])),
            Arc::clone(&gateway) as Arc<dyn ChatGateway>,
            Arc::new(Fetcher),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let _ = gateway.pipeline.set(Arc::downgrade(&pipeline));
        Self {
            pipeline,
            gateway,
            clock,
        }
    }

    fn monitoring(channels: &[u64]) -> Self {
        Self::new(GuildSettings {
            destination_channel: Some(DESTINATION),
            monitored_channels: channels.iter().copied().map(ChannelId).collect(),
            ..Default::default()
        })
    }

    async fn advance_and_tick(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
        self.pipeline.tick().await;
    }

    fn sent(&self) -> Vec<(ChannelId, RelayPayload)> {
        self.gateway.recorded().sent.clone()
    }
}

fn message(id: u64, channel: u64, content: &str) -> InboundMessage {
    InboundMessage {
        id: MessageId(id),
        guild_id: Some(GUILD),
        channel_id: ChannelId(channel),
        channel_name: Some(format!("chan-{channel}")),
        author: Author {
            name: "someone".into(),
            ..Default::default()
        },
        content: content.into(),
        attachments: vec![],
        embeds: vec![],
        created_at: Utc::now(),
        jump_url: format!("https://discord.com/channels/{GUILD}/{channel}/{id}"),
    }
}

fn with_png(mut msg: InboundMessage) -> InboundMessage {
    msg.attachments.push(Attachment {
        filename: "photo.PNG".into(),
        url: "https://cdn.example/photo.PNG".into(),
        size: 2048,
        spoiler: false,
    });
    msg
}

fn image_embed(n: usize) -> Embed {
    Embed {
        kind: Some("image".into()),
        url: Some(format!("https://img.example/{n}")),
        image: Some(EmbedMedia::new(format!("https://img.example/{n}.png"))),
        ..Default::default()
    }
}

#[tokio::test]
async fn png_upload_is_relayed_after_short_wait() {
    let world = World::monitoring(&[10]);
    assert_eq!(
        world.pipeline.submit(with_png(message(1, 10, "look"))).await,
        Intake::Enqueued
    );

    world.advance_and_tick(2).await;
    assert!(world.sent().is_empty());

    world.advance_and_tick(1).await;
    let sent = world.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, DESTINATION);
    assert_eq!(sent[0].1.files.len(), 1);
    assert_eq!(sent[0].1.files[0].filename, "photo.PNG");
}

#[tokio::test]
async fn duplicate_deliveries_queue_once() {
    let world = World::monitoring(&[10]);
    let msg = with_png(message(1, 10, ""));
    assert_eq!(world.pipeline.submit(msg.clone()).await, Intake::Enqueued);
    assert_eq!(world.pipeline.submit(msg.clone()).await, Intake::Duplicate);
    assert_eq!(world.pipeline.submit(msg).await, Intake::Duplicate);
    assert_eq!(world.pipeline.queue_len(), 1);

    world.advance_and_tick(3).await;
    assert_eq!(world.sent().len(), 1);
}

#[tokio::test]
async fn relayed_message_is_never_relayed_again() {
    let world = World::monitoring(&[10]);
    let msg = with_png(message(1, 10, ""));
    world.pipeline.submit(msg.clone()).await;
    world.advance_and_tick(3).await;
    assert_eq!(world.sent().len(), 1);
    let fetches = world.gateway.recorded().fetches;

    // seen window passes, the platform redelivers the event
    world.advance_and_tick(301).await;
    assert_eq!(world.pipeline.submit(msg).await, Intake::AlreadyRelayed);
    world.advance_and_tick(10).await;

    assert_eq!(world.sent().len(), 1);
    assert_eq!(world.gateway.recorded().fetches, fetches);
}

#[tokio::test]
async fn twitter_link_waits_for_its_preview() {
    let world = World::monitoring(&[10]);
    let msg = message(1, 10, "https://twitter.com/user/status/123");
    assert_eq!(world.pipeline.submit(msg.clone()).await, Intake::Enqueued);

    world.advance_and_tick(3).await;
    assert_eq!(world.gateway.recorded().fetches, 0);

    // by the time the long wait ends the preview has rendered
    let mut live = msg;
    live.embeds.push(Embed {
        kind: Some("rich".into()),
        url: Some("https://twitter.com/user/status/123".into()),
        thumbnail: Some(EmbedMedia::new("https://pbs.example/thumb.jpg")),
        ..Default::default()
    });
    world.gateway.recorded().live.insert(live.id, live);

    world.advance_and_tick(5).await;
    let sent = world.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.embeds.len(), 2);
}

#[tokio::test]
async fn twitter_link_without_preview_is_dropped() {
    let world = World::monitoring(&[10]);
    world
        .pipeline
        .submit(message(1, 10, "https://x.com/user/status/9"))
        .await;

    world.advance_and_tick(8).await;
    assert!(world.sent().is_empty());
    assert_eq!(world.pipeline.queue_len(), 0);
    assert_eq!(
        world.pipeline.identity_state(MessageId(1)),
        IdentityState::Relayed
    );
}

#[tokio::test]
async fn monitor_all_respects_exclusions_and_destination() {
    let world = World::new(GuildSettings {
        destination_channel: Some(DESTINATION),
        monitor_all: true,
        excluded_channels: [ChannelId(11)].into(),
        ..Default::default()
    });

    let relayed = with_png(message(1, 12, ""));
    for _ in 0..3 {
        world.pipeline.submit(relayed.clone()).await;
    }
    world.pipeline.submit(with_png(message(2, 11, ""))).await;
    world
        .pipeline
        .submit(with_png(message(3, DESTINATION.get(), "")))
        .await;

    for _ in 0..4 {
        world.advance_and_tick(5).await;
    }
    let sent = world.sent();
    assert_eq!(sent.len(), 1);
    assert!(
        sent[0].1.embeds[0].fields[1]
            .value
            .ends_with("/12/1)")
    );
}

#[tokio::test]
async fn eleven_embeds_are_capped_at_ten() {
    let world = World::monitoring(&[10]);
    let mut msg = message(1, 10, "gallery");
    msg.embeds = (0..11).map(image_embed).collect();
    world.pipeline.submit(msg).await;

    world.advance_and_tick(3).await;
    let sent = world.sent();
    let embeds = &sent[0].1.embeds;
    assert_eq!(embeds.len(), 10);
    assert_eq!(embeds[8], image_embed(8));
    assert_eq!(embeds[9].description.as_deref(), Some("gallery"));
}

#[tokio::test]
async fn relayed_set_is_capped() {
    let world = World::monitoring(&[10]);
    for id in 1..=501 {
        world.pipeline.submit(with_png(message(id, 10, ""))).await;
    }
    world.advance_and_tick(3).await;

    assert_eq!(world.sent().len(), 501);
    assert_eq!(world.pipeline.relayed_len(), 300);
    assert_eq!(
        world.pipeline.identity_state(MessageId(501)),
        IdentityState::Relayed
    );
    assert_ne!(
        world.pipeline.identity_state(MessageId(1)),
        IdentityState::Relayed
    );
}

#[tokio::test]
async fn id_is_relayed_before_the_refetch() {
    let world = World::monitoring(&[10]);
    world.pipeline.submit(with_png(message(1, 10, ""))).await;
    world.advance_and_tick(3).await;

    assert_eq!(world.gateway.recorded().state_at_fetch, vec![
        IdentityState::Relayed
    ]);
}
