//! Fakes shared by the unit tests of this crate.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, MutexGuard, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    bytes::Bytes,
    chrono::{TimeZone, Utc},
    mediacopy_channels::{
        Attachment, Author, ChannelAccess, ChannelId, ChatGateway, Error as GatewayError, GuildId,
        InboundMessage, MessageId, RelayPayload,
    },
    mediacopy_config::{GuildSettings, MemorySettingsStore, RelayConfig},
};

use crate::{
    Error, Result,
    clock::{Clock, ManualClock},
    executor::RelayExecutor,
    fetch::AttachmentFetcher,
    pipeline::{RelayPipeline, SharedState, lock_state},
    queue::CandidateEntry,
};

pub(crate) const GUILD: GuildId = GuildId(1);
pub(crate) const DESTINATION: ChannelId = ChannelId(50);

/// Guild 1 message in `channel` with one small png attachment.
pub(crate) fn media_message(id: u64, channel: u64) -> InboundMessage {
    InboundMessage {
        id: MessageId(id),
        guild_id: Some(GUILD),
        channel_id: ChannelId(channel),
        channel_name: Some("general".into()),
        author: Author {
            name: "poster".into(),
            display_name: Some("Poster".into()),
            avatar_url: Some("https://cdn.example/avatar.png".into()),
            bot: false,
        },
        content: String::new(),
        attachments: vec![Attachment {
            filename: "a.png".into(),
            url: "https://cdn.example/a.png".into(),
            size: 1024,
            spoiler: false,
        }],
        embeds: vec![],
        created_at: Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap_or_default(),
        jump_url: format!("https://discord.com/channels/{GUILD}/{channel}/{id}"),
    }
}

#[derive(Default)]
struct GatewayState {
    messages: HashMap<MessageId, InboundMessage>,
    access: Option<ChannelAccess>,
    fail_fetch: bool,
    fail_send: bool,
    panic_on_fetch: HashSet<MessageId>,
    calls: usize,
    sent: Vec<(ChannelId, RelayPayload)>,
    relayed_at_fetch: Vec<bool>,
}

pub(crate) struct FakeGateway {
    state: Mutex<GatewayState>,
    pipeline: OnceLock<SharedState>,
}

impl FakeGateway {
    fn new() -> Self {
        Self {
            state: Mutex::new(GatewayState {
                access: Some(ChannelAccess {
                    name: "media".into(),
                    can_send: true,
                    can_attach: true,
                }),
                ..Default::default()
            }),
            pipeline: OnceLock::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_message(&self, message: InboundMessage) {
        self.lock().messages.insert(message.id, message);
    }

    pub(crate) fn set_access(&self, access: Option<ChannelAccess>) {
        self.lock().access = access;
    }

    pub(crate) fn fail_fetch(&self) {
        self.lock().fail_fetch = true;
    }

    pub(crate) fn fail_send(&self) {
        self.lock().fail_send = true;
    }

    pub(crate) fn panic_on_fetch(&self, id: MessageId) {
        self.lock().panic_on_fetch.insert(id);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.lock().calls
    }

    pub(crate) fn sent(&self) -> Vec<(ChannelId, RelayPayload)> {
        self.lock().sent.clone()
    }

    /// For each fetch, whether the id was already recorded as relayed.
    pub(crate) fn relayed_at_fetch(&self) -> Vec<bool> {
        self.lock().relayed_at_fetch.clone()
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    async fn fetch_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> mediacopy_channels::Result<InboundMessage> {
        let relayed = self
            .pipeline
            .get()
            .is_some_and(|state| lock_state(state).ledger.is_relayed(message_id));
        let mut state = self.lock();
        state.calls += 1;
        state.relayed_at_fetch.push(relayed);
        if state.panic_on_fetch.contains(&message_id) {
            drop(state);
            panic!("fetch exploded");
        }
        if state.fail_fetch {
            return Err(GatewayError::unavailable("not connected"));
        }
        state
            .messages
            .get(&message_id)
            .cloned()
            .ok_or_else(|| GatewayError::message_not_found(message_id))
    }

    async fn destination_access(
        &self,
        _guild_id: GuildId,
        _channel_id: ChannelId,
    ) -> mediacopy_channels::Result<Option<ChannelAccess>> {
        let mut state = self.lock();
        state.calls += 1;
        Ok(state.access.clone())
    }

    async fn send_relay(
        &self,
        channel_id: ChannelId,
        payload: RelayPayload,
    ) -> mediacopy_channels::Result<()> {
        let mut state = self.lock();
        state.calls += 1;
        if state.fail_send {
            return Err(GatewayError::unavailable("send rejected"));
        }
        state.sent.push((channel_id, payload));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeFetcher {
    fail: AtomicBool,
}

impl FakeFetcher {
    pub(crate) fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttachmentFetcher for FakeFetcher {
    async fn fetch(&self, attachment: &Attachment) -> Result<Bytes> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::message(format!("cannot download {}", attachment.url)));
        }
        Ok(Bytes::from_static(b"media bytes"))
    }
}

/// Pipeline wired to fakes. Guild 1 relays channel 10 into channel 50.
pub(crate) struct Harness {
    pub(crate) pipeline: RelayPipeline,
    pub(crate) gateway: Arc<FakeGateway>,
    pub(crate) fetcher: Arc<FakeFetcher>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) destination: ChannelId,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_config(RelayConfig {
            send_delay_ms: 0,
            ..Default::default()
        })
    }

    pub(crate) fn with_config(config: RelayConfig) -> Self {
        let settings = Arc::new(MemorySettingsStore::with_guilds([(GUILD, GuildSettings {
            destination_channel: Some(DESTINATION),
            monitored_channels: [ChannelId(10)].into(),
            ..Default::default()
        })]));
        let gateway = Arc::new(FakeGateway::new());
        let fetcher = Arc::new(FakeFetcher::default());
        let clock = Arc::new(ManualClock::new());
        let pipeline = RelayPipeline::new(
            &config,
            settings,
            Arc::clone(&gateway) as Arc<dyn ChatGateway>,
            Arc::clone(&fetcher) as Arc<dyn AttachmentFetcher>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        let _ = gateway.pipeline.set(Arc::clone(&pipeline.state));
        Self {
            pipeline,
            gateway,
            fetcher,
            clock,
            destination: DESTINATION,
        }
    }

    pub(crate) fn executor(&self) -> &RelayExecutor {
        self.pipeline.executor()
    }

    /// Entry for `message` as if it had just become due.
    pub(crate) fn candidate(&self, message: InboundMessage) -> CandidateEntry {
        CandidateEntry {
            id: message.id,
            guild_id: message.guild_id,
            channel_id: message.channel_id,
            arrival: self.clock.now(),
            has_twitter_link: false,
            required_wait: Duration::from_secs(3),
            processed: false,
            snapshot: message,
        }
    }
}
