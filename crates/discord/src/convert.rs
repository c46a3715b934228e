//! Conversion between serenity models and the platform-neutral types.

use {
    chrono::{DateTime, Utc},
    mediacopy_channels::{
        Attachment, Author, ChannelId, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedMedia,
        GuildId, InboundMessage, MessageId, OutboundFile,
    },
    serenity::all::{
        CreateAttachment, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter,
        Embed as DiscordEmbed, Message, Timestamp,
    },
};

/// Filename prefix Discord uses to mark spoiler attachments.
const SPOILER_PREFIX: &str = "SPOILER_";

fn to_chrono(ts: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_default()
}

/// Snapshot a serenity message. `channel_name` comes from the cache.
pub fn inbound_message(msg: &Message, channel_name: Option<String>) -> InboundMessage {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .or_else(|| msg.author.global_name.clone());

    InboundMessage {
        id: MessageId(msg.id.get()),
        guild_id: msg.guild_id.map(|g| GuildId(g.get())),
        channel_id: ChannelId(msg.channel_id.get()),
        channel_name,
        author: Author {
            name: msg.author.name.clone(),
            display_name,
            avatar_url: Some(msg.author.face()),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment {
                filename: a.filename.clone(),
                url: a.url.clone(),
                size: u64::from(a.size),
                spoiler: a.filename.starts_with(SPOILER_PREFIX),
            })
            .collect(),
        embeds: msg.embeds.iter().map(embed_from_discord).collect(),
        created_at: to_chrono(msg.timestamp),
        jump_url: msg.link(),
    }
}

pub fn embed_from_discord(embed: &DiscordEmbed) -> Embed {
    Embed {
        kind: embed.kind.clone(),
        title: embed.title.clone(),
        description: embed.description.clone(),
        url: embed.url.clone(),
        colour: embed.colour.map(|c| c.0),
        timestamp: embed.timestamp.map(to_chrono),
        author: embed.author.as_ref().map(|a| EmbedAuthor {
            name: a.name.clone(),
            url: a.url.clone(),
            icon_url: a.icon_url.clone(),
        }),
        footer: embed.footer.as_ref().map(|f| EmbedFooter {
            text: f.text.clone(),
            icon_url: f.icon_url.clone(),
        }),
        fields: embed
            .fields
            .iter()
            .map(|f| EmbedField {
                name: f.name.clone(),
                value: f.value.clone(),
                inline: f.inline,
            })
            .collect(),
        image: embed.image.as_ref().map(|i| EmbedMedia::new(&i.url)),
        thumbnail: embed.thumbnail.as_ref().map(|t| EmbedMedia::new(&t.url)),
        video: embed.video.as_ref().map(|v| EmbedMedia::new(&v.url)),
    }
}

/// Build a serenity embed. Bots cannot set an embed video; a video-only
/// embed keeps its url so the client can still render a preview.
pub fn create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(url) = embed.url.as_ref().or(embed.video.as_ref().map(|v| &v.url)) {
        builder = builder.url(url);
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    if let Some(ts) = embed.timestamp
        && let Ok(timestamp) = Timestamp::from_unix_timestamp(ts.timestamp())
    {
        builder = builder.timestamp(timestamp);
    }
    if let Some(author) = &embed.author {
        let mut a = CreateEmbedAuthor::new(&author.name);
        if let Some(url) = &author.url {
            a = a.url(url);
        }
        if let Some(icon) = &author.icon_url {
            a = a.icon_url(icon);
        }
        builder = builder.author(a);
    }
    if let Some(footer) = &embed.footer {
        let mut f = CreateEmbedFooter::new(&footer.text);
        if let Some(icon) = &footer.icon_url {
            f = f.icon_url(icon);
        }
        builder = builder.footer(f);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(image) = &embed.image {
        builder = builder.image(&image.url);
    }
    if let Some(thumbnail) = &embed.thumbnail {
        builder = builder.thumbnail(&thumbnail.url);
    }
    builder
}

pub fn create_attachment(file: &OutboundFile) -> CreateAttachment {
    let filename = if file.spoiler && !file.filename.starts_with(SPOILER_PREFIX) {
        format!("{SPOILER_PREFIX}{}", file.filename)
    } else {
        file.filename.clone()
    };
    CreateAttachment::bytes(file.data.to_vec(), filename)
}
