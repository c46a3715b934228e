//! Decides whether a message carries media worth relaying.

use std::sync::LazyLock;

use {
    mediacopy_channels::{Attachment, Embed, InboundMessage},
    regex::Regex,
};

/// Attachment extensions treated as media, compared case-insensitively.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "mp4", "mov", "avi", "webm", "bmp", "tiff",
];

/// Embed kinds that are media by themselves.
const MEDIA_KINDS: &[&str] = &["image", "video", "gifv"];

/// Embed kinds whose thumbnail counts as media.
const THUMBNAIL_KINDS: &[&str] = &["image", "video", "gifv", "article", "link", "rich"];

/// Link-preview kinds that Twitter/X posts render as.
const LINK_KINDS: &[&str] = &["link", "rich", "article"];

#[allow(clippy::expect_used)]
static TWITTER_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?(?:twitter\.com|x\.com)").expect("valid regex")
});

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("valid regex"));

/// Whether the message has a media attachment or a media-bearing embed.
#[must_use]
pub fn is_media(message: &InboundMessage) -> bool {
    message.attachments.iter().any(is_media_attachment) || message.embeds.iter().any(is_media_embed)
}

fn is_media_attachment(attachment: &Attachment) -> bool {
    attachment
        .filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn is_media_embed(embed: &Embed) -> bool {
    let kind = embed.kind();
    if embed.has_image_or_video() || MEDIA_KINDS.contains(&kind) {
        return true;
    }
    if embed.thumbnail.is_some() && THUMBNAIL_KINDS.contains(&kind) {
        return true;
    }
    LINK_KINDS.contains(&kind)
        && embed.url.as_deref().is_some_and(|url| TWITTER_LINK.is_match(url))
        && (embed.thumbnail.is_some() || embed.has_image_or_video())
}

/// Whether an original embed is copied into the relayed message.
#[must_use]
pub fn is_relayable_embed(embed: &Embed) -> bool {
    embed.has_image_or_video() || embed.thumbnail.is_some() || MEDIA_KINDS.contains(&embed.kind())
}

/// Whether `text` links to Twitter/X. Those previews render slowly.
#[must_use]
pub fn contains_twitter_link(text: &str) -> bool {
    TWITTER_LINK.is_match(text)
}

/// Whether `text` contains any http(s) URL that could still gain a preview.
#[must_use]
pub fn contains_url(text: &str) -> bool {
    URL.is_match(text)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::Utc,
        mediacopy_channels::{Author, ChannelId, EmbedMedia, MessageId},
        rstest::rstest,
    };

    fn message(attachments: Vec<Attachment>, embeds: Vec<Embed>) -> InboundMessage {
        InboundMessage {
            id: MessageId(1),
            guild_id: None,
            channel_id: ChannelId(2),
            channel_name: None,
            author: Author::default(),
            content: String::new(),
            attachments,
            embeds,
            created_at: Utc::now(),
            jump_url: String::new(),
        }
    }

    fn attachment(filename: &str) -> Attachment {
        Attachment {
            filename: filename.into(),
            url: format!("https://cdn.example/{filename}"),
            size: 10,
            spoiler: false,
        }
    }

    fn embed(kind: &str) -> Embed {
        Embed {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("cat.png", true)]
    #[case("CLIP.MP4", true)]
    #[case("scan.Tiff", true)]
    #[case(".webp", true)]
    #[case("notes.txt", false)]
    #[case("png", false)]
    #[case("archive.png.zip", false)]
    fn attachment_extensions(#[case] filename: &str, #[case] expected: bool) {
        assert_eq!(is_media(&message(vec![attachment(filename)], vec![])), expected);
    }

    #[rstest]
    #[case("image", true)]
    #[case("video", true)]
    #[case("gifv", true)]
    #[case("article", false)]
    #[case("rich", false)]
    fn bare_embed_kinds(#[case] kind: &str, #[case] expected: bool) {
        assert_eq!(is_media(&message(vec![], vec![embed(kind)])), expected);
    }

    #[test]
    fn embed_image_counts_regardless_of_kind() {
        let mut e = embed("rich");
        e.image = Some(EmbedMedia::new("https://img.example/a.png"));
        assert!(is_media(&message(vec![], vec![e])));
    }

    #[rstest]
    #[case("link", true)]
    #[case("article", true)]
    #[case("poll", false)]
    fn thumbnail_depends_on_kind(#[case] kind: &str, #[case] expected: bool) {
        let mut e = embed(kind);
        e.thumbnail = Some(EmbedMedia::new("https://img.example/t.png"));
        assert_eq!(is_media(&message(vec![], vec![e])), expected);
    }

    #[test]
    fn plain_twitter_link_is_not_media() {
        let mut msg = message(vec![], vec![]);
        msg.content = "look https://twitter.com/user/status/1".into();
        assert!(!is_media(&msg));

        let mut e = embed("link");
        e.url = Some("https://x.com/user/status/1".into());
        msg.embeds.push(e);
        assert!(!is_media(&msg));
    }

    #[rstest]
    #[case("https://twitter.com/a", true)]
    #[case("HTTP://WWW.X.COM/a", true)]
    #[case("see http://x.com/a/status/2 now", true)]
    #[case("https://fox.com/a", false)]
    #[case("twitter.com/a", false)]
    fn twitter_pattern(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(contains_twitter_link(text), expected);
    }

    #[test]
    fn urls_are_detected() {
        assert!(contains_url("clip: https://youtu.be/abc"));
        assert!(!contains_url("no links here"));
    }

    #[test]
    fn relayable_embeds_need_media() {
        let mut thumb = embed("article");
        thumb.thumbnail = Some(EmbedMedia::new("https://img.example/t.png"));
        assert!(is_relayable_embed(&thumb));
        assert!(is_relayable_embed(&embed("gifv")));
        assert!(!is_relayable_embed(&embed("rich")));
    }
}
