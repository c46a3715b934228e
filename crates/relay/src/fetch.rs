//! Attachment downloads for re-upload.

use {async_trait::async_trait, bytes::Bytes, mediacopy_channels::Attachment, tracing::debug};

use crate::{Error, Result};

#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Download the attachment body.
    async fn fetch(&self, attachment: &Attachment) -> Result<Bytes>;
}

/// Downloads attachments from the platform CDN with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpAttachmentFetcher {
    client: reqwest::Client,
}

impl HttpAttachmentFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    async fn fetch(&self, attachment: &Attachment) -> Result<Bytes> {
        debug!(url = %attachment.url, size = attachment.size, "downloading attachment");
        let response = self
            .client
            .get(&attachment.url)
            .send()
            .await
            .map_err(|e| Error::external(format!("download {}", attachment.url), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownloadStatus {
                url: attachment.url.clone(),
                status: status.as_u16(),
            });
        }
        response
            .bytes()
            .await
            .map_err(|e| Error::external(format!("read body of {}", attachment.url), e))
    }
}
