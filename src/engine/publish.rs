//! Publish engine: formatting and sending a single post to a channel.
//!
//! One caption rule governs the media path: a non-empty sanitized
//! description shorter than [`CAPTION_LIMIT`] rides as the caption of the
//! first media item; at or past the limit it is sent as a separate follow-up
//! message with the link preview disabled; an empty description means no
//! caption at all. The signature (or `@channel` self-tag) is appended to
//! whichever text is sent.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{StoreError, TransportError};
use crate::sanitize::sanitize_description;
use crate::store::{ConnectionStore, Post, Signature};
use crate::transport::{MediaGroupItem, Recipient, SendOptions, Transport};

/// Captions at or past this length move to a follow-up message.
pub const CAPTION_LIMIT: usize = 1024;

/// Failure of a publish attempt, surfaced to the operator on interactive
/// paths and only logged on the delayed path.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Sends formatted posts to destination channels.
pub struct PublishEngine {
    chat_id: i64,
    store: Arc<dyn ConnectionStore>,
    transport: Arc<dyn Transport>,
}

/// Append the signature, or the `@channel` self-tag when none is
/// configured. The signature always replaces the self-tag, never both.
pub fn signed_text(description: &str, channel: &str, signature: Option<&Signature>) -> String {
    match signature {
        Some(sig) => format!(
            "{description}\n\n<a href=\"{}\">{}</a>",
            sig.url, sig.label
        ),
        None => format!("{description}\n\n@{channel}"),
    }
}

/// Whether a sanitized description can ride as a media-group caption.
pub fn caption_fits(description: &str) -> bool {
    !description.is_empty() && description.chars().count() < CAPTION_LIMIT
}

/// Compose the outbound media group for a post, in media order.
pub fn media_group(post: &Post) -> Vec<MediaGroupItem> {
    post.media
        .iter()
        .map(|item| MediaGroupItem {
            kind: item.kind,
            file: item.url.clone(),
            caption: None,
        })
        .collect()
}

impl PublishEngine {
    pub fn new(
        chat_id: i64,
        store: Arc<dyn ConnectionStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            chat_id,
            store,
            transport,
        }
    }

    /// Read the post fresh and publish it to the channel.
    pub async fn publish(&self, link: &str, channel: &str) -> Result<(), PublishError> {
        let post = self
            .store
            .find_post(self.chat_id, link)
            .await?
            .ok_or_else(|| StoreError::PostNotFound {
                link: link.to_string(),
            })?;
        let signature = self
            .store
            .find_connection(self.chat_id)
            .await?
            .and_then(|connection| connection.signature);

        self.send_formatted(&post, channel, signature.as_ref()).await
    }

    async fn send_formatted(
        &self,
        post: &Post,
        channel: &str,
        signature: Option<&Signature>,
    ) -> Result<(), PublishError> {
        let to = Recipient::Channel(channel.to_string());
        let description = sanitize_description(&post.description);

        if post.media.is_empty() {
            let text = signed_text(&description, channel, signature);
            self.transport
                .send_message(to, &text, SendOptions::default().no_preview())
                .await?;
            return Ok(());
        }

        let mut group = media_group(post);
        if caption_fits(&description) {
            group[0].caption = Some(signed_text(&description, channel, signature));
            self.transport.send_media_group(to, group).await?;
        } else if !description.is_empty() {
            self.transport.send_media_group(to.clone(), group).await?;
            let text = signed_text(&description, channel, signature);
            self.transport
                .send_message(to, &text, SendOptions::default().no_preview())
                .await?;
        } else {
            self.transport.send_media_group(to, group).await?;
        }

        Ok(())
    }

    /// Schedule a one-shot delayed publish.
    ///
    /// Fire-and-forget: the post is re-read when the timer fires (it may
    /// have been edited since scheduling), and any failure is logged, not
    /// surfaced. There is no cancellation; a post deleted before the timer
    /// fires is still published.
    pub fn schedule_delayed(
        self: &Arc<Self>,
        link: String,
        channel: String,
        delay: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = engine.publish(&link, &channel).await {
                tracing::warn!(
                    chat_id = engine.chat_id,
                    link = %link,
                    channel = %channel,
                    "Delayed publish failed: {e}"
                );
            }
        })
    }
}
