//! Background delivery loop: scans the ingested queue and either publishes
//! posts directly or sends moderation previews to the operator chat.
//!
//! The loop is gated twice: by the operator start/stop switch and by screen
//! suspension. The gate is re-checked between posts within a pass, so
//! opening a screen stops the stream mid-batch.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::engine::SessionEngine;
use crate::engine::publish::media_group;
use crate::sanitize::sanitize_description;
use crate::store::Post;
use crate::texts::{callbacks, messages};
use crate::transport::{InlineButton, Recipient, ReplyMarkup, SendOptions};

/// Loop timing, injectable so tests can run under paused time.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryConfig {
    /// Pause between queue scans.
    pub scan_interval: Duration,
    /// Pause between consecutive posts within one pass.
    pub pace_interval: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(10),
            pace_interval: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for DeliveryConfig {
    fn from(config: &Config) -> Self {
        Self {
            scan_interval: config.scan_interval(),
            pace_interval: config.pace_interval(),
        }
    }
}

/// Spawn the per-session delivery loop. Runs until the engine is dropped
/// by the registry (the loop holds its own handle on the engine).
pub fn spawn_delivery_loop(engine: Arc<SessionEngine>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(engine.delivery.scan_interval).await;
            engine.run_delivery_pass().await;
        }
    })
}

impl SessionEngine {
    /// One scan over the queue: deliver every post that is neither sent nor
    /// deleted, pacing between posts and re-checking the gate each step.
    pub(crate) async fn run_delivery_pass(self: &Arc<Self>) {
        if !self.delivery_gate_open().await {
            return;
        }

        let connection = match self.store.find_connection(self.chat_id).await {
            Ok(Some(connection)) => connection,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(chat_id = self.chat_id, "Delivery scan failed: {e}");
                return;
            }
        };

        let pending: Vec<Post> = connection
            .posts
            .iter()
            .filter(|post| !post.sended && !post.deleted)
            .cloned()
            .collect();
        if pending.is_empty() {
            return;
        }

        let fast_channel = match connection.my_channels.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };

        for post in pending {
            let direct = fast_channel
                .as_ref()
                .filter(|_| connection.absolute_channels.contains(&post.channel));
            match direct {
                // Fast-path posts go out back to back.
                Some(channel) => self.deliver_direct(&post, channel).await,
                None => {
                    self.deliver_preview(&post).await;
                    if !self.delivery_gate_open().await {
                        return;
                    }
                    tokio::time::sleep(self.delivery.pace_interval).await;
                }
            }
        }
    }

    async fn delivery_gate_open(&self) -> bool {
        self.state.lock().await.delivery_open()
    }

    /// Fast path: a single destination channel and a trusted source, so the
    /// post goes straight out without moderation.
    ///
    /// The post is consumed whether or not the send succeeds; a failure is
    /// reported to the operator but never retried.
    async fn deliver_direct(self: &Arc<Self>, post: &Post, channel: &str) {
        if let Err(e) = self.publisher.publish(&post.link, channel).await {
            tracing::warn!(
                chat_id = self.chat_id,
                link = %post.link,
                "Direct delivery failed: {e}"
            );
            self.send_tracked(&format!("{} {e}", messages::ERROR_PUBLISH), None)
                .await;
        }
        self.mark_sent(&post.link).await;
    }

    /// Moderated path: render the post in the operator chat with
    /// edit/delete/publish buttons, tracked for sibling retraction.
    async fn deliver_preview(self: &Arc<Self>, post: &Post) {
        let buttons = vec![vec![
            InlineButton::new(
                messages::BUTTON_EDIT,
                callbacks::encode(callbacks::EDIT_POST, &post.link),
            ),
            InlineButton::new(
                messages::BUTTON_DELETE,
                callbacks::encode(callbacks::DELETE_POST, &post.link),
            ),
            InlineButton::new(
                messages::BUTTON_PUBLISH,
                callbacks::encode(callbacks::POST_IMMEDIATELY, &post.link),
            ),
        ]];

        let description = sanitize_description(&post.description);
        // Preview-only placeholder; the publish path sends no caption instead.
        let body = if description.is_empty() {
            messages::CHOOSE_ACTION.to_string()
        } else {
            description
        };

        if !post.media.is_empty() {
            match self
                .transport
                .send_media_group(Recipient::Chat(self.chat_id), media_group(post))
                .await
            {
                Ok(sent) => self.delivered.lock().await.push_group(&sent),
                Err(e) => {
                    tracing::warn!(
                        chat_id = self.chat_id,
                        link = %post.link,
                        "Preview media failed: {e}"
                    );
                }
            }
        }

        let opts = SendOptions {
            reply_markup: Some(ReplyMarkup::Inline(buttons)),
            disable_link_preview: true,
        };
        match self
            .transport
            .send_message(Recipient::Chat(self.chat_id), &body, opts)
            .await
        {
            Ok(message) => self.delivered.lock().await.push_single(message, true),
            Err(e) => {
                tracing::warn!(
                    chat_id = self.chat_id,
                    link = %post.link,
                    "Preview send failed: {e}"
                );
            }
        }

        // Consumed either way; a failed preview is not retried.
        self.mark_sent(&post.link).await;
    }

    async fn mark_sent(&self, link: &str) {
        if let Err(e) = self.store.mark_post_sent(self.chat_id, link).await {
            tracing::warn!(chat_id = self.chat_id, link, "Failed to mark post sent: {e}");
        }
    }
}
