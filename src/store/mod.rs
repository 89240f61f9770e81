//! Connection store contract and persisted entities.
//!
//! One `Connection` document per chat, with the post queue and channel lists
//! embedded. The engine mutates single fields through the narrow
//! [`ConnectionStore`] trait; it never rewrites whole documents.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Media classification carried on each attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// One media attachment embedded in a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub uuid: Uuid,
    /// Platform content reference (file id or URL).
    pub url: String,
    pub kind: MediaKind,
    pub size_bytes: u64,
}

impl MediaItem {
    /// Create a media item with a fresh uuid, as when the user attaches
    /// media during editing.
    pub fn new(url: impl Into<String>, kind: MediaKind, size_bytes: u64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            url: url.into(),
            kind,
            size_bytes,
        }
    }
}

/// One content item queued for delivery.
///
/// `sended` is monotonic: once true it is never reset. A post with
/// `deleted` set is permanently excluded from delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Stable identifier, unique within a connection.
    pub link: String,
    /// Source channel the post was scraped from.
    pub channel: String,
    /// Description in the constrained HTML subset.
    pub description: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub sended: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Optional signature appended to published posts instead of the
/// `@channel` self-tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub url: String,
    pub label: String,
}

/// Per-chat persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub chat_id: i64,
    #[serde(default)]
    pub posts: Vec<Post>,
    /// Destinations the operator may publish to.
    #[serde(default)]
    pub my_channels: Vec<String>,
    /// Source channels whose posts bypass moderation when exactly one
    /// destination is configured.
    #[serde(default)]
    pub absolute_channels: Vec<String>,
    /// Sources tracked by the ingestion pipeline (informational).
    #[serde(default)]
    pub subscribed_channels: Vec<String>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

impl Connection {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            posts: Vec::new(),
            my_channels: Vec::new(),
            absolute_channels: Vec::new(),
            subscribed_channels: Vec::new(),
            signature: None,
        }
    }
}

/// The narrow store interface the engine uses.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Fetch a connection document, if one exists.
    async fn find_connection(&self, chat_id: i64) -> Result<Option<Connection>, StoreError>;

    /// Insert a fresh connection document.
    async fn insert_connection(&self, connection: Connection) -> Result<(), StoreError>;

    /// Fetch one post by link.
    async fn find_post(&self, chat_id: i64, link: &str) -> Result<Option<Post>, StoreError>;

    /// Overwrite a post's description.
    async fn set_post_description(
        &self,
        chat_id: i64,
        link: &str,
        description: &str,
    ) -> Result<(), StoreError>;

    /// Mark a post as consumed by delivery. Monotonic.
    async fn mark_post_sent(&self, chat_id: i64, link: &str) -> Result<(), StoreError>;

    /// Mark a post as deleted, excluding it from delivery.
    async fn mark_post_deleted(&self, chat_id: i64, link: &str) -> Result<(), StoreError>;

    /// Append a media item to a post.
    async fn push_media_item(
        &self,
        chat_id: i64,
        link: &str,
        item: MediaItem,
    ) -> Result<(), StoreError>;

    /// Remove the media item with the given uuid from a post.
    async fn pull_media_item(
        &self,
        chat_id: i64,
        link: &str,
        uuid: Uuid,
    ) -> Result<(), StoreError>;

    /// Replace the destination channel list.
    async fn set_my_channels(&self, chat_id: i64, channels: Vec<String>) -> Result<(), StoreError>;

    /// Replace the fast-path source channel list.
    async fn set_absolute_channels(
        &self,
        chat_id: i64,
        channels: Vec<String>,
    ) -> Result<(), StoreError>;

    /// Replace the tracked source channel list.
    async fn set_subscribed_channels(
        &self,
        chat_id: i64,
        channels: Vec<String>,
    ) -> Result<(), StoreError>;

    /// Replace the publish signature.
    async fn set_signature(
        &self,
        chat_id: i64,
        signature: Option<Signature>,
    ) -> Result<(), StoreError>;

    /// Bulk-remove all posts already marked sent.
    async fn pull_sent_posts(&self, chat_id: i64) -> Result<(), StoreError>;
}
