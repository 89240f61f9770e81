//! In-process connection store.
//!
//! Documents live for the process lifetime, matching the session lifecycle:
//! created on first `/start`, torn down only at exit. The ingestion pipeline
//! (and tests) insert posts by mutating the same shared map.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{Connection, ConnectionStore, MediaItem, Post, Signature};

/// Store backed by an in-memory map keyed by chat id.
#[derive(Default)]
pub struct MemoryStore {
    connections: Arc<RwLock<HashMap<i64, Connection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a post to a connection's queue.
    ///
    /// This is the ingestion side of the store; the engine itself never
    /// creates posts.
    pub async fn ingest_post(&self, chat_id: i64, post: Post) -> Result<(), StoreError> {
        let mut connections = self.connections.write().await;
        let connection = connections
            .get_mut(&chat_id)
            .ok_or(StoreError::ConnectionNotFound { chat_id })?;
        connection.posts.push(post);
        Ok(())
    }

    async fn with_connection<T>(
        &self,
        chat_id: i64,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut connections = self.connections.write().await;
        let connection = connections
            .get_mut(&chat_id)
            .ok_or(StoreError::ConnectionNotFound { chat_id })?;
        f(connection)
    }

    async fn with_post<T>(
        &self,
        chat_id: i64,
        link: &str,
        f: impl FnOnce(&mut Post) -> T,
    ) -> Result<T, StoreError> {
        self.with_connection(chat_id, |connection| {
            let post = connection
                .posts
                .iter_mut()
                .find(|post| post.link == link)
                .ok_or_else(|| StoreError::PostNotFound {
                    link: link.to_string(),
                })?;
            Ok(f(post))
        })
        .await
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn find_connection(&self, chat_id: i64) -> Result<Option<Connection>, StoreError> {
        let connections = self.connections.read().await;
        Ok(connections.get(&chat_id).cloned())
    }

    async fn insert_connection(&self, connection: Connection) -> Result<(), StoreError> {
        let mut connections = self.connections.write().await;
        connections.entry(connection.chat_id).or_insert(connection);
        Ok(())
    }

    async fn find_post(&self, chat_id: i64, link: &str) -> Result<Option<Post>, StoreError> {
        let connections = self.connections.read().await;
        let connection = connections
            .get(&chat_id)
            .ok_or(StoreError::ConnectionNotFound { chat_id })?;
        Ok(connection.posts.iter().find(|p| p.link == link).cloned())
    }

    async fn set_post_description(
        &self,
        chat_id: i64,
        link: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.with_post(chat_id, link, |post| {
            post.description = description.to_string();
        })
        .await
    }

    async fn mark_post_sent(&self, chat_id: i64, link: &str) -> Result<(), StoreError> {
        self.with_post(chat_id, link, |post| post.sended = true).await
    }

    async fn mark_post_deleted(&self, chat_id: i64, link: &str) -> Result<(), StoreError> {
        self.with_post(chat_id, link, |post| post.deleted = true).await
    }

    async fn push_media_item(
        &self,
        chat_id: i64,
        link: &str,
        item: MediaItem,
    ) -> Result<(), StoreError> {
        self.with_post(chat_id, link, |post| post.media.push(item)).await
    }

    async fn pull_media_item(
        &self,
        chat_id: i64,
        link: &str,
        uuid: Uuid,
    ) -> Result<(), StoreError> {
        self.with_post(chat_id, link, |post| {
            post.media.retain(|item| item.uuid != uuid);
        })
        .await
    }

    async fn set_my_channels(&self, chat_id: i64, channels: Vec<String>) -> Result<(), StoreError> {
        self.with_connection(chat_id, |connection| {
            connection.my_channels = channels;
            Ok(())
        })
        .await
    }

    async fn set_absolute_channels(
        &self,
        chat_id: i64,
        channels: Vec<String>,
    ) -> Result<(), StoreError> {
        self.with_connection(chat_id, |connection| {
            connection.absolute_channels = channels;
            Ok(())
        })
        .await
    }

    async fn set_subscribed_channels(
        &self,
        chat_id: i64,
        channels: Vec<String>,
    ) -> Result<(), StoreError> {
        self.with_connection(chat_id, |connection| {
            connection.subscribed_channels = channels;
            Ok(())
        })
        .await
    }

    async fn set_signature(
        &self,
        chat_id: i64,
        signature: Option<Signature>,
    ) -> Result<(), StoreError> {
        self.with_connection(chat_id, |connection| {
            connection.signature = signature;
            Ok(())
        })
        .await
    }

    async fn pull_sent_posts(&self, chat_id: i64) -> Result<(), StoreError> {
        self.with_connection(chat_id, |connection| {
            connection.posts.retain(|post| !post.sended);
            Ok(())
        })
        .await
    }
}
