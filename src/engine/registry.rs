//! Registry of live sessions, one engine per operator chat.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::engine::delivery::DeliveryConfig;
use crate::engine::engine::SessionEngine;
use crate::llm::CompletionService;
use crate::store::ConnectionStore;
use crate::texts::commands;
use crate::transport::{Transport, Update};

/// Owns every live [`SessionEngine`] and routes inbound updates to them.
pub struct SessionRegistry {
    store: Arc<dyn ConnectionStore>,
    transport: Arc<dyn Transport>,
    llm: Arc<dyn CompletionService>,
    delivery: DeliveryConfig,
    sessions: RwLock<HashMap<i64, Arc<SessionEngine>>>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        transport: Arc<dyn Transport>,
        llm: Arc<dyn CompletionService>,
        delivery: DeliveryConfig,
    ) -> Self {
        Self {
            store,
            transport,
            llm,
            delivery,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Route one update. `/start` from an unknown chat boots a session and
    /// is consumed by the bootstrap; anything else from an unknown chat is
    /// dropped.
    pub async fn dispatch(&self, update: Update) {
        let chat_id = update.chat_id();

        if let Some(engine) = self.find(chat_id).await {
            engine.handle_update(update).await;
            return;
        }

        let is_start = matches!(
            &update,
            Update::Message(message) if message.text.as_deref() == Some(commands::START)
        );
        if !is_start {
            tracing::debug!(chat_id, "Update for unknown session dropped");
            return;
        }

        self.get_or_start(chat_id).await;
    }

    async fn find(&self, chat_id: i64) -> Option<Arc<SessionEngine>> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    /// Create and boot the chat's engine if it does not exist yet.
    ///
    /// Double-checked under the write lock so concurrent `/start`s from the
    /// same chat produce a single engine and a single delivery loop.
    pub async fn get_or_start(&self, chat_id: i64) -> Arc<SessionEngine> {
        if let Some(engine) = self.find(chat_id).await {
            return engine;
        }

        let created = {
            let mut sessions = self.sessions.write().await;
            match sessions.get(&chat_id) {
                Some(engine) => {
                    return Arc::clone(engine);
                }
                None => {
                    let engine = SessionEngine::new(
                        chat_id,
                        Arc::clone(&self.store),
                        Arc::clone(&self.transport),
                        Arc::clone(&self.llm),
                        self.delivery,
                    );
                    sessions.insert(chat_id, Arc::clone(&engine));
                    engine
                }
            }
        };

        created.start().await;
        created
    }
}
