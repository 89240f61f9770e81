//! Assistant screen: free-text conversation with the completion service
//! about the post being edited.
//!
//! Each visit starts a fresh conversation: the turn history is cleared on
//! entry, by the explicit update-context command, and whenever a completion
//! fails.

use std::sync::Arc;

use crate::engine::engine::SessionEngine;
use crate::engine::session::NavigationMode;
use crate::llm::ChatTurn;
use crate::sanitize::sanitize_description;
use crate::texts::{self, messages};

impl SessionEngine {
    /// Open the assistant screen with a clean conversation, showing the
    /// post text under discussion.
    pub(crate) async fn go_to_assistant_screen(self: &Arc<Self>) {
        let Some(link) = self.current_post_link().await else {
            return;
        };

        {
            let mut state = self.state.lock().await;
            state.enter(NavigationMode::Assistant);
            state.turn_history.clear();
        }
        self.send_tracked(messages::CURRENT_POST, None).await;
        self.render_post_screen(&link, texts::assistant_keyboard()).await;
        self.send_tracked(messages::ASSISTANT_TIP, Some(texts::assistant_keyboard()))
            .await;
    }

    /// Forward a free-text operator message to the model.
    pub(crate) async fn assistant_message(self: &Arc<Self>, text: &str) {
        self.exchange(ChatTurn::user(text)).await;
    }

    /// One-shot rephrase: prime the conversation with the current post text
    /// and a fixed instruction.
    pub(crate) async fn assistant_rephrase(self: &Arc<Self>) {
        let Some(link) = self.current_post_link().await else {
            return;
        };

        let post = match self.store.find_post(self.chat_id, &link).await {
            Ok(Some(post)) => post,
            Ok(None) => return,
            Err(e) => {
                self.report_store_error(&e).await;
                return;
            }
        };

        let prompt = format!(
            "{}\n\n{}",
            messages::REPHRASE_PROMPT,
            sanitize_description(&post.description)
        );
        self.exchange(ChatTurn::user(prompt)).await;
    }

    /// Append a turn, run the completion, and deliver the answer.
    ///
    /// A failed completion drops the whole conversation so the next attempt
    /// starts clean.
    async fn exchange(self: &Arc<Self>, turn: ChatTurn) {
        let turns = {
            let mut state = self.state.lock().await;
            state.turn_history.push(turn);
            state.turn_history.clone()
        };

        self.send_tracked(messages::ASSISTANT_WAITING, None).await;

        match self.llm.complete(&turns).await {
            Ok(answer) => {
                self.state
                    .lock()
                    .await
                    .turn_history
                    .push(ChatTurn::assistant(&answer));
                self.send_tracked(&answer, Some(texts::assistant_keyboard()))
                    .await;
            }
            Err(e) => {
                tracing::warn!(chat_id = self.chat_id, "Completion failed: {e}");
                self.state.lock().await.turn_history.clear();
                self.send_tracked(
                    &format!("{} {e}", messages::ASSISTANT_ERROR),
                    Some(texts::assistant_keyboard()),
                )
                .await;
            }
        }
    }
}
