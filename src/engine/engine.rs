//! Session engine: mode-gated command dispatch and screen transitions.
//!
//! Every inbound event for a chat lands in [`SessionEngine::handle_update`].
//! Free text is routed in priority order: pending-prompt reply, media
//! attachment while editing, exact command token for the current mode, then
//! assistant forwarding. Commands issued in the wrong mode are silently
//! ignored; invalid actions are invisible to the user.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::engine::delivery::DeliveryConfig;
use crate::engine::history::MessageHistory;
use crate::engine::publish::{media_group, PublishEngine};
use crate::engine::session::{EditingContext, NavigationMode, PendingPrompt, SessionState};
use crate::error::StoreError;
use crate::llm::CompletionService;
use crate::sanitize::sanitize_description;
use crate::store::{Connection, ConnectionStore, MediaItem, Signature};
use crate::texts::{self, callbacks, commands, messages};
use crate::transport::{
    CallbackEvent, IncomingAttachment, IncomingMessage, InlineButton, Recipient, ReplyMarkup,
    SendOptions, SentMessage, Transport, Update,
};

/// Pause before automatically returning to the idle screen after a
/// successful publish or a scheduled delay.
const RETURN_TO_IDLE_AFTER: Duration = Duration::from_secs(2);

/// One chat's engine: session state, trackers, and collaborators.
pub struct SessionEngine {
    pub(crate) chat_id: i64,
    pub(crate) store: Arc<dyn ConnectionStore>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) llm: Arc<dyn CompletionService>,
    pub(crate) publisher: Arc<PublishEngine>,
    pub(crate) state: Mutex<SessionState>,
    /// Messages emitted while off the idle screen; retracted on return.
    pub(crate) ui: Mutex<MessageHistory>,
    /// Moderated previews emitted by the delivery loop.
    pub(crate) delivered: Mutex<MessageHistory>,
    pub(crate) delivery: DeliveryConfig,
}

impl SessionEngine {
    pub fn new(
        chat_id: i64,
        store: Arc<dyn ConnectionStore>,
        transport: Arc<dyn Transport>,
        llm: Arc<dyn CompletionService>,
        delivery: DeliveryConfig,
    ) -> Arc<Self> {
        let publisher = Arc::new(PublishEngine::new(
            chat_id,
            Arc::clone(&store),
            Arc::clone(&transport),
        ));
        Arc::new(Self {
            chat_id,
            store,
            transport,
            llm,
            publisher,
            state: Mutex::new(SessionState::new()),
            ui: Mutex::new(MessageHistory::new()),
            delivered: Mutex::new(MessageHistory::new()),
            delivery,
        })
    }

    /// First-`/start` bootstrap: ensure the connection document exists,
    /// render the idle menu once, and spawn the delivery loop.
    pub async fn start(self: &Arc<Self>) {
        if let Err(e) = self
            .store
            .insert_connection(Connection::new(self.chat_id))
            .await
        {
            tracing::error!(chat_id = self.chat_id, "Failed to create connection: {e}");
        }
        self.send_tracked(messages::CHOOSE_ACTION, Some(texts::idle_keyboard()))
            .await;
        crate::engine::delivery::spawn_delivery_loop(Arc::clone(self));
        let created_at = self.state.lock().await.created_at;
        tracing::info!(chat_id = self.chat_id, created_at = %created_at, "Session started");
    }

    /// Entry point for all inbound events of this chat.
    pub async fn handle_update(self: &Arc<Self>, update: Update) {
        match update {
            Update::Message(message) => self.handle_message(message).await,
            Update::Callback(event) => self.handle_callback(event).await,
        }
    }

    async fn handle_message(self: &Arc<Self>, message: IncomingMessage) {
        let (mode, pending) = {
            let state = self.state.lock().await;
            (state.mode, state.pending_prompt)
        };

        // The user's own messages are part of the ephemeral UI and get
        // retracted on exit, same as ours.
        if mode != NavigationMode::Idle {
            self.ui.lock().await.push_single(
                SentMessage {
                    message_id: message.message_id,
                },
                false,
            );
        }

        if message.is_reply {
            if let (Some(prompt), Some(text)) = (pending, message.text.as_deref()) {
                self.state.lock().await.pending_prompt = None;
                self.answer_prompt(prompt, text).await;
                return;
            }
        }

        if let Some(attachment) = &message.attachment {
            if mode == NavigationMode::Editing {
                self.add_media(attachment).await;
                return;
            }
        }

        let Some(text) = message.text.as_deref() else {
            return;
        };

        if text == commands::START {
            self.go_to_start_screen().await;
            return;
        }

        use NavigationMode::*;
        match (mode, text) {
            // Idle screen
            (Idle, commands::SHOW_SUBSCRIBED_CHANNELS) => {
                self.show_channels(messages::SUBSCRIBED_CHANNELS_LIST, |c| {
                    c.subscribed_channels.clone()
                })
                .await;
            }
            (Idle, commands::SHOW_MY_CHANNELS) => {
                self.show_channels(messages::MY_CHANNELS_LIST, |c| c.my_channels.clone())
                    .await;
            }
            (Idle, commands::SHOW_ABSOLUTE_CHANNELS) => {
                self.show_channels(messages::ABSOLUTE_CHANNELS_LIST, |c| {
                    c.absolute_channels.clone()
                })
                .await;
            }
            (Idle, commands::UPDATE_SUBSCRIBED_CHANNELS) => {
                self.send_prompt(
                    messages::PROMPT_SUBSCRIBED_CHANNELS,
                    PendingPrompt::SubscribedChannels,
                )
                .await;
            }
            (Idle, commands::UPDATE_MY_CHANNELS) => {
                self.send_prompt(messages::PROMPT_MY_CHANNELS, PendingPrompt::MyChannels)
                    .await;
            }
            (Idle, commands::UPDATE_ABSOLUTE_CHANNELS) => {
                self.send_prompt(
                    messages::PROMPT_ABSOLUTE_CHANNELS,
                    PendingPrompt::AbsoluteChannels,
                )
                .await;
            }
            (Idle, commands::UPDATE_SIGNATURE) => {
                self.send_prompt(messages::PROMPT_SIGNATURE, PendingPrompt::Signature)
                    .await;
            }
            (Idle, commands::START_DELIVERY) => {
                self.state.lock().await.delivery_active = true;
                self.send_tracked(messages::DELIVERY_STARTED, Some(texts::idle_keyboard()))
                    .await;
            }
            (Idle, commands::STOP_DELIVERY) => {
                self.state.lock().await.delivery_active = false;
                self.send_tracked(messages::DELIVERY_STOPPED, Some(texts::idle_keyboard()))
                    .await;
            }
            (Idle, commands::CLEAR_SENT_POSTS) => self.clear_sent_posts().await,

            // Editing screen
            (Editing, commands::EDIT_TEXT) => {
                self.send_prompt(messages::PROMPT_EDIT_TEXT, PendingPrompt::EditText)
                    .await;
            }
            (Editing, commands::ADD_SUBSCRIBE_TAG) => {
                self.send_channel_chooser(
                    messages::CHOOSE_SUBSCRIBE_CHANNEL,
                    callbacks::ADD_SUBSCRIBE_CHANNEL,
                )
                .await;
            }
            (Editing, commands::EDIT_MEDIA) => self.show_media_gallery().await,
            (Editing, commands::PUBLISH_POST) => self.go_to_publishing_screen().await,
            (Editing, commands::GO_TO_ASSISTANT) => self.go_to_assistant_screen().await,
            (Editing, commands::BACK) => self.go_to_start_screen().await,

            // Publishing screen
            (Publishing, commands::PUBLISH_NOW) => self.publish_now().await,
            (Publishing, commands::DELAY_PUBLISH) => self.ask_for_delay().await,
            (Publishing, commands::CHANGE_CHANNEL) => {
                self.send_channel_chooser(
                    messages::CHOOSE_PUBLISH_CHANNEL,
                    callbacks::CHOOSE_PUBLISH_CHANNEL,
                )
                .await;
            }
            (Publishing, commands::BACK) => self.back_to_editing().await,

            // Assistant screen
            (Assistant, commands::ASSISTANT_EDIT_TEXT) => {
                self.send_prompt(messages::PROMPT_EDIT_TEXT, PendingPrompt::AssistantEditText)
                    .await;
            }
            (Assistant, commands::UPDATE_CONTEXT) => {
                self.state.lock().await.turn_history.clear();
                self.send_tracked(messages::CONTEXT_UPDATED, Some(texts::assistant_keyboard()))
                    .await;
            }
            (Assistant, commands::REPHRASE) => self.assistant_rephrase().await,
            (Assistant, commands::BACK) => self.back_to_editing().await,

            // Anything else typed on the assistant screen goes to the model;
            // out-of-mode commands are dropped without a response.
            (Assistant, other) => self.assistant_message(other).await,
            _ => {
                tracing::debug!(chat_id = self.chat_id, ?mode, text, "Ignored input");
            }
        }
    }

    async fn handle_callback(self: &Arc<Self>, event: CallbackEvent) {
        let (action, data) = callbacks::decode(&event.data);
        match action {
            callbacks::DELETE_POST => {
                if let Err(e) = self.store.mark_post_deleted(self.chat_id, data).await {
                    self.report_store_error(&e).await;
                    return;
                }
                self.delivered
                    .lock()
                    .await
                    .retract_preview(&self.transport, self.chat_id, event.message_id)
                    .await;
            }
            callbacks::DELETE_MEDIA_ITEM => self.delete_media_item(data, event.message_id).await,
            callbacks::EDIT_POST => self.go_to_editing_screen(data).await,
            callbacks::POST_IMMEDIATELY => self.immediate_post(data).await,
            callbacks::CHOOSE_PUBLISH_CHANNEL => {
                let mut state = self.state.lock().await;
                if let Some(editing) = state.editing.as_mut() {
                    editing.target_channel = Some(data.to_string());
                    drop(state);
                    self.send_tracked(
                        messages::PUBLISH_CHANNEL_CHOSEN,
                        Some(texts::publishing_keyboard()),
                    )
                    .await;
                }
            }
            callbacks::ADD_SUBSCRIBE_CHANNEL => self.add_subscribe_tag(data).await,
            _ => {
                tracing::debug!(chat_id = self.chat_id, action, "Ignored callback");
            }
        }
    }

    // ---- prompt answers ----

    async fn answer_prompt(self: &Arc<Self>, prompt: PendingPrompt, text: &str) {
        match prompt {
            PendingPrompt::SubscribedChannels => {
                let channels = split_lines(text);
                match self
                    .store
                    .set_subscribed_channels(self.chat_id, channels)
                    .await
                {
                    Ok(()) => {
                        self.send_tracked(
                            messages::UPDATED_SUBSCRIBED_CHANNELS,
                            Some(texts::idle_keyboard()),
                        )
                        .await;
                    }
                    Err(e) => {
                        self.send_error(messages::ERROR_UPDATE_SUBSCRIBED_CHANNELS, &e)
                            .await;
                    }
                }
            }
            PendingPrompt::AbsoluteChannels => {
                let channels = split_lines(text);
                match self
                    .store
                    .set_absolute_channels(self.chat_id, channels)
                    .await
                {
                    Ok(()) => {
                        self.send_tracked(
                            messages::UPDATED_ABSOLUTE_CHANNELS,
                            Some(texts::idle_keyboard()),
                        )
                        .await;
                    }
                    Err(e) => {
                        self.send_error(messages::ERROR_UPDATE_ABSOLUTE_CHANNELS, &e)
                            .await;
                    }
                }
            }
            PendingPrompt::MyChannels => {
                let channels = split_lines(text);
                match self.store.set_my_channels(self.chat_id, channels).await {
                    Ok(()) => {
                        self.send_tracked(
                            messages::UPDATED_MY_CHANNELS,
                            Some(texts::idle_keyboard()),
                        )
                        .await;
                    }
                    Err(e) => self.send_error(messages::ERROR_UPDATE_MY_CHANNELS, &e).await,
                }
            }
            PendingPrompt::Signature => self.update_signature(text).await,
            PendingPrompt::Delay => self.schedule_delay(text).await,
            PendingPrompt::EditText => self.edit_text(text, false).await,
            PendingPrompt::AssistantEditText => self.edit_text(text, true).await,
        }
    }

    async fn update_signature(&self, text: &str) {
        let lines = split_lines(text);
        let signature = match lines.as_slice() {
            [] => None,
            [url, label, ..] => Some(Signature {
                url: url.clone(),
                label: label.clone(),
            }),
            _ => {
                self.send_tracked(
                    &format!("{} expected URL and label lines", messages::ERROR_UPDATE_SIGNATURE),
                    Some(texts::idle_keyboard()),
                )
                .await;
                return;
            }
        };

        match self.store.set_signature(self.chat_id, signature).await {
            Ok(()) => {
                self.send_tracked(messages::UPDATED_SIGNATURE, Some(texts::idle_keyboard()))
                    .await;
            }
            Err(e) => self.send_error(messages::ERROR_UPDATE_SIGNATURE, &e).await,
        }
    }

    async fn schedule_delay(self: &Arc<Self>, text: &str) {
        let Some(seconds) = parse_delay(text) else {
            self.send_tracked(messages::INVALID_DELAY, Some(texts::publishing_keyboard()))
                .await;
            return;
        };

        let editing = { self.state.lock().await.editing.clone() };
        let Some(EditingContext {
            post_link,
            target_channel: Some(channel),
        }) = editing
        else {
            return;
        };

        let _ = self
            .publisher
            .schedule_delayed(post_link, channel, Duration::from_secs(seconds));
        self.send_tracked(messages::DELAY_SCHEDULED, Some(texts::publishing_keyboard()))
            .await;
        self.return_to_idle_later();
    }

    // ---- post & media mutation ----

    async fn edit_text(&self, text: &str, on_assistant_screen: bool) {
        let Some(link) = self.current_post_link().await else {
            return;
        };
        let keyboard = if on_assistant_screen {
            texts::assistant_keyboard()
        } else {
            texts::editing_keyboard()
        };

        let description = sanitize_description(text);
        match self
            .store
            .set_post_description(self.chat_id, &link, &description)
            .await
        {
            Ok(()) => {
                self.send_tracked(messages::EDITED_TEXT, Some(keyboard)).await;
                if !on_assistant_screen {
                    self.go_to_editing_screen(&link).await;
                }
            }
            Err(e) => {
                self.send_tracked(
                    &format!("{} {e}", messages::ERROR_EDIT_TEXT),
                    Some(keyboard),
                )
                .await;
            }
        }
    }

    async fn add_subscribe_tag(&self, channel: &str) {
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

        let tagged = format!("{}\n\n@{channel}", post.description);
        self.edit_text(&tagged, false).await;
    }

    async fn add_media(&self, attachment: &IncomingAttachment) {
        let Some(link) = self.current_post_link().await else {
            return;
        };
        let item = MediaItem::new(
            attachment.file_id.clone(),
            attachment.kind,
            attachment.size_bytes,
        );
        match self.store.push_media_item(self.chat_id, &link, item).await {
            Ok(()) => self.go_to_editing_screen(&link).await,
            Err(e) => self.report_store_error(&e).await,
        }
    }

    async fn delete_media_item(&self, uuid: &str, gallery_message_id: i64) {
        let Ok(uuid) = Uuid::parse_str(uuid) else {
            tracing::warn!(chat_id = self.chat_id, uuid, "Malformed media uuid");
            return;
        };
        let Some(link) = self.current_post_link().await else {
            return;
        };

        if let Err(e) = self.store.pull_media_item(self.chat_id, &link, uuid).await {
            self.report_store_error(&e).await;
            return;
        }

        // The gallery message is already being removed here; keep the exit
        // retraction from deleting it a second time.
        self.ui.lock().await.forget_single(gallery_message_id);
        if let Err(e) = self
            .transport
            .delete_message(self.chat_id, gallery_message_id)
            .await
        {
            tracing::warn!(chat_id = self.chat_id, "Gallery message removal failed: {e}");
        }
        self.send_tracked(messages::MEDIA_ITEM_DELETED, Some(texts::editing_keyboard()))
            .await;
    }

    async fn show_media_gallery(&self) {
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

        if post.media.is_empty() {
            self.send_tracked(messages::EMPTY_MEDIA_ITEMS, Some(texts::editing_keyboard()))
                .await;
            return;
        }

        self.send_tracked(messages::YOUR_MEDIA_ITEMS, Some(texts::editing_keyboard()))
            .await;
        for item in &post.media {
            let buttons = vec![vec![InlineButton::new(
                messages::BUTTON_DELETE,
                callbacks::encode(callbacks::DELETE_MEDIA_ITEM, &item.uuid.to_string()),
            )]];
            let sent = match item.kind {
                crate::store::MediaKind::Image => {
                    self.transport
                        .send_photo(Recipient::Chat(self.chat_id), &item.url, buttons)
                        .await
                }
                crate::store::MediaKind::Video => {
                    self.transport
                        .send_video(Recipient::Chat(self.chat_id), &item.url, buttons)
                        .await
                }
            };
            match sent {
                Ok(message) => self.ui.lock().await.push_single(message, true),
                Err(e) => tracing::warn!(chat_id = self.chat_id, "Gallery send failed: {e}"),
            }
        }
        self.send_tracked(messages::AFTER_MEDIA_ITEMS, Some(texts::editing_keyboard()))
            .await;
    }

    async fn clear_sent_posts(&self) {
        match self.store.pull_sent_posts(self.chat_id).await {
            Ok(()) => {
                self.send_tracked(messages::SENT_POSTS_CLEARED, Some(texts::idle_keyboard()))
                    .await;
            }
            Err(e) => self.report_store_error(&e).await,
        }
    }

    // ---- publishing ----

    /// Publish the current post to the selected channel, or ask for a
    /// channel first.
    pub(crate) async fn publish_now(self: &Arc<Self>) {
        let editing = { self.state.lock().await.editing.clone() };
        let Some(editing) = editing else {
            return;
        };

        let Some(channel) = editing.target_channel else {
            self.send_channel_chooser(
                messages::CHOOSE_PUBLISH_CHANNEL,
                callbacks::CHOOSE_PUBLISH_CHANNEL,
            )
            .await;
            return;
        };

        // A post with nothing to send is refused rather than published as a
        // bare signature line.
        match self.store.find_post(self.chat_id, &editing.post_link).await {
            Ok(Some(post))
                if post.media.is_empty()
                    && sanitize_description(&post.description).is_empty() =>
            {
                self.send_tracked(messages::EMPTY_POST, Some(texts::publishing_keyboard()))
                    .await;
                return;
            }
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(e) => {
                self.report_store_error(&e).await;
                return;
            }
        }

        match self.publisher.publish(&editing.post_link, &channel).await {
            Ok(()) => {
                self.send_tracked(messages::PUBLISHED, Some(texts::publishing_keyboard()))
                    .await;
                self.return_to_idle_later();
            }
            Err(e) => {
                self.send_tracked(
                    &format!("{} {e}", messages::ERROR_PUBLISH),
                    Some(texts::publishing_keyboard()),
                )
                .await;
            }
        }
    }

    /// Preview-button shortcut: with exactly one destination channel the
    /// post is published directly, otherwise the publishing screen opens
    /// with the post preselected.
    async fn immediate_post(self: &Arc<Self>, link: &str) {
        let channels = match self.store.find_connection(self.chat_id).await {
            Ok(Some(connection)) => connection.my_channels,
            Ok(None) => return,
            Err(e) => {
                self.report_store_error(&e).await;
                return;
            }
        };

        match channels.as_slice() {
            [] => {}
            [only] => {
                {
                    let mut state = self.state.lock().await;
                    state.editing = Some(EditingContext {
                        post_link: link.to_string(),
                        target_channel: Some(only.clone()),
                    });
                }
                self.publish_now().await;
            }
            _ => {
                {
                    let mut state = self.state.lock().await;
                    state.editing = Some(EditingContext::new(link));
                }
                self.go_to_publishing_screen().await;
            }
        }
    }

    async fn ask_for_delay(self: &Arc<Self>) {
        let has_channel = {
            let state = self.state.lock().await;
            state
                .editing
                .as_ref()
                .is_some_and(|editing| editing.target_channel.is_some())
        };
        if has_channel {
            self.send_prompt(messages::PROMPT_DELAY, PendingPrompt::Delay).await;
        } else {
            self.send_channel_chooser(
                messages::CHOOSE_PUBLISH_CHANNEL,
                callbacks::CHOOSE_PUBLISH_CHANNEL,
            )
            .await;
        }
    }

    // ---- screen transitions ----

    /// Return to the idle screen: retract the ephemeral UI, reset the
    /// cursor, resume delivery, render the menu.
    pub async fn go_to_start_screen(&self) {
        self.state.lock().await.enter_idle();
        self.ui
            .lock()
            .await
            .retract_all(&self.transport, self.chat_id)
            .await;
        self.send_tracked(messages::CHOOSE_ACTION, Some(texts::idle_keyboard()))
            .await;
    }

    /// Open the editing screen for a post.
    pub async fn go_to_editing_screen(&self, link: &str) {
        {
            let mut state = self.state.lock().await;
            state.enter(NavigationMode::Editing);
            state.editing = Some(EditingContext::new(link));
        }
        self.send_tracked(messages::CURRENT_EDITING_POST, None).await;
        self.render_post_screen(link, texts::editing_keyboard()).await;
    }

    async fn go_to_publishing_screen(&self) {
        let Some(link) = self.current_post_link().await else {
            return;
        };
        self.state.lock().await.enter(NavigationMode::Publishing);
        self.send_tracked(
            messages::CURRENT_PUBLISHING_POST,
            Some(texts::publishing_keyboard()),
        )
        .await;
        self.render_post_screen(&link, texts::publishing_keyboard())
            .await;
        self.send_channel_chooser(
            messages::CHOOSE_PUBLISH_CHANNEL,
            callbacks::CHOOSE_PUBLISH_CHANNEL,
        )
        .await;
    }

    async fn back_to_editing(&self) {
        let Some(link) = self.current_post_link().await else {
            return;
        };
        self.go_to_editing_screen(&link).await;
    }

    fn return_to_idle_later(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(RETURN_TO_IDLE_AFTER).await;
            engine.go_to_start_screen().await;
        });
    }

    // ---- rendering helpers ----

    /// Render a post without moderation buttons, under a screen keyboard.
    pub(crate) async fn render_post_screen(&self, link: &str, keyboard: ReplyMarkup) {
        let post = match self.store.find_post(self.chat_id, link).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                tracing::warn!(chat_id = self.chat_id, link, "Post vanished before render");
                return;
            }
            Err(e) => {
                self.report_store_error(&e).await;
                return;
            }
        };

        // Preview-only placeholder for a blank description; the publish path
        // sends no caption instead.
        let description = sanitize_description(&post.description);
        if post.media.is_empty() && description.is_empty() {
            self.send_tracked(messages::CHOOSE_ACTION, Some(keyboard)).await;
            return;
        }

        if !post.media.is_empty() {
            match self
                .transport
                .send_media_group(Recipient::Chat(self.chat_id), media_group(&post))
                .await
            {
                Ok(sent) => self.track_group(&sent).await,
                Err(e) => tracing::warn!(chat_id = self.chat_id, "Screen render failed: {e}"),
            }
            let body = if description.is_empty() {
                messages::CHOOSE_ACTION
            } else {
                description.as_str()
            };
            self.send_tracked(body, Some(keyboard)).await;
        } else {
            self.send_tracked(&description, Some(keyboard)).await;
        }
    }

    async fn show_channels(
        &self,
        header: &str,
        select: impl FnOnce(&Connection) -> Vec<String>,
    ) {
        let channels = match self.store.find_connection(self.chat_id).await {
            Ok(Some(connection)) => select(&connection),
            Ok(None) => Vec::new(),
            Err(e) => {
                self.report_store_error(&e).await;
                return;
            }
        };
        self.send_tracked(
            &format!("{header}\n{}", channels.join("\n")),
            Some(texts::idle_keyboard()),
        )
        .await;
    }

    async fn send_channel_chooser(&self, text: &str, action: &str) {
        let channels = match self.store.find_connection(self.chat_id).await {
            Ok(Some(connection)) => connection.my_channels,
            Ok(None) => Vec::new(),
            Err(e) => {
                self.report_store_error(&e).await;
                return;
            }
        };
        let row = channels
            .iter()
            .map(|channel| InlineButton::new(channel.as_str(), callbacks::encode(action, channel)))
            .collect();
        self.send_tracked(text, Some(ReplyMarkup::Inline(vec![row]))).await;
    }

    async fn send_prompt(&self, text: &str, prompt: PendingPrompt) {
        self.send_tracked(text, Some(ReplyMarkup::ForceReply)).await;
        self.state.lock().await.pending_prompt = Some(prompt);
    }

    /// Send a message to the operator chat, tracking it in the ephemeral UI
    /// history whenever the session is off the idle screen.
    pub(crate) async fn send_tracked(&self, text: &str, markup: Option<ReplyMarkup>) {
        let has_buttons = matches!(markup, Some(ReplyMarkup::Inline(_)));
        let opts = SendOptions {
            reply_markup: markup,
            disable_link_preview: false,
        };
        match self
            .transport
            .send_message(Recipient::Chat(self.chat_id), text, opts)
            .await
        {
            Ok(message) => {
                let off_idle = { self.state.lock().await.mode != NavigationMode::Idle };
                if off_idle {
                    self.ui.lock().await.push_single(message, has_buttons);
                }
            }
            Err(e) => tracing::warn!(chat_id = self.chat_id, "Send failed: {e}"),
        }
    }

    pub(crate) async fn track_group(&self, sent: &[SentMessage]) {
        let off_idle = { self.state.lock().await.mode != NavigationMode::Idle };
        if off_idle {
            self.ui.lock().await.push_group(sent);
        }
    }

    async fn send_error(&self, prefix: &str, error: &StoreError) {
        self.send_tracked(&format!("{prefix} {error}"), Some(texts::idle_keyboard()))
            .await;
    }

    pub(crate) async fn report_store_error(&self, error: &StoreError) {
        tracing::warn!(chat_id = self.chat_id, "Store error: {error}");
        self.send_tracked(&format!("{} {error}", messages::STORE_ERROR), None)
            .await;
    }

    pub(crate) async fn current_post_link(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.editing.as_ref().map(|editing| editing.post_link.clone())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a `HH:MM` delay into seconds.
fn parse_delay(text: &str) -> Option<u64> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: u64 = hours.trim().parse().ok()?;
    let minutes: u64 = minutes.trim().parse().ok()?;
    Some(hours * 3600 + minutes * 60)
}
