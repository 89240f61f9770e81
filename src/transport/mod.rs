//! Messaging transport trait and transport-neutral types.
//!
//! The engine talks to the chat platform exclusively through [`Transport`].
//! Inbound traffic arrives as a stream of [`Update`]s; outbound calls carry
//! plain data types so the engine never sees platform wire formats.

mod telegram;

pub use telegram::TelegramTransport;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::TransportError;
use crate::store::MediaKind;

/// Where an outbound message goes: the operator's private chat or a
/// public channel addressed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Chat(i64),
    Channel(String),
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Chat(id) => write!(f, "{id}"),
            Recipient::Channel(name) => write!(f, "@{name}"),
        }
    }
}

/// One inline keyboard button with a callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Inline buttons under the message.
    Inline(Vec<Vec<InlineButton>>),
    /// Persistent reply keyboard with command tokens.
    Keyboard(Vec<Vec<String>>),
    /// Force the client into reply mode for the next input.
    ForceReply,
}

/// Options for a plain text send.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub reply_markup: Option<ReplyMarkup>,
    pub disable_link_preview: bool,
}

impl SendOptions {
    pub fn with_markup(markup: ReplyMarkup) -> Self {
        Self {
            reply_markup: Some(markup),
            disable_link_preview: false,
        }
    }

    pub fn no_preview(mut self) -> Self {
        self.disable_link_preview = true;
        self
    }
}

/// One item of an outbound media group.
#[derive(Debug, Clone)]
pub struct MediaGroupItem {
    pub kind: MediaKind,
    /// Platform content reference (file id or URL).
    pub file: String,
    /// Caption, honored on the first item only.
    pub caption: Option<String>,
}

/// A message the transport has accepted, referenced for later deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Media attached to an inbound message.
#[derive(Debug, Clone)]
pub struct IncomingAttachment {
    pub file_id: String,
    pub kind: MediaKind,
    pub size_bytes: u64,
}

/// An inbound chat message, already reduced to what the engine needs.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: Option<String>,
    pub attachment: Option<IncomingAttachment>,
    /// True when the user answered a force-reply prompt.
    pub is_reply: bool,
}

/// An inbound button press.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub chat_id: i64,
    /// Message the pressed button was attached to.
    pub message_id: i64,
    pub data: String,
}

/// Inbound event from the platform.
#[derive(Debug, Clone)]
pub enum Update {
    Message(IncomingMessage),
    Callback(CallbackEvent),
}

impl Update {
    /// Chat the event originated from.
    pub fn chat_id(&self) -> i64 {
        match self {
            Update::Message(m) => m.chat_id,
            Update::Callback(c) => c.chat_id,
        }
    }
}

/// Stream of inbound updates.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Update> + Send>>;

/// Messaging transport contract.
///
/// Implementations handle wire formats and reconnection internally; failures
/// surface as [`TransportError`] and are never retried by the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start receiving updates.
    async fn start(&self) -> Result<UpdateStream, TransportError>;

    /// Send a text message (HTML markup).
    async fn send_message(
        &self,
        to: Recipient,
        text: &str,
        opts: SendOptions,
    ) -> Result<SentMessage, TransportError>;

    /// Send an ordered media group. Returns one reference per item.
    async fn send_media_group(
        &self,
        to: Recipient,
        items: Vec<MediaGroupItem>,
    ) -> Result<Vec<SentMessage>, TransportError>;

    /// Send a single photo with inline buttons.
    async fn send_photo(
        &self,
        to: Recipient,
        file: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError>;

    /// Send a single video with inline buttons.
    async fn send_video(
        &self,
        to: Recipient,
        file: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError>;

    /// Delete a previously sent message from a chat.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError>;
}
