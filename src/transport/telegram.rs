//! Telegram Bot API transport.
//!
//! Inbound updates are fetched with long-polling `getUpdates` on a background
//! task and pumped into an mpsc channel; the engine consumes them as an
//! [`UpdateStream`]. Outbound calls go straight to the Bot API with
//! `parse_mode: HTML`.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::TransportError;
use crate::store::MediaKind;
use crate::transport::{
    CallbackEvent, IncomingAttachment, IncomingMessage, InlineButton, MediaGroupItem, Recipient,
    ReplyMarkup, SendOptions, SentMessage, Transport, Update, UpdateStream,
};

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Buffered inbound updates before the pump applies backpressure.
const UPDATE_BUFFER: usize = 100;

/// Telegram Bot API client.
pub struct TelegramTransport {
    client: Client,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    chat: TgChat,
    text: Option<String>,
    photo: Option<Vec<TgPhotoSize>>,
    video: Option<TgVideo>,
    reply_to_message: Option<Box<TgMessage>>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgPhotoSize {
    file_id: String,
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TgVideo {
    file_id: String,
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TgCallbackQuery {
    message: Option<TgMessage>,
    data: Option<String>,
}

impl TelegramTransport {
    pub fn new(token: SecretString) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS + 30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, token }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.token.expose_secret(),
            method
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
    ) -> Result<T, TransportError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let parsed: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| TransportError::InvalidResponse {
                reason: format!("{method}: JSON parse error: {e} (HTTP {status})"),
            })?;

        if !parsed.ok {
            return Err(TransportError::SendFailed {
                reason: format!(
                    "{method}: {}",
                    parsed.description.unwrap_or_else(|| format!("HTTP {status}"))
                ),
            });
        }

        parsed.result.ok_or_else(|| TransportError::InvalidResponse {
            reason: format!("{method}: ok response without result"),
        })
    }

    async fn send_single_media(
        &self,
        method: &str,
        field: &str,
        to: Recipient,
        file: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError> {
        let mut body = json!({
            "chat_id": recipient_value(&to),
            field: file,
        });
        if !buttons.is_empty() {
            body["reply_markup"] = markup_value(&ReplyMarkup::Inline(buttons));
        }
        let message: TgMessage = self.call(method, body).await?;
        Ok(SentMessage {
            message_id: message.message_id,
        })
    }
}

fn recipient_value(to: &Recipient) -> Value {
    match to {
        Recipient::Chat(id) => json!(id),
        Recipient::Channel(name) => json!(format!("@{name}")),
    }
}

fn markup_value(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Inline(rows) => json!({
            "inline_keyboard": rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| json!({ "text": b.label, "callback_data": b.callback_data }))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>(),
        }),
        ReplyMarkup::Keyboard(rows) => json!({
            "keyboard": rows
                .iter()
                .map(|row| row.iter().map(|t| json!({ "text": t })).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
        }),
        ReplyMarkup::ForceReply => json!({ "force_reply": true }),
    }
}

fn media_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "photo",
        MediaKind::Video => "video",
    }
}

fn convert_message(message: TgMessage) -> IncomingMessage {
    // Telegram lists photo renditions smallest first; keep the largest.
    let attachment = if let Some(sizes) = message.photo {
        sizes.into_iter().next_back().map(|photo| IncomingAttachment {
            file_id: photo.file_id,
            kind: MediaKind::Image,
            size_bytes: photo.file_size.unwrap_or(0),
        })
    } else {
        message.video.map(|video| IncomingAttachment {
            file_id: video.file_id,
            kind: MediaKind::Video,
            size_bytes: video.file_size.unwrap_or(0),
        })
    };

    IncomingMessage {
        chat_id: message.chat.id,
        message_id: message.message_id,
        text: message.text,
        attachment,
        is_reply: message.reply_to_message.is_some(),
    }
}

fn convert_update(update: TgUpdate) -> Option<Update> {
    if let Some(message) = update.message {
        return Some(Update::Message(convert_message(message)));
    }
    if let Some(callback) = update.callback_query {
        let message = callback.message?;
        let data = callback.data?;
        return Some(Update::Callback(CallbackEvent {
            chat_id: message.chat.id,
            message_id: message.message_id,
            data,
        }));
    }
    None
}

#[async_trait::async_trait]
impl Transport for TelegramTransport {
    async fn start(&self) -> Result<UpdateStream, TransportError> {
        let (tx, rx) = mpsc::channel::<Update>(UPDATE_BUFFER);
        let client = self.client.clone();
        let url = self.method_url("getUpdates");

        tokio::spawn(async move {
            let mut offset: i64 = 0;
            loop {
                let body = json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "callback_query"],
                });

                let response = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("getUpdates request failed: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let text = response.text().await.unwrap_or_default();
                let parsed: ApiResponse<Vec<TgUpdate>> = match serde_json::from_str(&text) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!("getUpdates parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                for update in parsed.result.unwrap_or_default() {
                    offset = offset.max(update.update_id + 1);
                    if let Some(converted) = convert_update(update) {
                        if tx.send(converted).await.is_err() {
                            tracing::info!("Update consumer dropped, stopping poll loop");
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn send_message(
        &self,
        to: Recipient,
        text: &str,
        opts: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        let mut body = json!({
            "chat_id": recipient_value(&to),
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = &opts.reply_markup {
            body["reply_markup"] = markup_value(markup);
        }
        if opts.disable_link_preview {
            body["link_preview_options"] = json!({ "is_disabled": true });
        }

        let message: TgMessage = self.call("sendMessage", body).await?;
        Ok(SentMessage {
            message_id: message.message_id,
        })
    }

    async fn send_media_group(
        &self,
        to: Recipient,
        items: Vec<MediaGroupItem>,
    ) -> Result<Vec<SentMessage>, TransportError> {
        let media: Vec<Value> = items
            .iter()
            .map(|item| {
                let mut entry = json!({
                    "type": media_type(item.kind),
                    "media": item.file,
                });
                if let Some(caption) = &item.caption {
                    entry["caption"] = json!(caption);
                    entry["parse_mode"] = json!("HTML");
                }
                entry
            })
            .collect();

        let body = json!({
            "chat_id": recipient_value(&to),
            "media": media,
        });

        let messages: Vec<TgMessage> = self.call("sendMediaGroup", body).await?;
        Ok(messages
            .into_iter()
            .map(|m| SentMessage {
                message_id: m.message_id,
            })
            .collect())
    }

    async fn send_photo(
        &self,
        to: Recipient,
        file: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError> {
        self.send_single_media("sendPhoto", "photo", to, file, buttons)
            .await
    }

    async fn send_video(
        &self,
        to: Recipient,
        file: &str,
        buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError> {
        self.send_single_media("sendVideo", "video", to, file, buttons)
            .await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        let body = json!({ "chat_id": chat_id, "message_id": message_id });
        let _deleted: bool =
            self.call("deleteMessage", body)
                .await
                .map_err(|e| TransportError::DeleteFailed {
                    message_id,
                    reason: e.to_string(),
                })?;
        Ok(())
    }
}
