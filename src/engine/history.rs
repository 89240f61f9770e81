//! Trackers for messages the engine has emitted to the chat.
//!
//! Two trackers exist per session: `ui` records everything sent while off
//! the idle screen so it can be bulk-retracted on return, and `delivered`
//! records moderated-path previews so that deleting one post's preview can
//! also retract its caption or media-group sibling.

use std::sync::Arc;

use crate::transport::{SentMessage, Transport};

/// One tracked emission: a single message or a media group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageEntry {
    Single { id: i64, has_buttons: bool },
    Group(Vec<i64>),
}

/// Ordered history of tracked emissions for one chat.
#[derive(Debug, Default)]
pub struct MessageHistory {
    entries: Vec<MessageEntry>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_single(&mut self, message: SentMessage, has_buttons: bool) {
        self.entries.push(MessageEntry::Single {
            id: message.message_id,
            has_buttons,
        });
    }

    pub fn push_group(&mut self, messages: &[SentMessage]) {
        self.entries
            .push(MessageEntry::Group(messages.iter().map(|m| m.message_id).collect()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop a single-message entry without retracting it (used when the
    /// message was already deleted through another path).
    pub fn forget_single(&mut self, message_id: i64) {
        self.entries
            .retain(|entry| !matches!(entry, MessageEntry::Single { id, .. } if *id == message_id));
    }

    /// Retract every tracked message in emission order, then clear.
    ///
    /// Individual deletion failures are logged and skipped; the remaining
    /// entries are still retracted.
    pub async fn retract_all(&mut self, transport: &Arc<dyn Transport>, chat_id: i64) {
        for entry in self.entries.drain(..) {
            let ids: Vec<i64> = match entry {
                MessageEntry::Single { id, .. } => vec![id],
                MessageEntry::Group(ids) => ids,
            };
            for id in ids {
                if let Err(e) = transport.delete_message(chat_id, id).await {
                    tracing::warn!(chat_id, message_id = id, "Retraction failed: {e}");
                }
            }
        }
    }

    /// Retract a moderated preview together with its sibling.
    ///
    /// The preview's buttons message is `message_id`; the entry right before
    /// it is retracted too when it is a media group or a button-less text
    /// (a caption/gallery that belongs to the preview above it).
    pub async fn retract_preview(
        &mut self,
        transport: &Arc<dyn Transport>,
        chat_id: i64,
        message_id: i64,
    ) {
        let index = self.entries.iter().position(
            |entry| matches!(entry, MessageEntry::Single { id, .. } if *id == message_id),
        );

        if let Some(index) = index {
            if let Some(prev_index) = index.checked_sub(1) {
                let retract_prev = match &self.entries[prev_index] {
                    MessageEntry::Group(_) => true,
                    MessageEntry::Single { has_buttons, .. } => !has_buttons,
                };
                if retract_prev {
                    let prev = self.entries.remove(prev_index);
                    let ids: Vec<i64> = match prev {
                        MessageEntry::Single { id, .. } => vec![id],
                        MessageEntry::Group(ids) => ids,
                    };
                    for id in ids {
                        if let Err(e) = transport.delete_message(chat_id, id).await {
                            tracing::warn!(chat_id, message_id = id, "Sibling retraction failed: {e}");
                        }
                    }
                }
            }
        }

        self.forget_single(message_id);
        if let Err(e) = transport.delete_message(chat_id, message_id).await {
            tracing::warn!(chat_id, message_id, "Preview retraction failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::TransportError;
    use crate::transport::{
        InlineButton, MediaGroupItem, Recipient, SendOptions, UpdateStream,
    };

    /// Transport stub that records deletions and can fail specific ids.
    #[derive(Default)]
    struct DeleteRecorder {
        deleted: Mutex<Vec<i64>>,
        fail_ids: Vec<i64>,
    }

    #[async_trait]
    impl Transport for DeleteRecorder {
        async fn start(&self) -> Result<UpdateStream, TransportError> {
            unimplemented!("not used in these tests")
        }

        async fn send_message(
            &self,
            _to: Recipient,
            _text: &str,
            _opts: SendOptions,
        ) -> Result<SentMessage, TransportError> {
            unimplemented!("not used in these tests")
        }

        async fn send_media_group(
            &self,
            _to: Recipient,
            _items: Vec<MediaGroupItem>,
        ) -> Result<Vec<SentMessage>, TransportError> {
            unimplemented!("not used in these tests")
        }

        async fn send_photo(
            &self,
            _to: Recipient,
            _file: &str,
            _buttons: Vec<Vec<InlineButton>>,
        ) -> Result<SentMessage, TransportError> {
            unimplemented!("not used in these tests")
        }

        async fn send_video(
            &self,
            _to: Recipient,
            _file: &str,
            _buttons: Vec<Vec<InlineButton>>,
        ) -> Result<SentMessage, TransportError> {
            unimplemented!("not used in these tests")
        }

        async fn delete_message(
            &self,
            _chat_id: i64,
            message_id: i64,
        ) -> Result<(), TransportError> {
            if self.fail_ids.contains(&message_id) {
                return Err(TransportError::DeleteFailed {
                    message_id,
                    reason: "gone".to_string(),
                });
            }
            self.deleted.lock().unwrap().push(message_id);
            Ok(())
        }
    }

    fn sent(id: i64) -> SentMessage {
        SentMessage { message_id: id }
    }

    #[tokio::test]
    async fn retract_all_records_each_exactly_once() {
        let recorder = Arc::new(DeleteRecorder::default());
        let transport: Arc<dyn Transport> = recorder.clone();
        let mut history = MessageHistory::new();
        history.push_single(sent(1), false);
        history.push_group(&[sent(2), sent(3)]);

        history.retract_all(&transport, 9).await;

        assert_eq!(*recorder.deleted.lock().unwrap(), vec![1, 2, 3]);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn retract_all_skips_failures() {
        let recorder = Arc::new(DeleteRecorder {
            deleted: Mutex::new(Vec::new()),
            fail_ids: vec![2],
        });
        let transport: Arc<dyn Transport> = recorder.clone();
        let mut history = MessageHistory::new();
        history.push_single(sent(1), false);
        history.push_single(sent(2), false);
        history.push_single(sent(3), false);

        history.retract_all(&transport, 9).await;

        assert_eq!(*recorder.deleted.lock().unwrap(), vec![1, 3]);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn preview_retraction_takes_group_sibling() {
        let recorder = Arc::new(DeleteRecorder::default());
        let transport: Arc<dyn Transport> = recorder.clone();
        let mut history = MessageHistory::new();
        history.push_group(&[sent(10), sent(11)]);
        history.push_single(sent(12), true);

        history.retract_preview(&transport, 9, 12).await;

        assert_eq!(*recorder.deleted.lock().unwrap(), vec![10, 11, 12]);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn preview_retraction_keeps_buttoned_sibling() {
        let recorder = Arc::new(DeleteRecorder::default());
        let transport: Arc<dyn Transport> = recorder.clone();
        let mut history = MessageHistory::new();
        history.push_single(sent(20), true);
        history.push_single(sent(21), true);

        history.retract_preview(&transport, 9, 21).await;

        assert_eq!(*recorder.deleted.lock().unwrap(), vec![21]);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn preview_retraction_of_untracked_message_still_deletes() {
        let recorder = Arc::new(DeleteRecorder::default());
        let transport: Arc<dyn Transport> = recorder.clone();
        let mut history = MessageHistory::new();

        history.retract_preview(&transport, 9, 99).await;

        assert_eq!(*recorder.deleted.lock().unwrap(), vec![99]);
    }
}
