//! End-to-end scenarios driven through the public engine surface with a
//! recording transport and a scripted completion service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use crosspost::engine::{spawn_delivery_loop, DeliveryConfig, PublishEngine, SessionEngine, SessionRegistry};
use crosspost::error::{LlmError, TransportError};
use crosspost::llm::{ChatTurn, CompletionService};
use crosspost::store::{Connection, ConnectionStore, MediaItem, MediaKind, MemoryStore, Post};
use crosspost::texts::{self, callbacks, commands, messages};
use crosspost::transport::{
    CallbackEvent, IncomingMessage, InlineButton, MediaGroupItem, Recipient, ReplyMarkup,
    SendOptions, SentMessage, Transport, Update, UpdateStream,
};

#[derive(Debug, Clone)]
struct SentRecord {
    to: Recipient,
    text: String,
    has_inline_buttons: bool,
    preview_disabled: bool,
}

/// Transport double: hands out increasing message ids and records traffic.
#[derive(Default)]
struct RecordingTransport {
    next_id: Mutex<i64>,
    sent: Mutex<Vec<SentRecord>>,
    media_groups: Mutex<Vec<(Recipient, Vec<Option<String>>)>>,
    deleted: Mutex<Vec<i64>>,
}

impl RecordingTransport {
    fn next(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    fn texts_to(&self, to: &Recipient) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|record| &record.to == to)
            .map(|record| record.text.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn start(&self) -> Result<UpdateStream, TransportError> {
        Ok(Box::pin(futures::stream::empty()))
    }

    async fn send_message(
        &self,
        to: Recipient,
        text: &str,
        opts: SendOptions,
    ) -> Result<SentMessage, TransportError> {
        let id = self.next();
        self.sent.lock().unwrap().push(SentRecord {
            to,
            text: text.to_string(),
            has_inline_buttons: matches!(opts.reply_markup, Some(ReplyMarkup::Inline(_))),
            preview_disabled: opts.disable_link_preview,
        });
        Ok(SentMessage { message_id: id })
    }

    async fn send_media_group(
        &self,
        to: Recipient,
        items: Vec<MediaGroupItem>,
    ) -> Result<Vec<SentMessage>, TransportError> {
        let captions = items.iter().map(|item| item.caption.clone()).collect();
        self.media_groups.lock().unwrap().push((to, captions));
        Ok(items
            .iter()
            .map(|_| SentMessage {
                message_id: self.next(),
            })
            .collect())
    }

    async fn send_photo(
        &self,
        to: Recipient,
        file: &str,
        _buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError> {
        let id = self.next();
        self.sent.lock().unwrap().push(SentRecord {
            to,
            text: format!("photo:{file}"),
            has_inline_buttons: true,
            preview_disabled: false,
        });
        Ok(SentMessage { message_id: id })
    }

    async fn send_video(
        &self,
        to: Recipient,
        file: &str,
        _buttons: Vec<Vec<InlineButton>>,
    ) -> Result<SentMessage, TransportError> {
        let id = self.next();
        self.sent.lock().unwrap().push(SentRecord {
            to,
            text: format!("video:{file}"),
            has_inline_buttons: true,
            preview_disabled: false,
        });
        Ok(SentMessage { message_id: id })
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }
}

/// Completion double with a fixed answer, or a scripted failure.
struct ScriptedLlm {
    answer: Result<String, ()>,
}

impl ScriptedLlm {
    fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
        }
    }

    fn failing() -> Self {
        Self { answer: Err(()) }
    }
}

#[async_trait]
impl CompletionService for ScriptedLlm {
    async fn complete(&self, _history: &[ChatTurn]) -> Result<String, LlmError> {
        self.answer.clone().map_err(|_| LlmError::RequestFailed {
            reason: "scripted failure".to_string(),
        })
    }
}

/// Completion double that records how many turns each call carried.
#[derive(Default)]
struct CountingLlm {
    history_lens: Mutex<Vec<usize>>,
}

#[async_trait]
impl CompletionService for CountingLlm {
    async fn complete(&self, history: &[ChatTurn]) -> Result<String, LlmError> {
        self.history_lens.lock().unwrap().push(history.len());
        Ok("ok".to_string())
    }
}

const CHAT: i64 = 42;

fn post(link: &str, channel: &str, description: &str) -> Post {
    Post {
        link: link.to_string(),
        channel: channel.to_string(),
        description: description.to_string(),
        media: Vec::new(),
        sended: false,
        deleted: false,
    }
}

fn text_update(text: &str) -> Update {
    Update::Message(IncomingMessage {
        chat_id: CHAT,
        message_id: 1_000,
        text: Some(text.to_string()),
        attachment: None,
        is_reply: false,
    })
}

fn reply_update(text: &str) -> Update {
    Update::Message(IncomingMessage {
        chat_id: CHAT,
        message_id: 1_001,
        text: Some(text.to_string()),
        attachment: None,
        is_reply: true,
    })
}

struct Harness {
    store: Arc<MemoryStore>,
    transport: Arc<RecordingTransport>,
    engine: Arc<SessionEngine>,
}

fn harness_with_llm(llm: Arc<dyn CompletionService>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let delivery = DeliveryConfig {
        scan_interval: Duration::from_secs(10),
        pace_interval: Duration::from_secs(5),
    };
    let engine = SessionEngine::new(
        CHAT,
        store.clone(),
        transport.clone(),
        llm,
        delivery,
    );
    Harness {
        store,
        transport,
        engine,
    }
}

fn harness() -> Harness {
    harness_with_llm(Arc::new(ScriptedLlm::answering("ok")))
}

async fn seed_connection(
    store: &MemoryStore,
    my_channels: &[&str],
    absolute_channels: &[&str],
) {
    store.insert_connection(Connection::new(CHAT)).await.unwrap();
    store
        .set_my_channels(CHAT, my_channels.iter().map(|s| s.to_string()).collect())
        .await
        .unwrap();
    store
        .set_absolute_channels(CHAT, absolute_channels.iter().map(|s| s.to_string()).collect())
        .await
        .unwrap();
}

#[tokio::test]
async fn start_boots_a_single_session_with_the_idle_menu() {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let llm: Arc<dyn CompletionService> = Arc::new(ScriptedLlm::answering("ok"));
    let registry = SessionRegistry::new(
        store.clone(),
        transport.clone(),
        llm,
        DeliveryConfig::default(),
    );

    registry.dispatch(text_update(commands::START)).await;
    registry.dispatch(text_update(commands::START)).await;

    assert_eq!(registry.session_count().await, 1);
    assert!(store.find_connection(CHAT).await.unwrap().is_some());

    let menus: Vec<String> = transport
        .texts_to(&Recipient::Chat(CHAT))
        .into_iter()
        .filter(|text| text == messages::CHOOSE_ACTION)
        .collect();
    // Bootstrap renders the menu once, the repeated /start renders it again.
    assert_eq!(menus.len(), 2);
}

#[tokio::test]
async fn non_start_updates_for_unknown_chats_are_dropped() {
    let transport = Arc::new(RecordingTransport::default());
    let registry = SessionRegistry::new(
        Arc::new(MemoryStore::new()),
        transport.clone(),
        Arc::new(ScriptedLlm::answering("ok")),
        DeliveryConfig::default(),
    );

    registry.dispatch(text_update(commands::START_DELIVERY)).await;

    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fast_path_publishes_directly_and_marks_sent() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &["trusted"]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "trusted", "hello"))
        .await
        .unwrap();

    let loop_handle = spawn_delivery_loop(h.engine.clone());
    tokio::time::sleep(Duration::from_secs(11)).await;
    loop_handle.abort();

    let to_channel = h.transport.texts_to(&Recipient::Channel("dest".to_string()));
    assert_eq!(to_channel.len(), 1);
    assert_eq!(to_channel[0], "hello\n\n@dest");
    assert!(h.store.find_post(CHAT, "link-1").await.unwrap().unwrap().sended);

    // Nothing was previewed in the operator chat.
    assert!(h.transport.texts_to(&Recipient::Chat(CHAT)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn untrusted_source_gets_a_moderated_preview() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "somewhere", "body"))
        .await
        .unwrap();

    let loop_handle = spawn_delivery_loop(h.engine.clone());
    tokio::time::sleep(Duration::from_secs(11)).await;
    loop_handle.abort();

    assert!(h.transport.texts_to(&Recipient::Channel("dest".to_string())).is_empty());
    let sent = h.transport.sent.lock().unwrap();
    let preview = sent
        .iter()
        .find(|record| record.to == Recipient::Chat(CHAT))
        .unwrap();
    assert_eq!(preview.text, "body");
    assert!(preview.has_inline_buttons);
    assert!(preview.preview_disabled);
    drop(sent);
    assert!(h.store.find_post(CHAT, "link-1").await.unwrap().unwrap().sended);
}

#[tokio::test(start_paused = true)]
async fn empty_description_preview_shows_a_placeholder() {
    let h = harness();
    seed_connection(&h.store, &["a", "b"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "<img src=\"x\">"))
        .await
        .unwrap();

    let loop_handle = spawn_delivery_loop(h.engine.clone());
    tokio::time::sleep(Duration::from_secs(11)).await;
    loop_handle.abort();

    let texts = h.transport.texts_to(&Recipient::Chat(CHAT));
    assert_eq!(texts, vec![messages::CHOOSE_ACTION.to_string()]);
}

#[tokio::test]
async fn media_post_with_blank_text_publishes_without_caption() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    let mut queued = post("link-1", "src", "");
    queued.media.push(MediaItem::new("file-1", MediaKind::Image, 10));
    h.store.ingest_post(CHAT, queued).await.unwrap();

    let publisher = Arc::new(PublishEngine::new(
        CHAT,
        h.store.clone(),
        h.transport.clone(),
    ));
    publisher.publish("link-1", "dest").await.unwrap();

    // Only the bare media group went out, no caption or follow-up text.
    assert_eq!(
        *h.transport.media_groups.lock().unwrap(),
        vec![(Recipient::Channel("dest".to_string()), vec![None])]
    );
    assert!(h.transport.texts_to(&Recipient::Channel("dest".to_string())).is_empty());
}

#[tokio::test]
async fn oversized_text_is_sent_after_an_uncaptioned_group() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    let long = "x".repeat(1024);
    let mut queued = post("link-1", "src", &long);
    queued.media.push(MediaItem::new("file-1", MediaKind::Image, 10));
    h.store.ingest_post(CHAT, queued).await.unwrap();

    let publisher = Arc::new(PublishEngine::new(
        CHAT,
        h.store.clone(),
        h.transport.clone(),
    ));
    publisher.publish("link-1", "dest").await.unwrap();

    // The text overflows a caption, so the group goes out bare and the
    // signed text follows as its own message.
    assert_eq!(
        *h.transport.media_groups.lock().unwrap(),
        vec![(Recipient::Channel("dest".to_string()), vec![None])]
    );
    let sent = h.transport.sent.lock().unwrap();
    let follow_up = sent
        .iter()
        .find(|record| record.to == Recipient::Channel("dest".to_string()))
        .unwrap();
    assert_eq!(follow_up.text, format!("{long}\n\n@dest"));
    assert!(follow_up.preview_disabled);
}

#[tokio::test]
async fn caption_at_the_boundary_rides_the_media_group() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    let fits = "x".repeat(1023);
    let mut queued = post("link-1", "src", &fits);
    queued.media.push(MediaItem::new("file-1", MediaKind::Image, 10));
    h.store.ingest_post(CHAT, queued).await.unwrap();

    let publisher = Arc::new(PublishEngine::new(
        CHAT,
        h.store.clone(),
        h.transport.clone(),
    ));
    publisher.publish("link-1", "dest").await.unwrap();

    assert_eq!(
        *h.transport.media_groups.lock().unwrap(),
        vec![(
            Recipient::Channel("dest".to_string()),
            vec![Some(format!("{fits}\n\n@dest"))]
        )]
    );
    assert!(h.transport.texts_to(&Recipient::Channel("dest".to_string())).is_empty());
}

#[tokio::test]
async fn publishing_a_fully_empty_post_is_refused() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "  "))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::PUBLISH_POST)).await;
    h.engine
        .handle_update(Update::Callback(CallbackEvent {
            chat_id: CHAT,
            message_id: 5,
            data: callbacks::encode(callbacks::CHOOSE_PUBLISH_CHANNEL, "dest"),
        }))
        .await;
    h.engine.handle_update(text_update(commands::PUBLISH_NOW)).await;

    assert!(h.transport.texts_to(&Recipient::Channel("dest".to_string())).is_empty());
    let texts = h.transport.texts_to(&Recipient::Chat(CHAT));
    assert!(texts.iter().any(|text| text == messages::EMPTY_POST));
}

#[tokio::test(start_paused = true)]
async fn delivery_respects_the_operator_switch() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &["trusted"]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "trusted", "hello"))
        .await
        .unwrap();

    h.engine.handle_update(text_update(commands::STOP_DELIVERY)).await;

    let loop_handle = spawn_delivery_loop(h.engine.clone());
    tokio::time::sleep(Duration::from_secs(30)).await;
    loop_handle.abort();

    assert!(h.transport.texts_to(&Recipient::Channel("dest".to_string())).is_empty());
    assert!(!h.store.find_post(CHAT, "link-1").await.unwrap().unwrap().sended);
}

#[tokio::test(start_paused = true)]
async fn deleted_posts_are_never_delivered() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &["trusted"]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "trusted", "hello"))
        .await
        .unwrap();
    h.store.mark_post_deleted(CHAT, "link-1").await.unwrap();

    let loop_handle = spawn_delivery_loop(h.engine.clone());
    tokio::time::sleep(Duration::from_secs(30)).await;
    loop_handle.abort();

    assert!(h.transport.texts_to(&Recipient::Channel("dest".to_string())).is_empty());
}

#[tokio::test]
async fn out_of_mode_commands_are_silently_ignored() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;

    // Editing-screen command while idle.
    h.engine.handle_update(text_update(commands::EDIT_TEXT)).await;
    // Publishing-screen command while idle.
    h.engine.handle_update(text_update(commands::PUBLISH_NOW)).await;

    assert!(h.transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn editing_screen_publish_flow_reaches_the_channel() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::PUBLISH_POST)).await;
    h.engine
        .handle_update(Update::Callback(CallbackEvent {
            chat_id: CHAT,
            message_id: 5,
            data: callbacks::encode(callbacks::CHOOSE_PUBLISH_CHANNEL, "dest"),
        }))
        .await;
    h.engine.handle_update(text_update(commands::PUBLISH_NOW)).await;

    let to_channel = h.transport.texts_to(&Recipient::Channel("dest".to_string()));
    assert_eq!(to_channel, vec!["body\n\n@dest".to_string()]);
}

#[tokio::test]
async fn signature_replaces_the_self_tag_on_publish() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.engine.handle_update(text_update(commands::UPDATE_SIGNATURE)).await;
    h.engine
        .handle_update(reply_update("https://example.com\nsource"))
        .await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::PUBLISH_POST)).await;
    h.engine
        .handle_update(Update::Callback(CallbackEvent {
            chat_id: CHAT,
            message_id: 5,
            data: callbacks::encode(callbacks::CHOOSE_PUBLISH_CHANNEL, "dest"),
        }))
        .await;
    h.engine.handle_update(text_update(commands::PUBLISH_NOW)).await;

    let to_channel = h.transport.texts_to(&Recipient::Channel("dest".to_string()));
    assert_eq!(to_channel.len(), 1);
    assert!(to_channel[0].contains("<a href=\"https://example.com\">source</a>"));
    assert!(!to_channel[0].contains("@dest"));
}

#[tokio::test]
async fn edit_text_reply_sanitizes_and_stores() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "old"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::EDIT_TEXT)).await;
    h.engine
        .handle_update(reply_update("new text<br/> <img src=\"x\">"))
        .await;

    let stored = h.store.find_post(CHAT, "link-1").await.unwrap().unwrap();
    assert_eq!(stored.description, "new text");
}

#[tokio::test]
async fn returning_to_idle_retracts_the_screen_ui() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    let emitted_while_editing = h.transport.sent.lock().unwrap().len();
    assert!(emitted_while_editing > 0);

    h.engine.handle_update(text_update(commands::START)).await;

    let deleted = h.transport.deleted.lock().unwrap().len();
    assert_eq!(deleted, emitted_while_editing + 1);
}

#[tokio::test(start_paused = true)]
async fn deleting_a_preview_retracts_its_media_sibling() {
    let h = harness();
    seed_connection(&h.store, &["a", "b"], &[]).await;
    let mut queued = post("link-1", "src", "body");
    queued.media.push(MediaItem::new("file-1", MediaKind::Image, 10));
    queued.media.push(MediaItem::new("file-2", MediaKind::Image, 10));
    h.store.ingest_post(CHAT, queued).await.unwrap();

    let loop_handle = spawn_delivery_loop(h.engine.clone());
    tokio::time::sleep(Duration::from_secs(11)).await;
    loop_handle.abort();

    // ids 1..=2 are the media group, 3 is the buttons message.
    h.engine
        .handle_update(Update::Callback(CallbackEvent {
            chat_id: CHAT,
            message_id: 3,
            data: callbacks::encode(callbacks::DELETE_POST, "link-1"),
        }))
        .await;

    assert!(h.store.find_post(CHAT, "link-1").await.unwrap().unwrap().deleted);
    assert_eq!(*h.transport.deleted.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn delayed_publish_fires_even_after_deletion() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    let publisher = Arc::new(PublishEngine::new(
        CHAT,
        h.store.clone(),
        h.transport.clone(),
    ));
    publisher.schedule_delayed(
        "link-1".to_string(),
        "dest".to_string(),
        Duration::from_secs(3600),
    );

    h.store.mark_post_deleted(CHAT, "link-1").await.unwrap();

    tokio::time::sleep(Duration::from_secs(3601)).await;

    let to_channel = h.transport.texts_to(&Recipient::Channel("dest".to_string()));
    assert_eq!(to_channel, vec!["body\n\n@dest".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn delayed_publish_uses_the_post_as_edited() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "before"))
        .await
        .unwrap();

    let publisher = Arc::new(PublishEngine::new(
        CHAT,
        h.store.clone(),
        h.transport.clone(),
    ));
    publisher.schedule_delayed(
        "link-1".to_string(),
        "dest".to_string(),
        Duration::from_secs(60),
    );

    h.store.set_post_description(CHAT, "link-1", "after").await.unwrap();
    tokio::time::sleep(Duration::from_secs(61)).await;

    let to_channel = h.transport.texts_to(&Recipient::Channel("dest".to_string()));
    assert_eq!(to_channel, vec!["after\n\n@dest".to_string()]);
}

#[tokio::test]
async fn entering_the_assistant_screen_starts_a_fresh_conversation() {
    let llm = Arc::new(CountingLlm::default());
    let h = harness_with_llm(llm.clone());
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::GO_TO_ASSISTANT)).await;
    h.engine.handle_update(text_update("first question")).await;

    // Leave and come back; the earlier exchange must not carry over.
    h.engine.handle_update(text_update(commands::BACK)).await;
    h.engine.handle_update(text_update(commands::GO_TO_ASSISTANT)).await;
    h.engine.handle_update(text_update("second question")).await;

    assert_eq!(*llm.history_lens.lock().unwrap(), vec![1, 1]);
}

#[tokio::test]
async fn assistant_failure_resets_the_conversation() {
    let h = harness_with_llm(Arc::new(ScriptedLlm::failing()));
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::GO_TO_ASSISTANT)).await;
    h.engine.handle_update(text_update("make it shorter")).await;

    let texts = h.transport.texts_to(&Recipient::Chat(CHAT));
    assert!(texts
        .iter()
        .any(|text| text.starts_with(messages::ASSISTANT_ERROR)));
}

#[tokio::test]
async fn assistant_answer_is_delivered_to_the_chat() {
    let h = harness_with_llm(Arc::new(ScriptedLlm::answering("shorter body")));
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::GO_TO_ASSISTANT)).await;
    h.engine.handle_update(text_update("make it shorter")).await;

    let texts = h.transport.texts_to(&Recipient::Chat(CHAT));
    assert!(texts.iter().any(|text| text == "shorter body"));
}

#[tokio::test]
async fn assistant_text_can_become_the_post_text() {
    let h = harness();
    seed_connection(&h.store, &["dest"], &[]).await;
    h.store
        .ingest_post(CHAT, post("link-1", "src", "body"))
        .await
        .unwrap();

    h.engine.go_to_editing_screen("link-1").await;
    h.engine.handle_update(text_update(commands::GO_TO_ASSISTANT)).await;
    h.engine
        .handle_update(text_update(commands::ASSISTANT_EDIT_TEXT))
        .await;
    h.engine.handle_update(reply_update("polished text")).await;

    let stored = h.store.find_post(CHAT, "link-1").await.unwrap().unwrap();
    assert_eq!(stored.description, "polished text");
}

#[tokio::test]
async fn keyboards_and_commands_agree() {
    // The dispatcher matches verbatim tokens; a drifted keyboard label would
    // turn its button into a dead key.
    let ReplyMarkup::Keyboard(rows) = texts::idle_keyboard() else {
        panic!("idle keyboard must be a reply keyboard");
    };
    let labels: Vec<String> = rows.into_iter().flatten().collect();
    assert!(labels.contains(&commands::START_DELIVERY.to_string()));
    assert!(labels.contains(&commands::CLEAR_SENT_POSTS.to_string()));
}
