//! Per-chat session state.
//!
//! Field ownership: `mode`, `editing`, and `pending_prompt` are written only
//! by the command-handling path; `delivery_active` only by the operator
//! start/stop commands; `delivery_suspended` only by mode transitions;
//! `turn_history` only by the assistant screen. The delivery loop reads the
//! gate flags and never writes session state.

use chrono::{DateTime, Utc};

use crate::llm::ChatTurn;

/// Which screen the chat is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Idle,
    Editing,
    Publishing,
    Assistant,
}

/// The force-reply prompt the session is waiting on, if any.
///
/// Set when a prompt is sent, consumed when the reply arrives. This replaces
/// matching on the replied-to message's rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPrompt {
    SubscribedChannels,
    MyChannels,
    AbsoluteChannels,
    Signature,
    Delay,
    EditText,
    AssistantEditText,
}

/// The post cursor threaded through editing, publishing, and assistant
/// screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingContext {
    pub post_link: String,
    pub target_channel: Option<String>,
}

impl EditingContext {
    pub fn new(post_link: impl Into<String>) -> Self {
        Self {
            post_link: post_link.into(),
            target_channel: None,
        }
    }
}

/// Mutable per-session state, exclusively owned by one chat.
#[derive(Debug)]
pub struct SessionState {
    pub mode: NavigationMode,
    /// Operator on/off switch for the delivery loop.
    pub delivery_active: bool,
    /// True while the chat is on any non-idle screen.
    pub delivery_suspended: bool,
    pub editing: Option<EditingContext>,
    pub pending_prompt: Option<PendingPrompt>,
    pub turn_history: Vec<ChatTurn>,
    /// When the session booted, surfaced in the startup log line.
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            mode: NavigationMode::Idle,
            delivery_active: true,
            delivery_suspended: false,
            editing: None,
            pending_prompt: None,
            turn_history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether the delivery loop may scan the queue right now.
    pub fn delivery_open(&self) -> bool {
        self.delivery_active && !self.delivery_suspended
    }

    /// Enter a non-idle screen, suspending delivery.
    pub fn enter(&mut self, mode: NavigationMode) {
        debug_assert_ne!(mode, NavigationMode::Idle);
        self.mode = mode;
        self.delivery_suspended = true;
    }

    /// Return to the idle screen: delivery resumes, the cursor and any
    /// pending prompt are dropped.
    pub fn enter_idle(&mut self) {
        self.mode = NavigationMode::Idle;
        self.delivery_suspended = false;
        self.editing = None;
        self.pending_prompt = None;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
