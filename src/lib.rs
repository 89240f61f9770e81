//! Crosspost: a per-chat session engine for moderated, edited, and
//! scheduled repost delivery between Telegram channels.
//!
//! Posts ingested from subscribed channels queue up per connection. A
//! background loop either republishes them directly (single destination,
//! trusted source) or previews them in the operator chat for moderation.
//! The operator navigates reply-keyboard screens to edit text and media,
//! consult the assistant, and publish immediately or after a delay.

pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod sanitize;
pub mod store;
pub mod texts;
pub mod transport;
