//! Per-chat session engine: navigation state, command dispatch, background
//! delivery, publishing, and the assistant conversation.

mod assistant;
mod delivery;
#[allow(clippy::module_inception)]
mod engine;
mod history;
mod publish;
mod registry;
mod session;

pub use delivery::{spawn_delivery_loop, DeliveryConfig};
pub use engine::SessionEngine;
pub use history::{MessageEntry, MessageHistory};
pub use publish::{
    caption_fits, media_group, signed_text, PublishEngine, PublishError, CAPTION_LIMIT,
};
pub use registry::SessionRegistry;
pub use session::{EditingContext, NavigationMode, PendingPrompt, SessionState};
