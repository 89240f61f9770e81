//! UI text: command tokens, screen messages, callback actions, keyboards.
//!
//! The dispatcher matches inbound text against the command tokens verbatim,
//! so the reply keyboards below must emit exactly these strings.

use crate::transport::ReplyMarkup;

/// Reply-keyboard command tokens, one set per screen.
pub mod commands {
    pub const START: &str = "/start";

    // Idle screen
    pub const SHOW_SUBSCRIBED_CHANNELS: &str = "Subscribed channels 📋";
    pub const UPDATE_SUBSCRIBED_CHANNELS: &str = "Update subscribed channels ✏️";
    pub const SHOW_MY_CHANNELS: &str = "My channels 📋";
    pub const UPDATE_MY_CHANNELS: &str = "Update my channels ✏️";
    pub const SHOW_ABSOLUTE_CHANNELS: &str = "Absolute channels 📋";
    pub const UPDATE_ABSOLUTE_CHANNELS: &str = "Update absolute channels ✏️";
    pub const UPDATE_SIGNATURE: &str = "Update signature 🖋";
    pub const START_DELIVERY: &str = "Start delivery ▶️";
    pub const STOP_DELIVERY: &str = "Stop delivery ⏸";
    pub const CLEAR_SENT_POSTS: &str = "Clear sent posts 🗑";

    // Editing screen
    pub const EDIT_TEXT: &str = "Edit text ✏️";
    pub const ADD_SUBSCRIBE_TAG: &str = "Add subscribe tag ➕";
    pub const EDIT_MEDIA: &str = "Edit media 🖼";
    pub const PUBLISH_POST: &str = "Publish 📤";
    pub const GO_TO_ASSISTANT: &str = "Assistant 🤖";

    // Publishing screen
    pub const PUBLISH_NOW: &str = "Publish now 📩";
    pub const DELAY_PUBLISH: &str = "Delay publish ⏰";
    pub const CHANGE_CHANNEL: &str = "Change channel 🔀";

    // Assistant screen
    pub const ASSISTANT_EDIT_TEXT: &str = "Apply as post text ✏️";
    pub const UPDATE_CONTEXT: &str = "Update context 🔄";
    pub const REPHRASE: &str = "Rephrase 💬";

    pub const BACK: &str = "Back ◀️";
}

/// Callback actions carried in inline button payloads.
///
/// A payload is `<action>::<data>`, where data is a post link, a media item
/// uuid, or a channel name.
pub mod callbacks {
    pub const SEPARATOR: &str = "::";

    pub const DELETE_POST: &str = "delete_post";
    pub const DELETE_MEDIA_ITEM: &str = "delete_media_item";
    pub const EDIT_POST: &str = "edit_post";
    pub const POST_IMMEDIATELY: &str = "post_immediately";
    pub const CHOOSE_PUBLISH_CHANNEL: &str = "choose_publish_channel";
    pub const ADD_SUBSCRIBE_CHANNEL: &str = "add_subscribe_channel";

    /// Join an action and its payload.
    pub fn encode(action: &str, data: &str) -> String {
        format!("{action}{SEPARATOR}{data}")
    }

    /// Split a payload back into action and data.
    pub fn decode(payload: &str) -> (&str, &str) {
        match payload.split_once(SEPARATOR) {
            Some((action, data)) => (action, data),
            None => (payload, ""),
        }
    }
}

/// Screen and status messages.
pub mod messages {
    pub const CHOOSE_ACTION: &str = "Choose an action:";
    pub const CURRENT_EDITING_POST: &str = "Post being edited:";
    pub const CURRENT_PUBLISHING_POST: &str = "Post being published:";
    pub const CURRENT_POST: &str = "Current post:";
    pub const EMPTY_POST: &str = "This post has no text and no media.";

    pub const PROMPT_SUBSCRIBED_CHANNELS: &str =
        "Send the new list of subscribed channels, one per line.";
    pub const PROMPT_MY_CHANNELS: &str = "Send the new list of your channels, one per line.";
    pub const PROMPT_ABSOLUTE_CHANNELS: &str =
        "Send the new list of absolute channels, one per line.";
    pub const PROMPT_SIGNATURE: &str =
        "Send the signature: first line the URL, second line the label.";
    pub const PROMPT_EDIT_TEXT: &str = "Send the new post text.";
    pub const PROMPT_DELAY: &str = "Send the delay as HH:MM.";

    pub const UPDATED_SUBSCRIBED_CHANNELS: &str = "Subscribed channels updated.";
    pub const UPDATED_ABSOLUTE_CHANNELS: &str = "Absolute channels updated.";
    pub const UPDATED_MY_CHANNELS: &str = "Your channels were updated.";
    pub const UPDATED_SIGNATURE: &str = "Signature updated.";
    pub const EDITED_TEXT: &str = "Post text updated.";

    pub const ERROR_UPDATE_SUBSCRIBED_CHANNELS: &str = "Failed to update subscribed channels:";
    pub const ERROR_UPDATE_ABSOLUTE_CHANNELS: &str = "Failed to update absolute channels:";
    pub const ERROR_UPDATE_MY_CHANNELS: &str = "Failed to update your channels:";
    pub const ERROR_UPDATE_SIGNATURE: &str = "Failed to update the signature:";
    pub const ERROR_EDIT_TEXT: &str = "Failed to update the post text:";
    pub const ERROR_PUBLISH: &str = "Failed to publish the post:";
    pub const INVALID_DELAY: &str = "Could not parse the delay, expected HH:MM.";
    pub const STORE_ERROR: &str = "Storage operation failed:";

    pub const DELIVERY_STARTED: &str = "Delivery started.";
    pub const DELIVERY_STOPPED: &str = "Delivery stopped.";
    pub const SENT_POSTS_CLEARED: &str = "Sent posts were removed from the database.";

    pub const SUBSCRIBED_CHANNELS_LIST: &str = "Subscribed channels:";
    pub const MY_CHANNELS_LIST: &str = "Your channels:";
    pub const ABSOLUTE_CHANNELS_LIST: &str = "Absolute channels:";

    pub const CHOOSE_PUBLISH_CHANNEL: &str = "Choose the channel to publish to:";
    pub const CHOOSE_SUBSCRIBE_CHANNEL: &str = "Choose the channel to add as a tag:";
    pub const PUBLISH_CHANNEL_CHOSEN: &str = "Publish channel selected.";
    pub const PUBLISHED: &str = "Post published.";
    pub const DELAY_SCHEDULED: &str = "Publication scheduled.";

    pub const YOUR_MEDIA_ITEMS: &str = "Media in this post:";
    pub const AFTER_MEDIA_ITEMS: &str = "Delete items with the buttons above.";
    pub const EMPTY_MEDIA_ITEMS: &str = "This post has no media.";
    pub const MEDIA_ITEM_DELETED: &str = "Media item deleted.";

    pub const ASSISTANT_TIP: &str =
        "Write a message to the assistant, or use the buttons below.";
    pub const ASSISTANT_WAITING: &str = "Thinking…";
    pub const ASSISTANT_ERROR: &str = "Assistant error:";
    pub const CONTEXT_UPDATED: &str = "Context cleared.";
    pub const REPHRASE_PROMPT: &str =
        "Rephrase the post text above, keeping its meaning and language.";

    pub const BUTTON_EDIT: &str = "Edit ✏️";
    pub const BUTTON_DELETE: &str = "Delete ❌";
    pub const BUTTON_PUBLISH: &str = "Post 📩";
}

/// Reply keyboard for the idle screen.
pub fn idle_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(vec![
        vec![
            commands::SHOW_SUBSCRIBED_CHANNELS.to_string(),
            commands::UPDATE_SUBSCRIBED_CHANNELS.to_string(),
        ],
        vec![
            commands::SHOW_MY_CHANNELS.to_string(),
            commands::UPDATE_MY_CHANNELS.to_string(),
        ],
        vec![
            commands::SHOW_ABSOLUTE_CHANNELS.to_string(),
            commands::UPDATE_ABSOLUTE_CHANNELS.to_string(),
        ],
        vec![
            commands::UPDATE_SIGNATURE.to_string(),
            commands::CLEAR_SENT_POSTS.to_string(),
        ],
        vec![
            commands::START_DELIVERY.to_string(),
            commands::STOP_DELIVERY.to_string(),
        ],
    ])
}

/// Reply keyboard for the editing screen.
pub fn editing_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(vec![
        vec![
            commands::EDIT_TEXT.to_string(),
            commands::EDIT_MEDIA.to_string(),
        ],
        vec![
            commands::ADD_SUBSCRIBE_TAG.to_string(),
            commands::GO_TO_ASSISTANT.to_string(),
        ],
        vec![
            commands::PUBLISH_POST.to_string(),
            commands::BACK.to_string(),
        ],
    ])
}

/// Reply keyboard for the publishing screen.
pub fn publishing_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(vec![
        vec![
            commands::PUBLISH_NOW.to_string(),
            commands::DELAY_PUBLISH.to_string(),
        ],
        vec![
            commands::CHANGE_CHANNEL.to_string(),
            commands::BACK.to_string(),
        ],
    ])
}

/// Reply keyboard for the assistant screen.
pub fn assistant_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(vec![
        vec![
            commands::ASSISTANT_EDIT_TEXT.to_string(),
            commands::REPHRASE.to_string(),
        ],
        vec![
            commands::UPDATE_CONTEXT.to_string(),
            commands::BACK.to_string(),
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_round_trip() {
        let payload = callbacks::encode(callbacks::EDIT_POST, "https://t.me/c/1/2");
        let (action, data) = callbacks::decode(&payload);
        assert_eq!(action, callbacks::EDIT_POST);
        assert_eq!(data, "https://t.me/c/1/2");
    }

    #[test]
    fn decode_without_separator() {
        let (action, data) = callbacks::decode("bare");
        assert_eq!(action, "bare");
        assert_eq!(data, "");
    }

    #[test]
    fn keyboards_emit_known_tokens() {
        for markup in [
            idle_keyboard(),
            editing_keyboard(),
            publishing_keyboard(),
            assistant_keyboard(),
        ] {
            let ReplyMarkup::Keyboard(rows) = markup else {
                panic!("screen keyboards are reply keyboards");
            };
            assert!(!rows.is_empty());
        }
    }
}
