//! Error types shared across the engine.

/// Errors from the connection store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No connection record exists for the chat.
    #[error("Connection not found for chat {chat_id}")]
    ConnectionNotFound { chat_id: i64 },

    /// No post with the given link in the connection.
    #[error("Post not found: {link}")]
    PostNotFound { link: String },

    /// The underlying store rejected the operation.
    #[error("Store operation failed: {reason}")]
    OperationFailed { reason: String },
}

/// Errors from the messaging transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An outbound send was rejected by the platform.
    #[error("Send failed: {reason}")]
    SendFailed { reason: String },

    /// A message could not be deleted from the chat.
    #[error("Delete failed for message {message_id}: {reason}")]
    DeleteFailed { message_id: i64, reason: String },

    /// The update pump could not be started.
    #[error("Transport startup failed: {reason}")]
    StartupFailed { reason: String },

    /// The platform returned a payload we could not parse.
    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// HTTP-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors from the conversational completion service.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Missing or rejected credentials.
    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    /// The request could not be completed.
    #[error("Completion request failed: {reason}")]
    RequestFailed { reason: String },

    /// The provider answered with something unusable.
    #[error("Invalid completion response: {reason}")]
    InvalidResponse { reason: String },

    /// The provider asked us to slow down.
    #[error("Rate limited by provider {provider}")]
    RateLimited { provider: String },
}
