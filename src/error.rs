//! Error types for the chat client seams.

/// Errors from the backend client, bridge, and dictation layers.
///
/// UI-level code wraps these in `anyhow` at the call site.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// HTTP transport failure reaching the backend.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned status {0}")]
    BackendStatus(reqwest::StatusCode),

    /// Dictation helper failed or produced no transcript.
    #[error("dictation error: {0}")]
    Dictation(String),
}

/// Errors crossing the host-bridge boundary.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Channel is not on the bridge allow-list.
    #[error("channel `{0}` is not allowed across the bridge")]
    ChannelNotAllowed(String),

    /// The host side of the bridge has shut down.
    #[error("host endpoint closed")]
    HostClosed,
}

pub type Result<T> = std::result::Result<T, ChatError>;
