// crates/core/src/error.rs
use thiserror::Error;

/// Errors surfaced by the remote spreadsheet collaborator.
///
/// The core never retries transport failures; callers decide whether to
/// retry, back off, or report.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("remote source unreachable: {message}")]
    Transport { message: String },

    #[error("remote tab not found: {tab}")]
    TabNotFound { tab: String },

    #[error("remote source returned a malformed value range for tab {tab}: {message}")]
    MalformedRange { tab: String, message: String },
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn tab_not_found(tab: impl Into<String>) -> Self {
        Self::TabNotFound { tab: tab.into() }
    }
}
