use thiserror::Error;

/// Errors produced by the extractor and its registry.
///
/// Malformed model text is never an error: it degrades to an all-prose
/// [`ExtractionResult`](crate::types::ExtractionResult). These variants only
/// cover caller contract violations.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// `current_text` does not extend `previous_text`.
    #[error("streaming text is not monotonic: current text ({current_len} bytes) does not extend previous text ({previous_len} bytes)")]
    NonMonotonicText {
        previous_len: usize,
        current_len: usize,
    },

    /// `previous_text + delta_text` does not reproduce `current_text`.
    #[error("delta text does not reconcile: previous ({previous_len}) + delta ({delta_len}) != current ({current_len}) bytes")]
    DeltaMismatch {
        previous_len: usize,
        delta_len: usize,
        current_len: usize,
    },

    /// Token-id sequences disagree in length.
    #[error("token ids do not reconcile: previous ({previous}) + delta ({delta}) != current ({current})")]
    TokenMismatch {
        previous: usize,
        delta: usize,
        current: usize,
    },

    /// No parser is registered under the requested name.
    #[error("no tool parser registered under '{0}'")]
    UnknownParser(String),

    /// A parser is already registered under this name.
    #[error("tool parser '{0}' is already registered")]
    DuplicateParser(String),

    /// A configuration document did not deserialize.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
