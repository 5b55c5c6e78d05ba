//! Error types for the wire codec.

/// Errors produced while decoding a line from the helper's output stream.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not JSON at all. The helper is allowed to print free text,
    /// which the engine forwards as a data event.
    #[error("not a JSON line: {line}")]
    NotJson { line: String },

    /// The line is JSON but not a known event.
    #[error("malformed event line {line:?}: {source}")]
    Malformed {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The raw text that failed to decode.
    pub fn line(&self) -> &str {
        match self {
            Self::NotJson { line } | Self::Malformed { line, .. } => line,
        }
    }
}
