use parley_schema::{DecodeError, EngineError};

/// Failures of the byte channel beneath the client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {size} bytes exceeds the {limit}-byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("channel closed")]
    Closed,
}

impl TransportError {
    /// Returns `true` when only the current frame was rejected and the
    /// channel can carry on with the next one.
    pub fn is_frame_error(&self) -> bool {
        matches!(self, Self::FrameTooLarge { .. } | Self::InvalidUtf8)
    }
}

/// Outcome of a failed `call`.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("engine error {code}: {message}")]
    Engine { code: i32, message: String },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("channel closed")]
    ChannelClosed,
}

impl ClientError {
    /// Returns `true` for failures a caller may reasonably retry.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport { message: err.to_string() }
    }

    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<EngineError> for ClientError {
    fn from(err: EngineError) -> Self {
        Self::Engine { code: err.code, message: err.message }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => Self::ChannelClosed,
            other => Self::transport(other),
        }
    }
}
