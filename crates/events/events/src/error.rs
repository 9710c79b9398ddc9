//! Publisher error types.

use rpc_register_core::RegisterError;
use thiserror::Error;

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Error returned when an event could not be admitted into the pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    /// `publish` was called before `start` completed.
    #[error("Publisher has not been started")]
    Uninitialized,

    /// `start` was called outside a Tokio runtime.
    #[error("Publisher must be started within a Tokio runtime")]
    NoRuntime,

    /// The channel stayed full for the whole admission wait.
    #[error("Admission timeout: channel full for {timeout_ms}ms")]
    AdmissionTimeout { timeout_ms: u64 },

    /// The channel was full and the policy does not wait.
    #[error("Channel full")]
    ChannelFull,

    /// The consumer side of the channel is gone.
    #[error("Channel closed")]
    Closed,

    /// The event itself was malformed.
    #[error(transparent)]
    Invalid(#[from] RegisterError),
}

impl PublishError {
    /// Returns true if the event was well-formed but could not be admitted.
    pub fn is_admission(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Invalid(err) => err.status_code(),
            _ => 503,
        }
    }
}
