use thiserror::Error;

/// Errors that carry meaning across the executor boundary.
///
/// `Cancelled` is a marker the executor absorbs into a normal result;
/// everything else propagates to the caller as a fatal failure.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("request cancelled")]
    Cancelled,

    #[error("provider error {status}: {message}")]
    Provider { status: u16, message: String },
}

impl AgentError {
    /// True when `err` is (or wraps) the cancellation marker.
    pub fn is_cancellation(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<AgentError>(), Some(AgentError::Cancelled))
    }
}
