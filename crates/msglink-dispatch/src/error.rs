use msglink_frame::{FrameError, ProtocolEvent};

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Send-path error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The link failed while reading.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request the protocol cannot honour, such as an out-of-range handler id.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolEvent),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
