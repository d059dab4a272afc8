/// Errors returned by the send path.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// `begin_send` was called while a frame was still open.
    #[error("a send is already in progress")]
    SendAlreadyOpen,

    /// `send_byte` or `end_send` was called with no open frame.
    #[error("no send in progress")]
    SendNotOpen,

    /// The requested payload window does not fit in the source slice.
    #[error("payload window {offset}+{length} exceeds source length {len}")]
    SliceOutOfRange {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// An I/O error occurred while writing to the byte stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Recoverable protocol conditions.
///
/// These never abort the link; they are handed to a debug sink and parsing
/// or dispatch simply continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolEvent {
    /// A message did not fit in the message buffer and was dropped.
    #[error("message exceeds buffer capacity ({capacity} bytes); dropped")]
    BufferOverflow { capacity: usize },

    /// A START marker arrived inside a message; the partial message was dropped.
    #[error("unexpected start marker; discarded {discarded} partial bytes")]
    UnexpectedResync { discarded: usize },

    /// START was immediately followed by END, so there is no type id.
    #[error("empty frame without a message type id")]
    EmptyMessage,

    /// No handler is registered for a completed message.
    #[error("no handler registered for message type {id}")]
    UnhandledType { id: u8 },

    /// A handler read past the end of its payload.
    #[error("payload read past end of message type {id}")]
    CursorOverrun { id: u8 },

    /// A handler registration used an id outside the dispatch table.
    #[error("handler id {id} out of range (table has {slots} slots)")]
    HandlerIdOutOfRange { id: u8, slots: usize },
}
