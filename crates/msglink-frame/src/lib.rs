//! Byte-stuffed message framing for serial links.
//!
//! Every message travels as:
//! - a START marker
//! - the message type id
//! - the payload bytes
//! - an END marker
//!
//! Any id or payload byte equal to START, END or ESCAPE is sent as ESCAPE
//! followed by the literal byte, so markers never appear inside a frame.
//! A stray START always restarts parsing, which is how the receiver regains
//! alignment after line noise.

pub mod assembler;
pub mod codec;
pub mod error;
pub mod session;

pub use assembler::{Assembler, CompletedMessage, ParserState};
pub use codec::{
    decode_frames, encode_frame, encoded_len, escape_into, is_reserved, Frame, FrameConfig, END,
    ESCAPE, MSG_CAP, READ_CAP, START,
};
pub use error::{FrameError, ProtocolEvent, Result};
pub use session::{FrameWriter, SendSession};
