use bytes::{BufMut, BytesMut};

use crate::codec::{END, ESCAPE, MSG_CAP, START};
use crate::error::ProtocolEvent;

/// Where the assembler is within the frame grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for a START marker; everything else is line noise.
    Idle,
    /// Collecting message bytes.
    InMessage,
    /// The previous byte was ESCAPE; the next one is taken literally.
    Escaping,
    /// Idle, and the previous byte was ESCAPE; the next one is skipped so an
    /// escaped marker left over from a dropped frame cannot open a new one.
    IdleEscaping,
}

/// Marker for a fully decoded message sitting in the assembler's buffer.
///
/// `payload_start..payload_end` bounds the payload within the message buffer
/// and excludes the id byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedMessage {
    pub id: u8,
    pub payload_start: usize,
    pub payload_end: usize,
}

impl CompletedMessage {
    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload_end - self.payload_start
    }
}

/// Incremental frame decoder, fed one raw byte at a time.
///
/// Decoded bytes go into a message buffer that is allocated once and never
/// grows: a message that would exceed the capacity is dropped instead.
/// The buffer of a completed message stays intact until the next START, so
/// callers can read the payload between two `feed` calls.
#[derive(Debug)]
pub struct Assembler {
    state: ParserState,
    buf: BytesMut,
    capacity: usize,
}

impl Assembler {
    /// Create an assembler with the default message capacity.
    pub fn new() -> Self {
        Self::with_capacity(MSG_CAP)
    }

    /// Create an assembler whose message buffer holds at most `capacity`
    /// decoded bytes (id included).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: ParserState::Idle,
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Feed one raw byte.
    ///
    /// Returns `Ok(Some(_))` when the byte completed a message and `Ok(None)`
    /// while a frame is still in progress or the line is idle. `Err` carries a
    /// recoverable condition; the assembler has already recovered from it.
    pub fn feed(&mut self, byte: u8) -> Result<Option<CompletedMessage>, ProtocolEvent> {
        match self.state {
            ParserState::Idle => {
                match byte {
                    START => self.begin(),
                    ESCAPE => self.state = ParserState::IdleEscaping,
                    _ => {}
                }
                Ok(None)
            }
            ParserState::IdleEscaping => {
                self.state = ParserState::Idle;
                Ok(None)
            }
            ParserState::InMessage => match byte {
                ESCAPE => {
                    self.state = ParserState::Escaping;
                    Ok(None)
                }
                END => self.finish().map(Some),
                START => {
                    let discarded = self.buf.len();
                    self.begin();
                    Err(ProtocolEvent::UnexpectedResync { discarded })
                }
                _ => self.push(byte).map(|()| None),
            },
            ParserState::Escaping => {
                self.push(byte)?;
                self.state = ParserState::InMessage;
                Ok(None)
            }
        }
    }

    /// Current parser state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Number of decoded bytes buffered for the current (or last) message.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when no decoded bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Message buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Payload bytes of a message returned by the last [`feed`](Self::feed).
    pub fn payload(&self, message: &CompletedMessage) -> &[u8] {
        let end = message.payload_end.min(self.buf.len());
        let start = message.payload_start.min(end);
        &self.buf[start..end]
    }

    /// Drop any partial message and wait for the next START.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ParserState::Idle;
    }

    fn begin(&mut self) {
        self.buf.clear();
        self.state = ParserState::InMessage;
    }

    fn push(&mut self, byte: u8) -> Result<(), ProtocolEvent> {
        if self.buf.len() >= self.capacity {
            self.reset();
            return Err(ProtocolEvent::BufferOverflow {
                capacity: self.capacity,
            });
        }
        self.buf.put_u8(byte);
        Ok(())
    }

    fn finish(&mut self) -> Result<CompletedMessage, ProtocolEvent> {
        self.state = ParserState::Idle;
        let Some(&id) = self.buf.first() else {
            return Err(ProtocolEvent::EmptyMessage);
        };
        tracing::trace!(id, len = self.buf.len() - 1, "frame complete");
        Ok(CompletedMessage {
            id,
            payload_start: 1,
            payload_end: self.buf.len(),
        })
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}
