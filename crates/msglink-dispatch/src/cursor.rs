use msglink_frame::{FrameWriter, ProtocolEvent};

use crate::sink::DebugSink;

/// Value returned by [`PayloadCursor::next_byte`] once the payload is used up.
pub const OVERRUN_SENTINEL: u8 = 0;

/// Forward-only read position over one message's payload.
///
/// The cursor borrows the decoded message, so it cannot outlive the handler
/// call it was created for.
pub struct PayloadCursor<'a> {
    id: u8,
    payload: &'a [u8],
    pos: usize,
    sink: &'a mut dyn DebugSink,
}

impl<'a> PayloadCursor<'a> {
    /// Create a cursor positioned at the first payload byte.
    pub fn new(id: u8, payload: &'a [u8], sink: &'a mut dyn DebugSink) -> Self {
        Self {
            id,
            payload,
            pos: 0,
            sink,
        }
    }

    /// Type id of the message being read.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// True while unread payload bytes remain.
    pub fn has_next(&self) -> bool {
        self.pos < self.payload.len()
    }

    /// Read the next payload byte.
    ///
    /// Reading past the end reports [`ProtocolEvent::CursorOverrun`] and
    /// returns [`OVERRUN_SENTINEL`]; the position does not move.
    pub fn next_byte(&mut self) -> u8 {
        match self.payload.get(self.pos) {
            Some(&byte) => {
                self.pos += 1;
                byte
            }
            None => {
                self.sink
                    .report(&ProtocolEvent::CursorOverrun { id: self.id });
                OVERRUN_SENTINEL
            }
        }
    }

    /// Number of unread payload bytes.
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    /// Bytes read so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The whole payload, regardless of position.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Unread payload bytes, without consuming them.
    pub fn rest(&self) -> &'a [u8] {
        let payload = self.payload;
        &payload[self.pos..]
    }
}

impl Iterator for PayloadCursor<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = *self.payload.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl std::fmt::Debug for PayloadCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCursor")
            .field("id", &self.id)
            .field("len", &self.payload.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// What a handler gets: the payload cursor plus the link to reply on.
pub struct Message<'a, S> {
    cursor: PayloadCursor<'a>,
    writer: &'a mut FrameWriter<S>,
}

impl<'a, S> Message<'a, S> {
    pub fn new(cursor: PayloadCursor<'a>, writer: &'a mut FrameWriter<S>) -> Self {
        Self { cursor, writer }
    }

    /// Type id of this message.
    pub fn id(&self) -> u8 {
        self.cursor.id()
    }

    /// See [`PayloadCursor::has_next`].
    pub fn has_next(&self) -> bool {
        self.cursor.has_next()
    }

    /// See [`PayloadCursor::next_byte`].
    pub fn next_byte(&mut self) -> u8 {
        self.cursor.next_byte()
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn payload(&self) -> &'a [u8] {
        self.cursor.payload()
    }

    /// The payload cursor itself, e.g. to iterate over it.
    pub fn cursor(&mut self) -> &mut PayloadCursor<'a> {
        &mut self.cursor
    }

    /// The link's frame writer, for sending replies from inside the handler.
    pub fn reply(&mut self) -> &mut FrameWriter<S> {
        &mut *self.writer
    }
}
