use msglink_transport::ByteStream;

use crate::codec::{is_reserved, END, ESCAPE, START};
use crate::error::{FrameError, Result};

/// Send-side bracketing state: whether a frame is currently open.
///
/// Frames are streamed straight to the link as `begin_send` → `send_byte`* →
/// `end_send`, so no payload is ever buffered here. Out-of-order calls fail
/// without touching the stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendSession {
    open: bool,
}

impl SendSession {
    /// A closed session.
    pub fn new() -> Self {
        Self::default()
    }

    /// True between a successful `begin_send` and its `end_send`.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open a frame: write START and the escaped id.
    ///
    /// The session only opens once both writes succeeded. A failed write may
    /// leave a partial header on the link; the peer drops it at the next START.
    pub fn begin_send<S: ByteStream + ?Sized>(&mut self, stream: &mut S, id: u8) -> Result<()> {
        if self.open {
            return Err(FrameError::SendAlreadyOpen);
        }
        stream.write_byte(START)?;
        write_escaped(stream, id)?;
        self.open = true;
        Ok(())
    }

    /// Write one escaped payload byte.
    pub fn send_byte<S: ByteStream + ?Sized>(&mut self, stream: &mut S, byte: u8) -> Result<()> {
        if !self.open {
            return Err(FrameError::SendNotOpen);
        }
        write_escaped(stream, byte)
    }

    /// Close the frame: write END and flush the stream.
    pub fn end_send<S: ByteStream + ?Sized>(&mut self, stream: &mut S) -> Result<()> {
        if !self.open {
            return Err(FrameError::SendNotOpen);
        }
        self.open = false;
        stream.write_byte(END)?;
        stream.flush()?;
        Ok(())
    }
}

fn write_escaped<S: ByteStream + ?Sized>(stream: &mut S, byte: u8) -> Result<()> {
    if is_reserved(byte) {
        stream.write_byte(ESCAPE)?;
    }
    stream.write_byte(byte)?;
    Ok(())
}

/// Streams frames to any [`ByteStream`].
pub struct FrameWriter<S> {
    inner: S,
    session: SendSession,
}

impl<S: ByteStream> FrameWriter<S> {
    /// Create a frame writer over a link.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            session: SendSession::new(),
        }
    }

    /// Open a frame for message type `id`.
    ///
    /// Fails with [`FrameError::SendAlreadyOpen`] and writes nothing if a
    /// frame is already open.
    pub fn begin_send(&mut self, id: u8) -> Result<()> {
        self.session.begin_send(&mut self.inner, id)
    }

    /// Write one payload byte into the open frame.
    pub fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.session.send_byte(&mut self.inner, byte)
    }

    /// Close the open frame.
    pub fn end_send(&mut self) -> Result<()> {
        self.session.end_send(&mut self.inner)
    }

    /// Send a message with no payload.
    pub fn send(&mut self, id: u8) -> Result<()> {
        self.begin_send(id)?;
        self.end_send()
    }

    /// Send `length` bytes of `data` starting at `offset` as one message.
    ///
    /// The window is validated before anything is written.
    pub fn send_with(&mut self, id: u8, data: &[u8], offset: usize, length: usize) -> Result<()> {
        let window = offset
            .checked_add(length)
            .and_then(|end| data.get(offset..end))
            .ok_or(FrameError::SliceOutOfRange {
                offset,
                length,
                len: data.len(),
            })?;
        self.send_payload(id, window)
    }

    /// Send a whole payload as one message.
    pub fn send_payload(&mut self, id: u8, payload: &[u8]) -> Result<()> {
        self.begin_send(id)?;
        for &byte in payload {
            self.send_byte(byte)?;
        }
        self.end_send()
    }

    /// True while a frame is open.
    pub fn is_sending(&self) -> bool {
        self.session.is_open()
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the writer and return the link.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> std::fmt::Debug for FrameWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWriter")
            .field("sending", &self.session.is_open())
            .finish_non_exhaustive()
    }
}
