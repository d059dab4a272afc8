use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};

const READ_CHUNK_SIZE: usize = 256;
const WRITE_FLUSH_THRESHOLD: usize = 256;
/// Pause between write attempts while a non-blocking link is full.
const WRITE_RETRY_BACKOFF: Duration = Duration::from_millis(1);

/// A raw, ordered, boundary-less byte link.
///
/// This is the only thing the framing layer consumes. Implementations must
/// not block in [`available`](ByteStream::available); `read_byte` is only
/// called after `available` returned `true`.
pub trait ByteStream {
    /// Whether at least one byte can be read without blocking.
    fn available(&mut self) -> std::io::Result<bool>;

    /// Read one byte.
    fn read_byte(&mut self) -> std::io::Result<u8>;

    /// Write one byte.
    fn write_byte(&mut self, byte: u8) -> std::io::Result<()>;

    /// Push any buffered output to the link.
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    /// True once the peer has hung up. Links that cannot close never do.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn available(&mut self) -> std::io::Result<bool> {
        (**self).available()
    }

    fn read_byte(&mut self) -> std::io::Result<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> std::io::Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Adapts any `Read + Write` stream (serial device, socket) to [`ByteStream`].
///
/// Incoming bytes are pulled in chunks into a lookahead buffer. A read that
/// returns `WouldBlock` or `TimedOut` means "nothing available", so the inner
/// stream should be non-blocking or carry a short read timeout.
///
/// Outgoing bytes are staged and written out on [`flush`](ByteStream::flush)
/// or once the staging buffer fills up.
pub struct IoStream<T> {
    inner: T,
    rx: BytesMut,
    tx: BytesMut,
    closed: bool,
}

impl<T: Read + Write> IoStream<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rx: BytesMut::with_capacity(READ_CHUNK_SIZE),
            tx: BytesMut::with_capacity(WRITE_FLUSH_THRESHOLD),
            closed: false,
        }
    }

    /// True once the inner stream reported end-of-file.
    ///
    /// Bytes already buffered can still be read.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the adapter and return the inner stream.
    ///
    /// Unread lookahead and unflushed output are discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn fill(&mut self) -> std::io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    if !self.closed {
                        tracing::debug!("byte stream reached end of file");
                    }
                    self.closed = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn drain_tx(&mut self) -> std::io::Result<()> {
        while !self.tx.is_empty() {
            match self.inner.write(&self.tx) {
                Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero)),
                Ok(n) => self.tx.advance(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(WRITE_RETRY_BACKOFF);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl<T: Read + Write> ByteStream for IoStream<T> {
    fn available(&mut self) -> std::io::Result<bool> {
        if self.rx.is_empty() && !self.closed {
            self.fill()?;
        }
        Ok(!self.rx.is_empty())
    }

    fn read_byte(&mut self) -> std::io::Result<u8> {
        if !self.available()? {
            let kind = if self.closed {
                ErrorKind::UnexpectedEof
            } else {
                ErrorKind::WouldBlock
            };
            return Err(std::io::Error::from(kind));
        }
        Ok(self.rx.get_u8())
    }

    fn write_byte(&mut self, byte: u8) -> std::io::Result<()> {
        self.tx.put_u8(byte);
        if self.tx.len() >= WRITE_FLUSH_THRESHOLD {
            self.drain_tx()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_tx()?;
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(WRITE_RETRY_BACKOFF);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T> std::fmt::Debug for IoStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoStream")
            .field("buffered_rx", &self.rx.len())
            .field("pending_tx", &self.tx.len())
            .field("closed", &self.closed)
            .finish()
    }
}
