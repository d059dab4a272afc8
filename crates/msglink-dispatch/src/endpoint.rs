use bytes::{BufMut, BytesMut};
use msglink_frame::{Assembler, CompletedMessage, FrameWriter, ParserState};
use msglink_transport::ByteStream;
use tracing::debug;

use crate::config::EndpointConfig;
use crate::cursor::{Message, PayloadCursor};
use crate::error::Result;
use crate::sink::{DebugSink, TracingSink};
use crate::table::DispatchTable;

/// One end of a framed point-to-point link.
///
/// Owns the byte stream, the receive assembler, the dispatch table and the
/// send state. Drive it by calling [`poll_once`](Self::poll_once) from a
/// loop; handlers run synchronously inside that call, one message at a time.
///
/// The receive path is not reentrant: handlers get a [`Message`] that can
/// read the payload and send replies, but cannot feed more input.
pub struct Endpoint<S: ByteStream> {
    link: FrameWriter<S>,
    assembler: Assembler,
    table: DispatchTable<S>,
    raw: BytesMut,
    sink: Box<dyn DebugSink>,
    config: EndpointConfig,
}

impl<S: ByteStream> Endpoint<S> {
    /// Create an endpoint with default sizing over `stream`.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, EndpointConfig::default())
    }

    /// Create an endpoint with explicit sizing.
    pub fn with_config(stream: S, config: EndpointConfig) -> Self {
        Self {
            link: FrameWriter::new(stream),
            assembler: Assembler::with_capacity(config.frame.max_message_size),
            table: DispatchTable::new(config.handler_slots),
            raw: BytesMut::with_capacity(config.frame.read_chunk_size),
            sink: Box::new(TracingSink),
            config,
        }
    }

    /// Replace the debug sink.
    pub fn with_debug_sink(mut self, sink: impl DebugSink + 'static) -> Self {
        self.set_debug_sink(sink);
        self
    }

    /// Replace the debug sink in place.
    pub fn set_debug_sink(&mut self, sink: impl DebugSink + 'static) {
        self.sink = Box::new(sink);
    }

    /// Install a handler for message type `id`; the last registration wins.
    ///
    /// An id outside the dispatch table is reported to the debug sink and
    /// returned as an error; nothing is installed.
    pub fn register_handler<F>(&mut self, id: u8, handler: F) -> Result<()>
    where
        F: FnMut(&mut Message<'_, S>) + 'static,
    {
        if let Err(event) = self.table.register(id, handler) {
            self.sink.report(&event);
            return Err(event.into());
        }
        debug!(id, "handler registered");
        Ok(())
    }

    /// Remove the handler for `id`. Returns true if one was installed.
    pub fn unregister_handler(&mut self, id: u8) -> bool {
        self.table.unregister(id)
    }

    /// Read every byte currently available on the link and dispatch each
    /// message as soon as it completes.
    ///
    /// Returns the number of messages handed to a handler. Protocol
    /// conditions go to the debug sink; only link I/O failures are errors.
    pub fn poll_once(&mut self) -> Result<usize> {
        let chunk = self.config.frame.read_chunk_size.max(1);
        let mut dispatched = 0usize;
        loop {
            self.raw.clear();
            let stream = self.link.get_mut();
            while self.raw.len() < chunk && stream.available()? {
                self.raw.put_u8(stream.read_byte()?);
            }
            if self.raw.is_empty() {
                return Ok(dispatched);
            }

            let raw = std::mem::take(&mut self.raw);
            for &byte in raw.iter() {
                if self.feed_byte(byte) {
                    dispatched += 1;
                }
            }
            self.raw = raw;
        }
    }

    /// Feed one raw byte from an external source, dispatching the message
    /// it completes, if any. Returns true if a handler ran.
    pub fn feed_byte(&mut self, byte: u8) -> bool {
        match self.assembler.feed(byte) {
            Ok(Some(done)) => self.dispatch(done),
            Ok(None) => false,
            Err(event) => {
                self.sink.report(&event);
                false
            }
        }
    }

    fn dispatch(&mut self, done: CompletedMessage) -> bool {
        debug!(id = done.id, len = done.payload_len(), "dispatching message");
        let cursor = PayloadCursor::new(
            done.id,
            self.assembler.payload(&done),
            self.sink.as_mut(),
        );
        let mut message = Message::new(cursor, &mut self.link);
        let outcome = self.table.dispatch(&mut message);

        match outcome {
            Ok(()) => true,
            Err(event) => {
                self.sink.report(&event);
                false
            }
        }
    }

    /// Open an outgoing frame. See [`FrameWriter::begin_send`].
    pub fn begin_send(&mut self, id: u8) -> Result<()> {
        Ok(self.link.begin_send(id)?)
    }

    /// Write one payload byte into the open frame.
    pub fn send_byte(&mut self, byte: u8) -> Result<()> {
        Ok(self.link.send_byte(byte)?)
    }

    /// Close the open frame.
    pub fn end_send(&mut self) -> Result<()> {
        Ok(self.link.end_send()?)
    }

    /// Send a message with no payload.
    pub fn send(&mut self, id: u8) -> Result<()> {
        Ok(self.link.send(id)?)
    }

    /// Send `length` bytes of `data` from `offset` as one message.
    pub fn send_with(&mut self, id: u8, data: &[u8], offset: usize, length: usize) -> Result<()> {
        Ok(self.link.send_with(id, data, offset, length)?)
    }

    /// Send a whole payload as one message.
    pub fn send_payload(&mut self, id: u8, payload: &[u8]) -> Result<()> {
        Ok(self.link.send_payload(id, payload)?)
    }

    /// True while an outgoing frame is open.
    pub fn is_sending(&self) -> bool {
        self.link.is_sending()
    }

    /// Current receive parser state.
    pub fn parser_state(&self) -> ParserState {
        self.assembler.state()
    }

    /// True if a handler is installed for `id`.
    pub fn has_handler(&self, id: u8) -> bool {
        self.table.is_registered(id)
    }

    /// Endpoint configuration.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &S {
        self.link.get_ref()
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut S {
        self.link.get_mut()
    }

    /// Consume the endpoint and return the link.
    pub fn into_inner(self) -> S {
        self.link.into_inner()
    }
}

impl<S: ByteStream> std::fmt::Debug for Endpoint<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("parser", &self.assembler.state())
            .field("sending", &self.link.is_sending())
            .field("table", &self.table)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
