use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::traits::ByteStream;

type Queue = Arc<Mutex<VecDeque<u8>>>;

/// In-memory byte link.
///
/// Clones share the same queues, so a test can keep a handle to a stream it
/// has moved into an endpoint and inspect or inject traffic through it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStream {
    rx: Queue,
    tx: Queue,
}

impl MemoryStream {
    /// Create a standalone stream: bytes are injected with
    /// [`push_incoming`](Self::push_incoming) and written bytes are collected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create two cross-wired ends of a loopback link.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Queue::default();
        let b_to_a = Queue::default();
        let a = Self {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
        };
        let b = Self {
            rx: a_to_b,
            tx: b_to_a,
        };
        (a, b)
    }

    /// Queue bytes as if they arrived from the remote side.
    pub fn push_incoming(&self, bytes: &[u8]) {
        lock(&self.rx).extend(bytes.iter().copied());
    }

    /// Number of received bytes not yet read.
    pub fn pending_incoming(&self) -> usize {
        lock(&self.rx).len()
    }

    /// Snapshot of bytes written and not yet consumed by the other side.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.tx).iter().copied().collect()
    }

    /// Remove and return everything written so far.
    pub fn take_written(&self) -> Vec<u8> {
        lock(&self.tx).drain(..).collect()
    }
}

impl ByteStream for MemoryStream {
    fn available(&mut self) -> std::io::Result<bool> {
        Ok(!lock(&self.rx).is_empty())
    }

    fn read_byte(&mut self) -> std::io::Result<u8> {
        lock(&self.rx)
            .pop_front()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::WouldBlock))
    }

    fn write_byte(&mut self, byte: u8) -> std::io::Result<()> {
        lock(&self.tx).push_back(byte);
        Ok(())
    }
}

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<u8>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}
