use msglink_frame::ProtocolEvent;

use crate::cursor::Message;

/// A message handler. It reads its payload through the [`Message`] it is given.
pub type Handler<S> = Box<dyn FnMut(&mut Message<'_, S>)>;

const MAX_SLOTS: usize = u8::MAX as usize + 1;

/// Fixed-size table mapping message type ids to handlers.
///
/// Lookup is a direct index. The table never grows after construction;
/// registering an id outside it is refused.
pub struct DispatchTable<S> {
    slots: Box<[Option<Handler<S>>]>,
}

impl<S> DispatchTable<S> {
    /// Create a table with `slots` empty entries (at most 256).
    pub fn new(slots: usize) -> Self {
        Self {
            slots: (0..slots.min(MAX_SLOTS)).map(|_| None).collect(),
        }
    }

    /// Number of slots.
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    /// Install `handler` for `id`, replacing any previous one.
    pub fn register<F>(&mut self, id: u8, handler: F) -> Result<(), ProtocolEvent>
    where
        F: FnMut(&mut Message<'_, S>) + 'static,
    {
        let slots = self.slots.len();
        let slot = self
            .slots
            .get_mut(usize::from(id))
            .ok_or(ProtocolEvent::HandlerIdOutOfRange { id, slots })?;
        *slot = Some(Box::new(handler));
        Ok(())
    }

    /// Remove the handler for `id`. Returns true if one was installed.
    pub fn unregister(&mut self, id: u8) -> bool {
        self.slots
            .get_mut(usize::from(id))
            .and_then(Option::take)
            .is_some()
    }

    /// True if a handler is installed for `id`.
    pub fn is_registered(&self, id: u8) -> bool {
        matches!(self.slots.get(usize::from(id)), Some(Some(_)))
    }

    /// Run the handler for the message's id.
    ///
    /// A missing handler is reported as [`ProtocolEvent::UnhandledType`]; the
    /// message is simply dropped.
    pub fn dispatch(&mut self, message: &mut Message<'_, S>) -> Result<(), ProtocolEvent> {
        let id = message.id();
        match self.slots.get_mut(usize::from(id)) {
            Some(Some(handler)) => {
                handler(message);
                Ok(())
            }
            _ => Err(ProtocolEvent::UnhandledType { id }),
        }
    }
}

impl<S> std::fmt::Debug for DispatchTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|_| id))
            .collect();
        f.debug_struct("DispatchTable")
            .field("slots", &self.slots.len())
            .field("registered", &registered)
            .finish()
    }
}
