use msglink_frame::ProtocolEvent;

/// Receives recoverable protocol conditions (overflow, resync, unhandled
/// type, cursor overrun, bad registration).
///
/// Any `FnMut(&ProtocolEvent)` closure is a sink.
pub trait DebugSink {
    fn report(&mut self, event: &ProtocolEvent);
}

impl<F: FnMut(&ProtocolEvent)> DebugSink for F {
    fn report(&mut self, event: &ProtocolEvent) {
        self(event)
    }
}

/// Default sink: logs each condition as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn report(&mut self, event: &ProtocolEvent) {
        tracing::warn!(%event, "link protocol condition");
    }
}
