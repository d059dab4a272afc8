use msglink_frame::FrameConfig;

/// Default number of handler slots (message type ids `0..8`).
pub const HANDLER_COUNT: usize = 8;

/// Controls endpoint sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Buffer sizes for the framing layer.
    pub frame: FrameConfig,
    /// Number of dispatch table slots. Ids at or above this are unhandled.
    /// Capped at 256, the number of distinct type ids.
    pub handler_slots: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            handler_slots: HANDLER_COUNT,
        }
    }
}
