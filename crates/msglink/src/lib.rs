//! Framed, typed messages over a single serial link.
//!
//! msglink turns a raw, ordered byte stream into discrete messages: each one
//! carries a one-byte type id and a payload, is delimited by START/END
//! markers with byte stuffing, and is routed to the handler registered for
//! its id.
//!
//! # Crate Structure
//!
//! - [`transport`] — The byte stream contract and its adapters
//! - [`frame`] — Frame codec, receive assembler and send session
//! - [`dispatch`] — Endpoint with handler table and payload cursor (behind `dispatch` feature)

/// Re-export transport types.
pub mod transport {
    pub use msglink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msglink_frame::*;
}

/// Re-export dispatch types (requires `dispatch` feature).
#[cfg(feature = "dispatch")]
pub mod dispatch {
    pub use msglink_dispatch::*;
}
