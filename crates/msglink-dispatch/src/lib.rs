//! Message-type dispatch over a framed serial link.
//!
//! This is the layer applications talk to. An [`Endpoint`] owns one link,
//! turns incoming bytes into messages and routes each message to the handler
//! registered for its type id. Handlers read their payload through a
//! [`PayloadCursor`] and may reply through the same link.
//!
//! ```
//! use msglink_dispatch::Endpoint;
//! use msglink_transport::MemoryStream;
//!
//! let wire = MemoryStream::new();
//! let mut endpoint = Endpoint::new(wire.clone());
//!
//! endpoint
//!     .register_handler(5, |msg| {
//!         let mut sum = 0u32;
//!         while msg.has_next() {
//!             sum += u32::from(msg.next_byte());
//!         }
//!         let _ = msg.reply().send_payload(6, &sum.to_le_bytes());
//!     })
//!     .unwrap();
//!
//! wire.push_incoming(&[0x02, 5, 1, 2, 3, 0x03]);
//! assert_eq!(endpoint.poll_once().unwrap(), 1);
//! assert_eq!(wire.written(), vec![0x02, 6, 6, 0, 0, 0, 0x03]);
//! ```

pub mod config;
pub mod cursor;
pub mod endpoint;
pub mod error;
pub mod sink;
pub mod table;

pub use config::{EndpointConfig, HANDLER_COUNT};
pub use cursor::{Message, PayloadCursor};
pub use endpoint::Endpoint;
pub use error::{DispatchError, Result};
pub use sink::{DebugSink, TracingSink};
pub use table::{DispatchTable, Handler};
