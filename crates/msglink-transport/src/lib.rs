//! Byte stream abstraction for point-to-point message links.
//!
//! The framing layer above only needs three things from a link: whether a
//! byte is ready, reading one byte, and writing one byte. This crate defines
//! that contract ([`ByteStream`]) and ships adapters for it:
//! - [`IoStream`] over any `std::io::Read + Write` (serial devices, sockets)
//! - [`MemoryStream`] in-memory loopback for tests and demos
//! - [`UnixDomainSocket`] as a local stand-in for a serial line (Unix only)

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{LinkOp, Result, TransportError};
pub use memory::MemoryStream;
pub use traits::{ByteStream, IoStream};

#[cfg(unix)]
pub use uds::UnixDomainSocket;
