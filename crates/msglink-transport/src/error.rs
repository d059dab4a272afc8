use std::fmt;
use std::io;
use std::path::PathBuf;

/// The socket operation that failed while setting up a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOp {
    Bind,
    Accept,
    Connect,
    /// Switching the stream to non-blocking mode or setting permissions.
    Configure,
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkOp::Bind => "bind",
            LinkOp::Accept => "accept",
            LinkOp::Connect => "connect",
            LinkOp::Configure => "configure",
        })
    }
}

/// Errors raised while opening or using a link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot {op} link at {path}: {source}")]
    Socket {
        op: LinkOp,
        path: PathBuf,
        source: io::Error,
    },

    /// Something other than a socket already sits at the link path.
    #[error("{path} exists and is not a unix socket")]
    NotASocket { path: PathBuf },

    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The peer hung up; buffered input may still have been delivered.
    #[error("link closed by peer")]
    Closed,

    #[error("link I/O error: {0}")]
    Io(io::Error),
}

impl TransportError {
    /// The underlying I/O error, if there is one.
    pub fn io_source(&self) -> Option<&io::Error> {
        match self {
            TransportError::Socket { source, .. } | TransportError::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    /// Hang-ups become [`TransportError::Closed`]; everything else stays I/O.
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => TransportError::Closed,
            _ => TransportError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
