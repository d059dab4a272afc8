use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{LinkOp, Result, TransportError};
use crate::traits::IoStream;

/// Unix domain socket standing in for a serial line.
///
/// Accepted and connected streams are switched to non-blocking mode so they
/// can be polled through [`ByteStream::available`](crate::ByteStream::available).
/// The socket file is removed on drop if it is still the one we created.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl UnixDomainSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on a filesystem-path Unix domain socket.
    ///
    /// A stale socket file at `path` is removed first; any other kind of file
    /// is left alone and the bind fails.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |source: std::io::Error| TransportError::Socket {
            op: LinkOp::Bind,
            path: path.clone(),
            source,
        };

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(bind_err)?;
            if !metadata.file_type().is_socket() {
                return Err(TransportError::NotASocket { path: path.clone() });
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(|source| TransportError::Socket {
            op: LinkOp::Configure,
            path: path.clone(),
            source,
        })?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            created_inode: Some((created.dev(), created.ino())),
            path,
        })
    }

    /// Accept an incoming connection (blocking), returned as a non-blocking link.
    pub fn accept(&self) -> Result<IoStream<UnixStream>> {
        let socket_err = |op: LinkOp| {
            move |source: std::io::Error| TransportError::Socket {
                op,
                path: self.path.clone(),
                source,
            }
        };
        let (stream, _addr) = self.listener.accept().map_err(socket_err(LinkOp::Accept))?;
        stream
            .set_nonblocking(true)
            .map_err(socket_err(LinkOp::Configure))?;
        debug!("accepted connection");
        Ok(IoStream::new(stream))
    }

    /// Connect to a listening Unix domain socket, returned as a non-blocking link.
    pub fn connect(path: impl AsRef<Path>) -> Result<IoStream<UnixStream>> {
        let path = path.as_ref();
        let socket_err = |op: LinkOp| {
            move |source: std::io::Error| TransportError::Socket {
                op,
                path: path.to_path_buf(),
                source,
            }
        };
        let stream = UnixStream::connect(path).map_err(socket_err(LinkOp::Connect))?;
        stream
            .set_nonblocking(true)
            .map_err(socket_err(LinkOp::Configure))?;
        debug!(?path, "connected to unix domain socket");
        Ok(IoStream::new(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        let Some((expected_dev, expected_ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::traits::ByteStream;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("msglink-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn bind_accept_connect() {
        let dir = temp_dir("uds");
        let sock_path = dir.join("link.sock");

        let listener = UnixDomainSocket::bind(&sock_path).unwrap();
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let handle = std::thread::spawn(move || {
            let mut client = UnixDomainSocket::connect(&path_clone).unwrap();
            client.write_byte(0x42).unwrap();
            client.flush().unwrap();
        });

        let mut server = listener.accept().unwrap();
        handle.join().unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while !server.available().unwrap() {
            assert!(Instant::now() < deadline, "byte never arrived");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(server.read_byte().unwrap(), 0x42);

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be cleaned up on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = UnixDomainSocket::bind(&long_path);
        assert!(matches!(result, Err(TransportError::PathTooLong { .. })));
    }

    #[test]
    fn default_permissions_are_owner_only() {
        let dir = temp_dir("perms");
        let sock_path = dir.join("perm.sock");

        let listener = UnixDomainSocket::bind(&sock_path).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bind_rejects_existing_regular_file() {
        let dir = temp_dir("bind-file");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = UnixDomainSocket::bind(&sock_path);
        assert!(matches!(result, Err(TransportError::NotASocket { .. })));
        assert!(sock_path.exists(), "regular file must be left alone");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn connect_to_missing_socket_names_the_operation() {
        let dir = temp_dir("missing");
        let sock_path = dir.join("absent.sock");

        match UnixDomainSocket::connect(&sock_path) {
            Err(TransportError::Socket { op, path, .. }) => {
                assert_eq!(op, LinkOp::Connect);
                assert_eq!(path, sock_path);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
