use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// A connected device stream. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type returned by transport operations.
/// Usually it wraps an opened serial device node; on Unix it can also wrap
/// one end of a socket pair, which stands in for the device in tests and
/// replay tooling.
pub struct DeviceStream {
    inner: DeviceStreamInner,
}

enum DeviceStreamInner {
    File {
        file: std::fs::File,
        tty: bool,
    },
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for DeviceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            DeviceStreamInner::File { file, .. } => file.read(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for DeviceStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            DeviceStreamInner::File { file, .. } => file.write(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            DeviceStreamInner::File { file, .. } => file.flush(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl DeviceStream {
    pub(crate) fn from_file(file: std::fs::File, tty: bool) -> Self {
        Self {
            inner: DeviceStreamInner::File { file, tty },
        }
    }

    /// Create a connected pair of in-memory streams.
    ///
    /// Bytes written to one end are read from the other, which makes the
    /// pair a drop-in stand-in for a device link.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((
            Self {
                inner: DeviceStreamInner::Unix(left),
            },
            Self {
                inner: DeviceStreamInner::Unix(right),
            },
        ))
    }

    /// Whether this stream is attached to a terminal device.
    pub fn is_tty(&self) -> bool {
        match &self.inner {
            DeviceStreamInner::File { tty, .. } => *tty,
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => false,
        }
    }

    /// Set read timeout on the underlying stream.
    ///
    /// For terminals the timeout is applied through the line settings and
    /// has a resolution of a tenth of a second. Plain files never block, so
    /// the call is a no-op for them.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            DeviceStreamInner::File { file, tty: true } => {
                use std::os::fd::AsRawFd;
                crate::tty::set_read_timeout(file.as_raw_fd(), timeout).map_err(Into::into)
            }
            DeviceStreamInner::File { .. } => Ok(()),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// The clone shares the device, so one handle can be moved to a reader
    /// thread while the other keeps writing control messages.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            DeviceStreamInner::File { file, tty } => Ok(Self::from_file(file.try_clone()?, *tty)),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => Ok(Self {
                inner: DeviceStreamInner::Unix(stream.try_clone()?),
            }),
        }
    }
}

impl std::fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            DeviceStreamInner::File { tty, .. } => f
                .debug_struct("DeviceStream")
                .field("type", &"file")
                .field("tty", tty)
                .finish(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => f
                .debug_struct("DeviceStream")
                .field("type", &"unix-pair")
                .finish(),
        }
    }
}
