use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::DeviceStream;

/// Line settings applied when a device node is opened.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Put terminal devices into raw mode. Ignored for non-terminals.
    pub raw_mode: bool,
    /// Read timeout for blocking reads. `None` blocks until data arrives.
    pub read_timeout: Option<Duration>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            raw_mode: true,
            read_timeout: None,
        }
    }
}

/// Serial device opener.
///
/// The device exposes a USB CDC-ACM port. Baud rate is irrelevant for such
/// ports, so the only line setting applied is raw mode.
pub struct SerialDevice;

impl SerialDevice {
    /// Device path used when none is configured.
    #[cfg(target_os = "macos")]
    pub const DEFAULT_PATH: &'static str = "/dev/cu.usbmodem1";
    #[cfg(not(target_os = "macos"))]
    pub const DEFAULT_PATH: &'static str = "/dev/ttyACM0";

    /// Open a device node for reading and writing with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<DeviceStream> {
        Self::open_with_config(path, &DeviceConfig::default())
    }

    /// Open a device node for reading and writing with explicit settings.
    pub fn open_with_config(path: impl AsRef<Path>, config: &DeviceConfig) -> Result<DeviceStream> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.read(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // Never let the device become our controlling terminal.
            options.custom_flags(libc::O_NOCTTY);
        }

        let file = options.open(&path).map_err(|e| TransportError::Open {
            path: path.clone(),
            source: e,
        })?;

        let tty = Self::configure(&file, &path, config)?;
        info!(?path, tty, "opened device");

        Ok(DeviceStream::from_file(file, tty))
    }

    #[cfg(unix)]
    fn configure(file: &std::fs::File, path: &Path, config: &DeviceConfig) -> Result<bool> {
        use std::os::fd::AsRawFd;

        let fd = file.as_raw_fd();
        if !crate::tty::is_tty(fd) {
            debug!(?path, "device is not a terminal; leaving line settings alone");
            return Ok(false);
        }

        let applied = if config.raw_mode {
            crate::tty::make_raw(fd, config.read_timeout)
        } else {
            crate::tty::set_read_timeout(fd, config.read_timeout)
        };
        applied.map_err(|e| TransportError::Configure {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, raw = config.raw_mode, timeout = ?config.read_timeout, "configured terminal");

        Ok(true)
    }

    #[cfg(not(unix))]
    fn configure(_file: &std::fs::File, path: &Path, _config: &DeviceConfig) -> Result<bool> {
        debug!(?path, "line settings unsupported on this platform");
        Ok(false)
    }

    /// Transport name for diagnostics.
    pub fn transport_name() -> &'static str {
        "serial-device"
    }
}
