//! Serial device access for m8link.
//!
//! Opens the device node the hardware enumerates as (a USB CDC-ACM serial
//! port on every supported platform) and hands back a [`DeviceStream`]
//! that the framing layer reads raw chunks from.
//!
//! This is the lowest layer of m8link. Line configuration is limited to
//! putting a terminal into raw mode so that no byte of the SLIP stream is
//! translated or swallowed by the line discipline.

pub mod device;
pub mod error;
pub mod stream;

#[cfg(unix)]
mod tty;

pub use device::{DeviceConfig, SerialDevice};
pub use error::{Result, TransportError};
pub use stream::DeviceStream;
