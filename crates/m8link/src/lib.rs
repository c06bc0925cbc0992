//! Host-side client for the M8 headless display protocol.
//!
//! The device streams SLIP-framed display commands over a USB serial
//! link and accepts short raw control messages back. This crate
//! re-exports the layers that handle each part of that exchange.
//!
//! # Crate Structure
//!
//! - [`transport`]: opening the serial device node
//! - [`frame`]: SLIP packetizer, encoder, and blocking/async readers
//! - [`command`]: command decoding and outbound control messages
//! - [`session`]: resilient decoding, renderer contract, and pipelines

/// Re-export transport types.
pub mod transport {
    pub use m8link_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use m8link_frame::*;
}

/// Re-export command types.
pub mod command {
    pub use m8link_command::*;
}

/// Re-export session types.
pub mod session {
    pub use m8link_session::*;
}
