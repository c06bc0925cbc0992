//! Typed commands carried in m8link packets.
//!
//! Every packet starts with an opcode byte that selects one command and
//! fixes its byte-length contract:
//!
//! | Opcode | Command                    | Length                      |
//! |--------|----------------------------|-----------------------------|
//! | `0xFE` | draw rectangle             | 12                          |
//! | `0xFD` | draw character             | 12                          |
//! | `0xFC` | draw oscilloscope waveform | 4, or 4 + screen width      |
//! | `0xFB` | joypad key state           | 3                           |
//!
//! Multi-byte integers are little-endian. The decoder is pure and total:
//! every packet maps to exactly one [`Command`] or one [`CommandError`].

pub mod command;
pub mod control;
pub mod error;
pub mod keys;
pub mod types;

pub use command::{decode, decode_with, Command, CommandConfig, Opcode};
pub use control::ControlMessage;
pub use error::{CommandError, Result};
pub use keys::{JoypadKeys, ParseKeysError};
pub use types::{Color, Position, Size, SCREEN_HEIGHT, SCREEN_WIDTH};
