use crate::command::Opcode;

/// Errors that can occur while decoding a packet into a command.
///
/// Each error is local to the packet that caused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A zero-length packet reached the decoder.
    #[error("empty packet")]
    EmptyPacket,

    /// The first byte is not a known opcode.
    #[error("unknown opcode 0x{opcode:02X}")]
    UnknownOpcode { opcode: u8 },

    /// A known opcode arrived with a length its command does not allow.
    #[error("invalid {command} packet: expected {expected} bytes, got {actual}")]
    Length {
        command: Opcode,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, CommandError>;
