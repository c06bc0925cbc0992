use crate::keys::JoypadKeys;

/// Control byte: enable the display stream.
pub const CONTROL_ENABLE: u8 = b'E';
/// Control byte: reset (redraw) the display.
pub const CONTROL_RESET: u8 = b'R';
/// Control byte: set the controller input state; the key mask follows.
pub const CONTROL_INPUT: u8 = b'C';

/// Messages sent from the client to the device.
///
/// These travel raw, not SLIP-framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Sent once at session start; the device begins streaming and redraws.
    EnableAndResetDisplay,
    /// Sent whenever local input state changes.
    SetInputState(JoypadKeys),
}

impl ControlMessage {
    /// The wire bytes of this message.
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            ControlMessage::EnableAndResetDisplay => [CONTROL_ENABLE, CONTROL_RESET],
            ControlMessage::SetInputState(keys) => [CONTROL_INPUT, keys.bits()],
        }
    }
}
