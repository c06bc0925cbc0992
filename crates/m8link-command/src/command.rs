use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CommandError, Result};
use crate::keys::JoypadKeys;
use crate::types::{Color, Position, Size, SCREEN_WIDTH};

/// Length of the draw rectangle and draw character packets.
pub const DRAW_PACKET_LEN: usize = 12;

/// Opcode plus waveform color; the samples follow.
pub const WAVEFORM_HEADER_LEN: usize = 4;

/// Length of the joypad key state packet.
pub const JOYPAD_PACKET_LEN: usize = 3;

/// Command opcodes, the first byte of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    DrawRectangle = 0xFE,
    DrawCharacter = 0xFD,
    DrawOscilloscopeWaveform = 0xFC,
    JoypadKeyState = 0xFB,
}

impl Opcode {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xFE => Some(Self::DrawRectangle),
            0xFD => Some(Self::DrawCharacter),
            0xFC => Some(Self::DrawOscilloscopeWaveform),
            0xFB => Some(Self::JoypadKeyState),
            _ => None,
        }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::DrawRectangle => "draw rectangle",
            Self::DrawCharacter => "draw character",
            Self::DrawOscilloscopeWaveform => "draw oscilloscope waveform",
            Self::JoypadKeyState => "joypad key state",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded display or input command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    DrawRectangle {
        pos: Position,
        size: Size,
        color: Color,
    },
    DrawCharacter {
        code: u8,
        pos: Position,
        fg: Color,
        bg: Color,
    },
    /// Empty `samples` turns the waveform display off; otherwise there is
    /// one opaque sample per screen column.
    DrawOscilloscopeWaveform { color: Color, samples: Bytes },
    JoypadKeyState { mask: JoypadKeys },
    /// Stands in for a frame that failed to decode.
    NoOp,
}

impl Command {
    /// Opcode this command is encoded with. `NoOp` has none.
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Command::DrawRectangle { .. } => Some(Opcode::DrawRectangle),
            Command::DrawCharacter { .. } => Some(Opcode::DrawCharacter),
            Command::DrawOscilloscopeWaveform { .. } => Some(Opcode::DrawOscilloscopeWaveform),
            Command::JoypadKeyState { .. } => Some(Opcode::JoypadKeyState),
            Command::NoOp => None,
        }
    }

    /// Short name for logs and tables.
    pub fn name(&self) -> &'static str {
        self.opcode().map_or("no-op", Opcode::name)
    }

    /// Append the packet form of this command (unframed) to `dst`.
    ///
    /// `NoOp` has no wire form and writes nothing.
    pub fn encode(&self, dst: &mut BytesMut) {
        let Some(opcode) = self.opcode() else {
            return;
        };
        dst.put_u8(opcode.byte());

        match self {
            Command::DrawRectangle { pos, size, color } => {
                dst.put_slice(&pos.to_le());
                dst.put_slice(&size.to_le());
                dst.put_slice(&color.to_bytes());
            }
            Command::DrawCharacter { code, pos, fg, bg } => {
                dst.put_u8(*code);
                dst.put_slice(&pos.to_le());
                dst.put_slice(&fg.to_bytes());
                dst.put_slice(&bg.to_bytes());
            }
            Command::DrawOscilloscopeWaveform { color, samples } => {
                dst.put_slice(&color.to_bytes());
                dst.put_slice(samples);
            }
            Command::JoypadKeyState { mask } => {
                dst.put_u8(mask.bits());
                // Trailing pad byte, always zero.
                dst.put_u8(0);
            }
            Command::NoOp => {}
        }
    }
}

/// Configuration for command decoding.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Number of waveform samples in a populated waveform packet.
    pub screen_width: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
        }
    }
}

/// Decode a packet using the default screen width.
pub fn decode(packet: &[u8]) -> Result<Command> {
    decode_with(packet, &CommandConfig::default())
}

/// Decode a packet into a command.
///
/// Pure and total: every input yields exactly one command or one error.
pub fn decode_with(packet: &[u8], config: &CommandConfig) -> Result<Command> {
    let Some(&first) = packet.first() else {
        return Err(CommandError::EmptyPacket);
    };
    let opcode = Opcode::from_byte(first).ok_or(CommandError::UnknownOpcode { opcode: first })?;

    match opcode {
        Opcode::DrawRectangle => {
            let [_, x0, x1, y0, y1, w0, w1, h0, h1, r, g, b] =
                *exact::<DRAW_PACKET_LEN>(opcode, packet)?;
            Ok(Command::DrawRectangle {
                pos: Position::from_le(&[x0, x1, y0, y1]),
                size: Size::from_le(&[w0, w1, h0, h1]),
                color: Color::new(r, g, b),
            })
        }
        Opcode::DrawCharacter => {
            let [_, code, x0, x1, y0, y1, fr, fg, fb, br, bg, bb] =
                *exact::<DRAW_PACKET_LEN>(opcode, packet)?;
            Ok(Command::DrawCharacter {
                code,
                pos: Position::from_le(&[x0, x1, y0, y1]),
                fg: Color::new(fr, fg, fb),
                bg: Color::new(br, bg, bb),
            })
        }
        Opcode::DrawOscilloscopeWaveform => {
            if packet.len() < WAVEFORM_HEADER_LEN {
                return Err(length_error(opcode, WAVEFORM_HEADER_LEN, packet));
            }
            let samples = &packet[WAVEFORM_HEADER_LEN..];
            if !samples.is_empty() && samples.len() != config.screen_width {
                return Err(length_error(
                    opcode,
                    WAVEFORM_HEADER_LEN + config.screen_width,
                    packet,
                ));
            }
            Ok(Command::DrawOscilloscopeWaveform {
                color: Color::new(packet[1], packet[2], packet[3]),
                samples: Bytes::copy_from_slice(samples),
            })
        }
        Opcode::JoypadKeyState => {
            let [_, mask, _] = *exact::<JOYPAD_PACKET_LEN>(opcode, packet)?;
            Ok(Command::JoypadKeyState {
                mask: JoypadKeys::from_bits(mask),
            })
        }
    }
}

fn exact<const N: usize>(opcode: Opcode, packet: &[u8]) -> Result<&[u8; N]> {
    packet
        .try_into()
        .map_err(|_| length_error(opcode, N, packet))
}

fn length_error(command: Opcode, expected: usize, packet: &[u8]) -> CommandError {
    CommandError::Length {
        command,
        expected,
        actual: packet.len(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const RECT: [u8; 12] = [
        0xFE, 0x0A, 0x00, 0x14, 0x00, 0x05, 0x00, 0x06, 0x00, 0xFF, 0x00, 0x00,
    ];

    #[test]
    fn rectangle_decodes() {
        assert_eq!(
            decode(&RECT).unwrap(),
            Command::DrawRectangle {
                pos: Position::new(10, 20),
                size: Size::new(5, 6),
                color: Color::new(255, 0, 0),
            }
        );
    }

    #[test]
    fn rectangle_wrong_length() {
        let mut long = RECT.to_vec();
        long.push(0x00);
        for packet in [&RECT[..11], &long[..]] {
            assert_eq!(
                decode(packet).unwrap_err(),
                CommandError::Length {
                    command: Opcode::DrawRectangle,
                    expected: 12,
                    actual: packet.len(),
                }
            );
        }
    }

    #[test]
    fn rectangle_negative_position() {
        let packet = [
            0xFE, 0xF6, 0xFF, 0x00, 0x00, 0x40, 0x01, 0xF0, 0x00, 0x01, 0x02, 0x03,
        ];
        assert_eq!(
            decode(&packet).unwrap(),
            Command::DrawRectangle {
                pos: Position::new(-10, 0),
                size: Size::new(320, 240),
                color: Color::new(1, 2, 3),
            }
        );
    }

    #[test]
    fn character_decodes() {
        let packet = [
            0xFD, b'A', 0x08, 0x00, 0x10, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x20,
        ];
        assert_eq!(
            decode(&packet).unwrap(),
            Command::DrawCharacter {
                code: b'A',
                pos: Position::new(8, 16),
                fg: Color::new(255, 255, 255),
                bg: Color::new(0, 0, 32),
            }
        );
    }

    #[test]
    fn character_wrong_length() {
        let err = decode(&[0xFD, b'A', 0x00]).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Length {
                command: Opcode::DrawCharacter,
                expected: 12,
                actual: 3
            }
        ));
    }

    #[test]
    fn waveform_off() {
        assert_eq!(
            decode(&[0xFC, 0x10, 0x20, 0x30]).unwrap(),
            Command::DrawOscilloscopeWaveform {
                color: Color::new(0x10, 0x20, 0x30),
                samples: Bytes::new(),
            }
        );
    }

    #[test]
    fn waveform_populated() {
        let mut packet = vec![0xFC, 0x00, 0xFF, 0x00];
        packet.extend((0..SCREEN_WIDTH).map(|i| (i % 256) as u8));

        match decode(&packet).unwrap() {
            Command::DrawOscilloscopeWaveform { color, samples } => {
                assert_eq!(color, Color::new(0, 255, 0));
                assert_eq!(samples.len(), SCREEN_WIDTH);
                assert_eq!(samples.as_ref(), &packet[4..]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn waveform_wrong_trailing_length() {
        for trailing in [1, SCREEN_WIDTH - 1, SCREEN_WIDTH + 1] {
            let mut packet = vec![0xFC, 0x00, 0x00, 0x00];
            packet.resize(4 + trailing, 0x7F);
            assert_eq!(
                decode(&packet).unwrap_err(),
                CommandError::Length {
                    command: Opcode::DrawOscilloscopeWaveform,
                    expected: 4 + SCREEN_WIDTH,
                    actual: 4 + trailing,
                }
            );
        }
    }

    #[test]
    fn waveform_too_short() {
        assert_eq!(
            decode(&[0xFC, 0x00]).unwrap_err(),
            CommandError::Length {
                command: Opcode::DrawOscilloscopeWaveform,
                expected: 4,
                actual: 2,
            }
        );
    }

    #[test]
    fn waveform_honours_configured_width() {
        let config = CommandConfig { screen_width: 8 };
        let mut packet = vec![0xFC, 0x01, 0x02, 0x03];
        packet.extend([0u8; 8]);
        assert!(decode_with(&packet, &config).is_ok());
        assert!(decode(&packet).is_err());
    }

    #[test]
    fn joypad_decodes() {
        assert_eq!(
            decode(&[0xFB, 0x01, 0x00]).unwrap(),
            Command::JoypadKeyState {
                mask: JoypadKeys::EDIT
            }
        );
    }

    #[test]
    fn joypad_wrong_length() {
        assert_eq!(
            decode(&[0xFB, 0x01]).unwrap_err(),
            CommandError::Length {
                command: Opcode::JoypadKeyState,
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(
            decode(&[0xAA]).unwrap_err(),
            CommandError::UnknownOpcode { opcode: 0xAA }
        );
    }

    #[test]
    fn empty_packet() {
        assert_eq!(decode(&[]).unwrap_err(), CommandError::EmptyPacket);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            CommandError::UnknownOpcode { opcode: 0xAA }.to_string(),
            "unknown opcode 0xAA"
        );
        assert_eq!(
            decode(&[0xFB]).unwrap_err().to_string(),
            "invalid joypad key state packet: expected 3 bytes, got 1"
        );
    }

    #[test]
    fn encode_matches_wire_layout() {
        let mut buf = BytesMut::new();
        decode(&RECT).unwrap().encode(&mut buf);
        assert_eq!(buf.as_ref(), &RECT);

        buf.clear();
        Command::NoOp.encode(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn names_and_opcodes() {
        assert_eq!(Command::NoOp.name(), "no-op");
        assert_eq!(Command::NoOp.opcode(), None);
        assert_eq!(Opcode::from_byte(0xFC), Some(Opcode::DrawOscilloscopeWaveform));
        assert_eq!(Opcode::JoypadKeyState.byte(), 0xFB);
        assert_eq!(Opcode::from_byte(0xFA), None);
    }

    #[test]
    fn decodes_packets_from_the_packetizer() {
        let mut wire = BytesMut::new();
        m8link_frame::encode_packet(&RECT, &mut wire);
        m8link_frame::encode_packet(&[0xFB, 0xC0, 0x00], &mut wire);

        let mut state = m8link_frame::DecodeState::new();
        let packets = m8link_frame::feed(&wire, &mut state).unwrap();
        let commands: Vec<Command> = packets.iter().map(|p| decode(p).unwrap()).collect();

        assert_eq!(commands[0].opcode(), Some(Opcode::DrawRectangle));
        assert_eq!(
            commands[1],
            Command::JoypadKeyState {
                mask: JoypadKeys::LEFT | JoypadKeys::UP
            }
        );
    }

    proptest! {
        #[test]
        fn decoder_is_total(packet in prop::collection::vec(any::<u8>(), 0..400)) {
            match decode(&packet) {
                Ok(command) => {
                    let mut buf = BytesMut::new();
                    command.encode(&mut buf);
                    prop_assert_eq!(buf.len(), packet.len());
                    // The joypad pad byte is not part of the command.
                    let compared = match command {
                        Command::JoypadKeyState { .. } => 2,
                        _ => packet.len(),
                    };
                    prop_assert_eq!(&buf[..compared], &packet[..compared]);
                }
                Err(CommandError::EmptyPacket) => prop_assert!(packet.is_empty()),
                Err(CommandError::UnknownOpcode { opcode }) => {
                    prop_assert_eq!(opcode, packet[0]);
                    prop_assert!(Opcode::from_byte(opcode).is_none());
                }
                Err(CommandError::Length { actual, .. }) => prop_assert_eq!(actual, packet.len()),
            }
        }
    }
}
