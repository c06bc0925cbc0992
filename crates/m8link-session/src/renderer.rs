//! The display abstraction decoded commands are delivered to.

use std::convert::Infallible;

use bytes::Bytes;
use m8link_command::{Color, Command, JoypadKeys, Position, Size};

/// Something that can show what the device draws.
///
/// Implementations receive commands one at a time, in stream order.
pub trait Renderer {
    type Error;

    fn draw_rectangle(
        &mut self,
        pos: Position,
        size: Size,
        color: Color,
    ) -> Result<(), Self::Error>;

    fn draw_character(
        &mut self,
        code: u8,
        pos: Position,
        fg: Color,
        bg: Color,
    ) -> Result<(), Self::Error>;

    /// `samples` is empty when the waveform display is turned off.
    fn draw_oscilloscope_waveform(
        &mut self,
        color: Color,
        samples: &[u8],
    ) -> Result<(), Self::Error>;

    fn set_joypad_state(&mut self, mask: JoypadKeys) -> Result<(), Self::Error>;
}

/// Dispatch one command to the matching renderer operation.
///
/// `NoOp` is accepted and does nothing.
pub fn apply<R: Renderer + ?Sized>(renderer: &mut R, command: &Command) -> Result<(), R::Error> {
    match command {
        Command::DrawRectangle { pos, size, color } => renderer.draw_rectangle(*pos, *size, *color),
        Command::DrawCharacter { code, pos, fg, bg } => {
            renderer.draw_character(*code, *pos, *fg, *bg)
        }
        Command::DrawOscilloscopeWaveform { color, samples } => {
            renderer.draw_oscilloscope_waveform(*color, samples)
        }
        Command::JoypadKeyState { mask } => renderer.set_joypad_state(*mask),
        Command::NoOp => Ok(()),
    }
}

/// One renderer call as seen by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Rectangle {
        pos: Position,
        size: Size,
        color: Color,
    },
    Character {
        code: u8,
        pos: Position,
        fg: Color,
        bg: Color,
    },
    Waveform {
        color: Color,
        samples: Bytes,
    },
    Joypad(JoypadKeys),
}

/// Records every call in order. Used by tests and capture replays.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Vec<RenderCall>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<RenderCall> {
        self.calls
    }
}

impl Renderer for RecordingRenderer {
    type Error = Infallible;

    fn draw_rectangle(&mut self, pos: Position, size: Size, color: Color) -> Result<(), Infallible> {
        self.calls.push(RenderCall::Rectangle { pos, size, color });
        Ok(())
    }

    fn draw_character(
        &mut self,
        code: u8,
        pos: Position,
        fg: Color,
        bg: Color,
    ) -> Result<(), Infallible> {
        self.calls.push(RenderCall::Character { code, pos, fg, bg });
        Ok(())
    }

    fn draw_oscilloscope_waveform(
        &mut self,
        color: Color,
        samples: &[u8],
    ) -> Result<(), Infallible> {
        self.calls.push(RenderCall::Waveform {
            color,
            samples: Bytes::copy_from_slice(samples),
        });
        Ok(())
    }

    fn set_joypad_state(&mut self, mask: JoypadKeys) -> Result<(), Infallible> {
        self.calls.push(RenderCall::Joypad(mask));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_dispatches_each_variant() {
        let mut renderer = RecordingRenderer::new();
        let commands = [
            Command::DrawRectangle {
                pos: Position::new(1, 2),
                size: Size::new(3, 4),
                color: Color::new(5, 6, 7),
            },
            Command::NoOp,
            Command::DrawCharacter {
                code: b'x',
                pos: Position::new(0, 0),
                fg: Color::new(255, 255, 255),
                bg: Color::BLACK,
            },
            Command::DrawOscilloscopeWaveform {
                color: Color::new(0, 255, 0),
                samples: Bytes::new(),
            },
            Command::JoypadKeyState {
                mask: JoypadKeys::LEFT,
            },
        ];
        for command in &commands {
            apply(&mut renderer, command).unwrap();
        }

        assert_eq!(
            renderer.into_calls(),
            vec![
                RenderCall::Rectangle {
                    pos: Position::new(1, 2),
                    size: Size::new(3, 4),
                    color: Color::new(5, 6, 7),
                },
                RenderCall::Character {
                    code: b'x',
                    pos: Position::new(0, 0),
                    fg: Color::new(255, 255, 255),
                    bg: Color::BLACK,
                },
                RenderCall::Waveform {
                    color: Color::new(0, 255, 0),
                    samples: Bytes::new(),
                },
                RenderCall::Joypad(JoypadKeys::LEFT),
            ]
        );
    }

    struct Failing;

    impl Renderer for Failing {
        type Error = &'static str;

        fn draw_rectangle(&mut self, _: Position, _: Size, _: Color) -> Result<(), Self::Error> {
            Err("no surface")
        }

        fn draw_character(
            &mut self,
            _: u8,
            _: Position,
            _: Color,
            _: Color,
        ) -> Result<(), Self::Error> {
            Ok(())
        }

        fn draw_oscilloscope_waveform(&mut self, _: Color, _: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_joypad_state(&mut self, _: JoypadKeys) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn renderer_errors_propagate() {
        let mut renderer = Failing;
        let rect = Command::DrawRectangle {
            pos: Position::default(),
            size: Size::default(),
            color: Color::BLACK,
        };
        assert_eq!(apply(&mut renderer, &rect), Err("no surface"));
        assert_eq!(apply(&mut renderer, &Command::NoOp), Ok(()));
    }

    #[test]
    fn apply_through_trait_object() {
        let mut recording = RecordingRenderer::new();
        let renderer: &mut dyn Renderer<Error = Infallible> = &mut recording;
        apply(
            renderer,
            &Command::JoypadKeyState {
                mask: JoypadKeys::START,
            },
        )
        .unwrap();
        assert_eq!(recording.calls(), &[RenderCall::Joypad(JoypadKeys::START)]);
    }
}
