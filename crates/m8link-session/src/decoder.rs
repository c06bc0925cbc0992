use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use m8link_command::{decode_with, Command, CommandConfig};
use m8link_frame::{feed_frames, DecodeState, FrameResult, FramingError};

use crate::diagnostics::{DiagnosticsSink, DroppedFrame, TracingSink};
use crate::error::DecodeError;

/// How a stream decoder treats a frame that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Substitute `NoOp`, report the frame, keep going.
    #[default]
    Resilient,
    /// Return the first error to the caller.
    Strict,
}

impl fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeMode::Resilient => f.write_str("resilient"),
            DecodeMode::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for DecodeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resilient" => Ok(Self::Resilient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown decode mode: {other}")),
        }
    }
}

/// Frame counters kept by a resilient decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeStats {
    /// Frames turned into real commands.
    pub decoded: u64,
    /// Frames replaced by `NoOp`.
    pub dropped: u64,
}

/// Packetizer plus command decoder that never fails.
///
/// Every frame yields exactly one command; a frame that fails to decode
/// yields `NoOp` and is reported to the sink.
pub struct ResilientDecoder<S = TracingSink> {
    config: CommandConfig,
    sink: S,
    stats: DecodeStats,
}

impl<S: DiagnosticsSink> ResilientDecoder<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(CommandConfig::default(), sink)
    }

    pub fn with_config(config: CommandConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            stats: DecodeStats::default(),
        }
    }

    /// Decode one raw chunk.
    pub fn next(&mut self, chunk: &[u8], state: &mut DecodeState) -> Vec<Command> {
        self.sink.chunk(chunk);
        feed_frames(chunk, state)
            .into_iter()
            .map(|frame| self.decode_frame(frame))
            .collect()
    }

    fn decode_frame(&mut self, frame: FrameResult) -> Command {
        let (raw, error) = match frame {
            Ok(packet) => match decode_with(&packet, &self.config) {
                Ok(command) => {
                    self.stats.decoded += 1;
                    self.sink.decoded(&command);
                    return command;
                }
                Err(err) => (packet.into_bytes(), DecodeError::Command(err)),
            },
            Err(err) => {
                let raw = match &err {
                    FramingError::BadEscape { discarded, .. }
                    | FramingError::Oversized { discarded, .. } => discarded.clone(),
                    _ => Bytes::new(),
                };
                (raw, DecodeError::Framing(err))
            }
        };

        self.stats.dropped += 1;
        self.sink.dropped(&DroppedFrame { raw, error });
        Command::NoOp
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Packetizer plus command decoder that stops at the first bad frame.
#[derive(Debug, Clone, Default)]
pub struct StrictDecoder {
    config: CommandConfig,
}

impl StrictDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CommandConfig) -> Self {
        Self { config }
    }

    /// Decode one raw chunk, stopping at the first bad frame.
    ///
    /// Commands decoded before the bad frame are returned and its error is
    /// kept in `state` for the next call; a bad frame at the start is
    /// returned as the error directly. Nothing after the bad frame is
    /// consumed. While [`DecodeState::has_buffered`] is true, call again
    /// (with an empty chunk if no new input is at hand) to continue with
    /// the following frame.
    pub fn next(
        &self,
        chunk: &[u8],
        state: &mut DecodeState,
    ) -> std::result::Result<Vec<Command>, DecodeError> {
        let mut commands = Vec::new();
        let mut frames = state.frames(chunk);
        while let Some(frame) = frames.next() {
            let error = match frame {
                Ok(packet) => match decode_with(&packet, &self.config) {
                    Ok(command) => {
                        commands.push(command);
                        continue;
                    }
                    Err(_) if !commands.is_empty() => {
                        frames.push_back(Ok(packet));
                        break;
                    }
                    Err(err) => DecodeError::Command(err),
                },
                Err(err) if !commands.is_empty() => {
                    frames.push_back(Err(err));
                    break;
                }
                Err(err) => DecodeError::Framing(err),
            };
            return Err(error);
        }
        Ok(commands)
    }
}

enum Inner {
    Resilient(ResilientDecoder<Box<dyn DiagnosticsSink>>),
    Strict(StrictDecoder),
}

/// A stream decoder whose mode is fixed when it is built.
///
/// This is the type sessions and pipelines hold.
pub struct StreamDecoder {
    inner: Inner,
}

impl StreamDecoder {
    pub fn new(mode: DecodeMode, config: CommandConfig, sink: Box<dyn DiagnosticsSink>) -> Self {
        let inner = match mode {
            DecodeMode::Resilient => Inner::Resilient(ResilientDecoder::with_config(config, sink)),
            DecodeMode::Strict => Inner::Strict(StrictDecoder::with_config(config)),
        };
        Self { inner }
    }

    /// Resilient decoder with the default screen width.
    pub fn resilient(sink: impl DiagnosticsSink + 'static) -> Self {
        Self::new(DecodeMode::Resilient, CommandConfig::default(), Box::new(sink))
    }

    /// Strict decoder with the default screen width.
    pub fn strict() -> Self {
        Self {
            inner: Inner::Strict(StrictDecoder::new()),
        }
    }

    pub fn mode(&self) -> DecodeMode {
        match self.inner {
            Inner::Resilient(_) => DecodeMode::Resilient,
            Inner::Strict(_) => DecodeMode::Strict,
        }
    }

    /// Decode one raw chunk. Never fails in resilient mode.
    pub fn next(
        &mut self,
        chunk: &[u8],
        state: &mut DecodeState,
    ) -> std::result::Result<Vec<Command>, DecodeError> {
        match &mut self.inner {
            Inner::Resilient(decoder) => Ok(decoder.next(chunk, state)),
            Inner::Strict(decoder) => decoder.next(chunk, state),
        }
    }

    /// Frame counters; strict decoders do not count.
    pub fn stats(&self) -> DecodeStats {
        match &self.inner {
            Inner::Resilient(decoder) => decoder.stats(),
            Inner::Strict(_) => DecodeStats::default(),
        }
    }
}

impl fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("mode", &self.mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use m8link_command::{Color, CommandError, JoypadKeys, Position, Size};
    use m8link_frame::{encode_packet, END, ESC};
    use proptest::prelude::*;

    use super::*;
    use crate::diagnostics::{CollectingSink, NullSink};

    const RECT: [u8; 12] = [
        0xFE, 0x0A, 0x00, 0x14, 0x00, 0x05, 0x00, 0x06, 0x00, 0xFF, 0x00, 0x00,
    ];
    const JOYPAD: [u8; 3] = [0xFB, 0x01, 0x00];

    fn wire(packets: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for packet in packets {
            encode_packet(packet, &mut buf);
        }
        buf.to_vec()
    }

    fn rect() -> Command {
        Command::DrawRectangle {
            pos: Position::new(10, 20),
            size: Size::new(5, 6),
            color: Color::new(255, 0, 0),
        }
    }

    fn joypad() -> Command {
        Command::JoypadKeyState {
            mask: JoypadKeys::EDIT,
        }
    }

    #[test]
    fn resilient_substitutes_noop_and_reports() {
        let sink = CollectingSink::new();
        let mut decoder = ResilientDecoder::new(sink.clone());
        let mut state = DecodeState::new();

        let commands = decoder.next(&wire(&[&RECT, &[0xAA], &JOYPAD]), &mut state);

        assert_eq!(commands, vec![rect(), Command::NoOp, joypad()]);
        let dropped = sink.take();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].raw.as_ref(), &[0xAA]);
        assert!(matches!(
            dropped[0].error,
            DecodeError::Command(CommandError::UnknownOpcode { opcode: 0xAA })
        ));
        assert_eq!(
            decoder.stats(),
            DecodeStats {
                decoded: 2,
                dropped: 1
            }
        );
    }

    #[test]
    fn resilient_absorbs_framing_errors() {
        let sink = CollectingSink::new();
        let mut decoder = ResilientDecoder::new(sink.clone());
        let mut state = DecodeState::new();

        let mut bytes = vec![0xFE, 0x01, ESC, 0x00, 0x02, END];
        bytes.extend(wire(&[&JOYPAD]));
        let commands = decoder.next(&bytes, &mut state);

        assert_eq!(commands, vec![Command::NoOp, joypad()]);
        let dropped = sink.take();
        assert_eq!(dropped[0].raw.as_ref(), &[0xFE, 0x01]);
        assert!(matches!(dropped[0].error, DecodeError::Framing(_)));
    }

    #[test]
    fn framing_diagnostic_holds_only_bytes_before_the_violation() {
        let sink = CollectingSink::new();
        let mut decoder = ResilientDecoder::new(sink.clone());
        let mut state = DecodeState::new();

        let first = decoder.next(&[0xFD, 0x41, ESC, 0x10, 0x20], &mut state);
        let second = decoder.next(&[0x30, END], &mut state);

        assert_eq!(first, vec![Command::NoOp]);
        assert!(second.is_empty());
        let dropped = sink.take();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].raw.as_ref(), &[0xFD, 0x41]);
    }

    #[test]
    fn resilient_reports_oversized_frames() {
        let sink = CollectingSink::new();
        let mut decoder = ResilientDecoder::new(sink.clone());
        let mut state = DecodeState::with_max_packet_len(12);

        let mut bytes = vec![0xFC; 20];
        bytes.push(END);
        bytes.extend(wire(&[&JOYPAD]));
        let commands = decoder.next(&bytes, &mut state);

        assert_eq!(commands, vec![Command::NoOp, joypad()]);
        let dropped = sink.take();
        assert_eq!(dropped[0].raw.len(), 12);
        assert!(matches!(
            dropped[0].error,
            DecodeError::Framing(FramingError::Oversized { limit: 12, .. })
        ));
    }

    #[test]
    fn resilient_error_does_not_leak_into_next_call() {
        let mut decoder = ResilientDecoder::new(NullSink);
        let mut state = DecodeState::new();

        let first = decoder.next(&wire(&[&RECT[..11]]), &mut state);
        assert_eq!(first, vec![Command::NoOp]);

        let second = decoder.next(&wire(&[&RECT]), &mut state);
        assert_eq!(second, vec![rect()]);
    }

    #[test]
    fn strict_returns_first_error() {
        let decoder = StrictDecoder::new();
        let mut state = DecodeState::new();

        let err = decoder
            .next(&wire(&[&[0xFB, 0x01], &JOYPAD]), &mut state)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Command(CommandError::Length {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        assert!(state.has_buffered());

        let ok = decoder.next(&wire(&[&JOYPAD]), &mut state).unwrap();
        assert_eq!(ok, vec![joypad(), joypad()]);
        assert!(state.is_idle());
    }

    #[test]
    fn strict_keeps_good_frames_around_a_bad_one_in_the_same_chunk() {
        let decoder = StrictDecoder::new();
        let mut state = DecodeState::new();
        let bytes = wire(&[&RECT, &[0xAA], &JOYPAD]);

        assert_eq!(decoder.next(&bytes, &mut state).unwrap(), vec![rect()]);
        assert!(state.has_buffered());

        let err = decoder.next(&[], &mut state).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Command(CommandError::UnknownOpcode { opcode: 0xAA })
        ));

        assert_eq!(decoder.next(&[], &mut state).unwrap(), vec![joypad()]);
        assert!(state.is_idle());
    }

    #[test]
    fn strict_holds_framing_error_behind_good_frames() {
        let decoder = StrictDecoder::new();
        let mut state = DecodeState::new();
        let mut bytes = wire(&[&JOYPAD]);
        bytes.extend_from_slice(&[0x01, ESC, 0x01, END]);
        bytes.extend(wire(&[&RECT]));

        assert_eq!(decoder.next(&bytes, &mut state).unwrap(), vec![joypad()]);
        assert!(matches!(
            decoder.next(&[], &mut state),
            Err(DecodeError::Framing(FramingError::BadEscape { byte: 0x01, .. }))
        ));
        assert_eq!(decoder.next(&[], &mut state).unwrap(), vec![rect()]);
        assert!(!state.has_buffered());
    }

    #[test]
    fn strict_reports_framing_error() {
        let decoder = StrictDecoder::new();
        let mut state = DecodeState::new();
        let err = decoder.next(&[0x01, ESC, 0x01, END], &mut state).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Framing(FramingError::BadEscape { byte: 0x01, .. })
        ));
    }

    #[test]
    fn empty_chunk_yields_nothing() {
        let mut decoder = StreamDecoder::resilient(NullSink);
        let mut state = DecodeState::new();
        assert!(decoder.next(&[], &mut state).unwrap().is_empty());
        assert!(decoder.next(&[END, END, END], &mut state).unwrap().is_empty());
    }

    #[test]
    fn stream_decoder_mode_is_fixed_at_construction() {
        let mut strict = StreamDecoder::new(
            DecodeMode::Strict,
            CommandConfig::default(),
            Box::new(NullSink),
        );
        let mut resilient = StreamDecoder::resilient(NullSink);
        assert_eq!(strict.mode(), DecodeMode::Strict);
        assert_eq!(resilient.mode(), DecodeMode::Resilient);

        let bytes = wire(&[&[0xAA]]);
        assert!(strict.next(&bytes, &mut DecodeState::new()).is_err());
        assert_eq!(
            resilient.next(&bytes, &mut DecodeState::new()).unwrap(),
            vec![Command::NoOp]
        );
        assert_eq!(resilient.stats().dropped, 1);
        assert_eq!(strict.stats(), DecodeStats::default());
        assert!(format!("{strict:?}").contains("Strict"));
    }

    #[test]
    fn decode_mode_parses_and_displays() {
        assert_eq!("strict".parse::<DecodeMode>().unwrap(), DecodeMode::Strict);
        assert_eq!("Resilient".parse::<DecodeMode>().unwrap(), DecodeMode::Resilient);
        assert!("lenient".parse::<DecodeMode>().is_err());
        assert_eq!(DecodeMode::default().to_string(), "resilient");
    }

    #[test]
    fn configured_screen_width_applies() {
        let config = CommandConfig { screen_width: 4 };
        let mut decoder = ResilientDecoder::with_config(config, NullSink);
        let mut state = DecodeState::new();
        let commands = decoder.next(
            &wire(&[&[0xFC, 0x01, 0x02, 0x03, 0x10, 0x20, 0x30, 0x40]]),
            &mut state,
        );
        assert!(matches!(
            &commands[0],
            Command::DrawOscilloscopeWaveform { samples, .. } if samples.len() == 4
        ));
    }

    /// Feed chunks to a strict decoder, calling again while input is
    /// buffered, and collect every command and the number of errors.
    fn drain_strict(chunks: &[&[u8]]) -> (Vec<Command>, usize) {
        let decoder = StrictDecoder::new();
        let mut state = DecodeState::new();
        let mut commands = Vec::new();
        let mut errors = 0;
        for chunk in chunks {
            let mut input: &[u8] = chunk;
            loop {
                match decoder.next(input, &mut state) {
                    Ok(decoded) => commands.extend(decoded),
                    Err(_) => errors += 1,
                }
                if !state.has_buffered() {
                    break;
                }
                input = &[];
            }
        }
        (commands, errors)
    }

    fn arb_packet() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            Just(RECT.to_vec()),
            Just(JOYPAD.to_vec()),
            Just(vec![0xFC, 0x00, 0x00, 0x00]),
            prop::collection::vec(any::<u8>(), 1..16),
        ]
    }

    proptest! {
        #[test]
        fn one_command_per_frame_regardless_of_chunking(
            packets in prop::collection::vec(arb_packet(), 0..12),
            cut in any::<prop::sample::Index>(),
        ) {
            let refs: Vec<&[u8]> = packets.iter().map(Vec::as_slice).collect();
            let bytes = wire(&refs);

            let mut whole = ResilientDecoder::new(NullSink);
            let expected = whole.next(&bytes, &mut DecodeState::new());
            prop_assert_eq!(expected.len(), packets.len());

            let at = cut.index(bytes.len() + 1);
            let mut split = ResilientDecoder::new(NullSink);
            let mut state = DecodeState::new();
            let mut got = split.next(&bytes[..at], &mut state);
            got.extend(split.next(&bytes[at..], &mut state));
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn strict_loses_no_good_frame(
            packets in prop::collection::vec(arb_packet(), 0..12),
            cut in any::<prop::sample::Index>(),
        ) {
            let refs: Vec<&[u8]> = packets.iter().map(Vec::as_slice).collect();
            let bytes = wire(&refs);

            let mut resilient = ResilientDecoder::new(NullSink);
            let expected: Vec<Command> = resilient
                .next(&bytes, &mut DecodeState::new())
                .into_iter()
                .filter(|command| *command != Command::NoOp)
                .collect();

            let at = cut.index(bytes.len() + 1);
            let (got, errors) = drain_strict(&[&bytes[..at], &bytes[at..]]);
            prop_assert_eq!(got, expected);
            prop_assert_eq!(errors as u64, resilient.stats().dropped);
        }
    }
}
