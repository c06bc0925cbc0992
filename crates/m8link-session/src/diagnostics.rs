//! Where dropped frames are reported in resilient mode.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use m8link_command::Command;
use tracing::{debug, warn};

use crate::error::DecodeError;

/// A frame replaced by `NoOp`, with the bytes it carried and why it failed.
///
/// For command errors `raw` is the whole packet. For framing violations it
/// holds only the unescaped bytes collected before the violation: the
/// packetizer reports the frame as soon as it breaks and then skips the
/// rest of it up to the next `END`, so those trailing bytes never reach
/// the sink.
#[derive(Debug)]
pub struct DroppedFrame {
    pub raw: Bytes,
    pub error: DecodeError,
}

/// Receives decode diagnostics.
///
/// Only [`dropped`](DiagnosticsSink::dropped) is required; the per-chunk and
/// per-command hooks exist for tracing at high verbosity.
pub trait DiagnosticsSink: Send {
    fn dropped(&mut self, frame: &DroppedFrame);

    fn chunk(&mut self, _chunk: &[u8]) {}

    fn decoded(&mut self, _command: &Command) {}
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for Box<S> {
    fn dropped(&mut self, frame: &DroppedFrame) {
        (**self).dropped(frame)
    }

    fn chunk(&mut self, chunk: &[u8]) {
        (**self).chunk(chunk)
    }

    fn decoded(&mut self, command: &Command) {
        (**self).decoded(command)
    }
}

/// How much the [`TracingSink`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Nothing.
    Quiet,
    /// One warning per dropped frame.
    #[default]
    Normal,
    /// Dropped frames plus every raw chunk and decoded command.
    Verbose,
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            other => Err(format!("unknown diagnostics verbosity: {other}")),
        }
    }
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    verbosity: Verbosity,
}

impl TracingSink {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

impl DiagnosticsSink for TracingSink {
    fn dropped(&mut self, frame: &DroppedFrame) {
        if self.verbosity != Verbosity::Quiet {
            warn!(
                raw = %hex(&frame.raw),
                len = frame.raw.len(),
                error = %frame.error,
                "dropped frame"
            );
        }
    }

    fn chunk(&mut self, chunk: &[u8]) {
        if self.verbosity == Verbosity::Verbose {
            debug!(len = chunk.len(), bytes = %hex(chunk), "read chunk");
        }
    }

    fn decoded(&mut self, command: &Command) {
        if self.verbosity == Verbosity::Verbose {
            debug!(?command, "decoded command");
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn dropped(&mut self, _frame: &DroppedFrame) {}
}

/// Keeps dropped frames in memory. Clones share the same record list, so a
/// clone kept by the caller observes frames dropped by a decoder that owns
/// another clone, even on a worker thread.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    records: Arc<Mutex<Vec<DroppedFrame>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return every record collected so far.
    pub fn take(&self) -> Vec<DroppedFrame> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DroppedFrame>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticsSink for CollectingSink {
    fn dropped(&mut self, frame: &DroppedFrame) {
        let copy = DroppedFrame {
            raw: frame.raw.clone(),
            error: copy_error(&frame.error),
        };
        self.lock().push(copy);
    }
}

fn copy_error(error: &DecodeError) -> DecodeError {
    use m8link_frame::FramingError;

    match error {
        DecodeError::Command(err) => DecodeError::Command(err.clone()),
        DecodeError::Framing(FramingError::BadEscape { byte, discarded }) => {
            DecodeError::Framing(FramingError::BadEscape {
                byte: *byte,
                discarded: discarded.clone(),
            })
        }
        DecodeError::Framing(FramingError::Oversized { limit, discarded }) => {
            DecodeError::Framing(FramingError::Oversized {
                limit: *limit,
                discarded: discarded.clone(),
            })
        }
        DecodeError::Framing(FramingError::ConnectionClosed) => {
            DecodeError::Framing(FramingError::ConnectionClosed)
        }
        DecodeError::Framing(FramingError::Io(err)) => DecodeError::Framing(FramingError::Io(
            std::io::Error::new(err.kind(), err.to_string()),
        )),
    }
}

/// Lowercase hex with single spaces, as shown in diagnostics.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
