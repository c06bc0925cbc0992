use std::ops::Deref;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FramingError, Result};
use crate::slip::{unescape, END, ESC};

const INITIAL_PARTIAL_CAPACITY: usize = 512;

/// Default upper bound on one unescaped packet.
///
/// Comfortably above the largest display command, a full-width waveform.
pub const DEFAULT_MAX_PACKET_LEN: usize = 1024;

/// A complete, unescaped packet taken from between two delimiters.
///
/// Never empty: consecutive delimiters produce no packet at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(Bytes);

impl Packet {
    /// Wrap already-unescaped packet bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The packet bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the packet and return its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The outcome of one frame: a packet, or the framing violation that
/// destroyed it.
pub type FrameResult = Result<Packet>;

/// Packetizer state carried from one chunk to the next.
///
/// Owned by exactly one transport session. Dropping it discards any
/// in-progress packet, along with any frame or raw bytes a caller left
/// unconsumed.
#[derive(Debug)]
pub struct DecodeState {
    escape_pending: bool,
    discarding: bool,
    partial: BytesMut,
    max_packet_len: usize,
    held: Option<FrameResult>,
    backlog: BytesMut,
}

impl Default for DecodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeState {
    /// Create an idle state with [`DEFAULT_MAX_PACKET_LEN`].
    pub fn new() -> Self {
        Self::with_max_packet_len(DEFAULT_MAX_PACKET_LEN)
    }

    /// Create an idle state that rejects packets longer than `limit` bytes.
    pub fn with_max_packet_len(limit: usize) -> Self {
        Self {
            escape_pending: false,
            discarding: false,
            partial: BytesMut::with_capacity(INITIAL_PARTIAL_CAPACITY.min(limit)),
            max_packet_len: limit.max(1),
            held: None,
            backlog: BytesMut::new(),
        }
    }

    pub fn max_packet_len(&self) -> usize {
        self.max_packet_len
    }

    /// The last byte fed was an `ESC` still waiting for its partner.
    pub fn is_escape_pending(&self) -> bool {
        self.escape_pending
    }

    /// The rest of a corrupt frame is being skipped until the next `END`.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Bytes of the packet currently being assembled.
    pub fn partial(&self) -> &[u8] {
        &self.partial
    }

    /// A frame or raw bytes from an earlier chunk are waiting to be
    /// decoded. The next call can make progress without new input.
    pub fn has_buffered(&self) -> bool {
        self.held.is_some() || !self.backlog.is_empty()
    }

    /// No packet, escape, or resynchronization is in progress and nothing
    /// is buffered.
    pub fn is_idle(&self) -> bool {
        !self.escape_pending && !self.discarding && self.partial.is_empty() && !self.has_buffered()
    }

    /// Drop any in-progress packet and buffered input and return to idle.
    pub fn reset(&mut self) {
        self.escape_pending = false;
        self.discarding = false;
        self.partial.clear();
        self.held = None;
        self.backlog.clear();
    }

    /// Walk the frames completed by `chunk`, one at a time.
    ///
    /// Bytes left unread when the iterator is dropped stay in the state
    /// and are scanned first on the next call, so a caller may stop after
    /// any frame without losing the ones behind it.
    pub fn frames<'a>(&'a mut self, chunk: &'a [u8]) -> Frames<'a> {
        let backlog = std::mem::take(&mut self.backlog).freeze();
        Frames {
            state: self,
            backlog,
            chunk,
        }
    }

    fn step(&mut self, byte: u8) -> Option<FrameResult> {
        if self.escape_pending {
            self.escape_pending = false;
            return match unescape(byte) {
                Some(literal) => self.push(literal),
                None => {
                    // A raw END still delimits, so resync is immediate.
                    self.discarding = byte != END;
                    let discarded = self.partial.split().freeze();
                    Some(Err(FramingError::BadEscape { byte, discarded }))
                }
            };
        }

        if self.discarding {
            if byte == END {
                self.discarding = false;
            }
            return None;
        }

        match byte {
            ESC => {
                self.escape_pending = true;
                None
            }
            END if self.partial.is_empty() => None,
            END => Some(Ok(Packet(self.partial.split().freeze()))),
            _ => self.push(byte),
        }
    }

    fn push(&mut self, literal: u8) -> Option<FrameResult> {
        if self.partial.len() >= self.max_packet_len {
            self.discarding = true;
            let discarded = self.partial.split().freeze();
            return Some(Err(FramingError::Oversized {
                limit: self.max_packet_len,
                discarded,
            }));
        }
        self.partial.put_u8(literal);
        None
    }
}

/// Iterator over the frames of one chunk. See [`DecodeState::frames`].
#[derive(Debug)]
pub struct Frames<'a> {
    state: &'a mut DecodeState,
    backlog: Bytes,
    chunk: &'a [u8],
}

impl Frames<'_> {
    /// Return a frame to the state. It is yielded again before any other
    /// input, by this iterator or by the next call on the state.
    pub fn push_back(&mut self, frame: FrameResult) {
        self.state.held = Some(frame);
    }
}

impl Iterator for Frames<'_> {
    type Item = FrameResult;

    fn next(&mut self) -> Option<FrameResult> {
        if let Some(frame) = self.state.held.take() {
            return Some(frame);
        }
        while self.backlog.has_remaining() {
            let byte = self.backlog.get_u8();
            if let Some(frame) = self.state.step(byte) {
                return Some(frame);
            }
        }
        while let Some((&byte, rest)) = self.chunk.split_first() {
            self.chunk = rest;
            if let Some(frame) = self.state.step(byte) {
                return Some(frame);
            }
        }
        None
    }
}

impl Drop for Frames<'_> {
    fn drop(&mut self) {
        if self.backlog.is_empty() && self.chunk.is_empty() {
            return;
        }
        let mut rest = BytesMut::with_capacity(self.backlog.len() + self.chunk.len());
        rest.extend_from_slice(&self.backlog);
        rest.extend_from_slice(self.chunk);
        self.state.backlog = rest;
    }
}

/// Feed one raw chunk and collect every frame it completes, in order.
///
/// A framing violation costs only its own frame: it appears as an `Err`
/// entry and scanning continues with the bytes after it. Incomplete data at
/// the end of the chunk stays in `state` for the next call.
pub fn feed_frames(chunk: &[u8], state: &mut DecodeState) -> Vec<FrameResult> {
    state.frames(chunk).collect()
}

/// Feed one raw chunk and return the packets it completes, stopping at the
/// first framing violation.
///
/// Packets completed before the violation are returned and the violation
/// is kept for the next call. When the violation comes first it is
/// returned directly. Either way the bytes after it stay in `state`, so
/// calling again (with an empty chunk if nothing new has arrived) resumes
/// with the following frame. Use [`DecodeState::has_buffered`] to tell
/// whether such a call has work to do.
pub fn feed(chunk: &[u8], state: &mut DecodeState) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    let mut frames = state.frames(chunk);
    while let Some(frame) = frames.next() {
        match frame {
            Ok(packet) => packets.push(packet),
            Err(err) if packets.is_empty() => return Err(err),
            Err(err) => {
                frames.push_back(Err(err));
                break;
            }
        }
    }
    Ok(packets)
}
