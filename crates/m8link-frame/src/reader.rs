use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use bytes::Bytes;
use tracing::trace;

use crate::error::{FramingError, Result};
use crate::packetizer::{feed_frames, DecodeState, FrameResult, Packet};

/// Default size of a single transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4 * 1024;

/// Configuration for chunked reads.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Maximum number of bytes requested per transport read.
    pub read_chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// Reads raw chunks from any `Read` stream.
///
/// Chunk boundaries are whatever the transport delivers and carry no
/// protocol meaning.
pub struct ChunkReader<T> {
    inner: T,
    buf: Vec<u8>,
}

impl<T: Read> ChunkReader<T> {
    /// Create a chunk reader with the default read size.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a chunk reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            inner,
            buf: vec![0u8; config.read_chunk_size.max(1)],
        }
    }

    /// Read the next raw chunk (blocking).
    ///
    /// Returns `Err(FramingError::ConnectionClosed)` when EOF is reached.
    pub fn read_chunk(&mut self) -> Result<Bytes> {
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => return Err(FramingError::ConnectionClosed),
                Ok(n) => {
                    trace!(bytes = n, "read chunk");
                    return Ok(Bytes::copy_from_slice(&self.buf[..n]));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FramingError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Reads complete packets from any `Read` stream.
///
/// Handles partial reads and split escapes internally. Callers always get
/// whole packets, one at a time, in stream order.
pub struct PacketReader<T> {
    chunks: ChunkReader<T>,
    state: DecodeState,
    ready: VecDeque<FrameResult>,
}

impl<T: Read> PacketReader<T> {
    /// Create a packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a packet reader with explicit configuration.
    pub fn with_config(inner: T, config: ReaderConfig) -> Self {
        Self {
            chunks: ChunkReader::with_config(inner, config),
            state: DecodeState::new(),
            ready: VecDeque::new(),
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// A corrupt frame is returned as `Err(FramingError::BadEscape)`; the
    /// reader has already resynchronized, so the next call continues with
    /// the following frame. EOF yields `Err(FramingError::ConnectionClosed)`
    /// and any incomplete packet is dropped.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return frame;
            }

            let chunk = match self.chunks.read_chunk() {
                Ok(chunk) => chunk,
                Err(err) => {
                    self.state.reset();
                    return Err(err);
                }
            };
            self.ready.extend(feed_frames(&chunk, &mut self.state));
        }
    }

    /// Packetizer state carried between reads.
    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        self.chunks.get_ref()
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.chunks.into_inner()
    }
}
