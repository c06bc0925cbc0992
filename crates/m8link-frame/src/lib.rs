//! SLIP framing for the m8link byte stream.
//!
//! The device streams display commands as SLIP frames:
//! - `END` (0xC0) terminates a packet
//! - `ESC` (0xDB) introduces a two-byte escape
//! - `ESC 0xDC` is a literal `END`, `ESC 0xDD` a literal `ESC`
//!
//! Transport reads split the stream at arbitrary points. The packetizer
//! carries its partial packet and pending escape in an explicit
//! [`DecodeState`], so a packet (or an escape pair) split across reads
//! decodes exactly as if it had arrived in one piece.

#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod packetizer;
pub mod reader;
pub mod slip;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::SlipCodec;
pub use error::{FramingError, Result};
pub use packetizer::{
    feed, feed_frames, DecodeState, FrameResult, Frames, Packet, DEFAULT_MAX_PACKET_LEN,
};
pub use reader::{ChunkReader, PacketReader, ReaderConfig, DEFAULT_READ_CHUNK_SIZE};
pub use slip::{encode_packet, unescape, END, ESC, ESC_END, ESC_ESC};
pub use writer::PacketWriter;
