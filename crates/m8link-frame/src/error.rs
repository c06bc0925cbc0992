use bytes::Bytes;

/// Errors that can occur while framing the device byte stream.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// `ESC` was followed by a byte other than `ESC_END` or `ESC_ESC`.
    ///
    /// `discarded` holds the bytes of the frame that were collected before
    /// the violation; the packetizer drops them and resynchronizes on the
    /// next `END`.
    #[error("invalid escape sequence 0xDB 0x{byte:02X} after {} frame bytes", discarded.len())]
    BadEscape { byte: u8, discarded: Bytes },

    /// A frame grew past the packet length limit before its `END`.
    ///
    /// `discarded` holds the bytes kept up to the limit; the rest of the
    /// frame is skipped like after a bad escape.
    #[error("frame exceeds {limit} bytes")]
    Oversized { limit: usize, discarded: Bytes },

    /// An I/O error occurred while reading raw chunks.
    #[error("framing I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended. Any partial packet is discarded.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FramingError>;
