use m8link_command::CommandError;
use m8link_frame::FramingError;

/// A frame that could not be turned into a command.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame was destroyed by a framing violation.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// The packet was framed correctly but is not a valid command.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] m8link_transport::TransportError),

    /// Reading raw chunks failed.
    #[error("read error: {0}")]
    Read(#[from] FramingError),

    /// Writing a control message failed.
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),

    /// Strict mode: a frame failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The device closed the stream.
    #[error("device disconnected")]
    Disconnected,

    /// The renderer rejected a command.
    #[error("render error: {0}")]
    Render(Box<dyn std::error::Error + Send + Sync>),

    /// The decode worker thread could not be started.
    #[error("failed to start decode worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The decode worker panicked.
    #[error("decode worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, SessionError>;
