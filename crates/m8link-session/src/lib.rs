//! Device session management for m8link.
//!
//! This is the "just works" layer. It composes the SLIP packetizer and the
//! command decoder into a stream decoder that either absorbs bad frames
//! (resilient mode) or reports the first one (strict mode), and delivers
//! decoded commands to a renderer in exactly the order the device sent
//! them.

#[cfg(feature = "async")]
pub mod async_pipeline;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod session;

#[cfg(feature = "async")]
pub use async_pipeline::{spawn_async_decoder, AsyncDecoderHandle};
pub use decoder::{DecodeMode, DecodeStats, ResilientDecoder, StreamDecoder, StrictDecoder};
pub use diagnostics::{
    hex, CollectingSink, DiagnosticsSink, DroppedFrame, NullSink, TracingSink, Verbosity,
};
pub use error::{DecodeError, Result, SessionError};
pub use pipeline::{run_pipeline, spawn_decoder, DecoderHandle, PipelineConfig, DEFAULT_CAPACITY};
pub use renderer::{apply, RecordingRenderer, RenderCall, Renderer};
pub use session::{ControlWriter, Session};
