//! Decoding on a worker thread with ordered, bounded delivery.
//!
//! One worker owns the reader and the [`DecodeState`]; commands travel to
//! the consumer over a bounded channel. A slow renderer blocks the worker
//! instead of growing an unbounded queue, and FIFO delivery keeps stream
//! order.

use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use m8link_command::Command;
use m8link_frame::{
    ChunkReader, DecodeState, FramingError, ReaderConfig, DEFAULT_READ_CHUNK_SIZE,
};
use tracing::{debug, info, warn};

use crate::decoder::{DecodeStats, StreamDecoder};
use crate::error::{Result, SessionError};
use crate::renderer::{apply, Renderer};

/// Default number of decoded commands buffered between worker and consumer.
pub const DEFAULT_CAPACITY: usize = 64;

/// Configuration for [`spawn_decoder`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Commands buffered before the worker blocks.
    pub capacity: usize,
    /// Maximum bytes requested per transport read.
    pub read_chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

/// The consumer side of a decode worker.
pub struct DecoderHandle {
    commands: Receiver<Command>,
    worker: JoinHandle<Result<DecodeStats>>,
}

impl DecoderHandle {
    /// Block until the next command. `None` once the worker has finished.
    pub fn recv(&self) -> Option<Command> {
        self.commands.recv().ok()
    }

    /// Wait at most `timeout` for the next command.
    ///
    /// `Err(RecvTimeoutError::Disconnected)` means the worker has finished.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Command, RecvTimeoutError> {
        self.commands.recv_timeout(timeout)
    }

    /// Iterate commands in stream order until the worker finishes.
    pub fn iter(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands.iter()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Stop consuming and wait for the worker.
    ///
    /// Undelivered commands are dropped. A worker blocked on a read only
    /// returns once the transport yields data, EOF, or an error.
    pub fn join(self) -> Result<DecodeStats> {
        let Self { commands, worker } = self;
        drop(commands);
        worker.join().map_err(|_| SessionError::WorkerPanicked)?
    }
}

impl std::fmt::Debug for DecoderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderHandle")
            .field("finished", &self.worker.is_finished())
            .finish()
    }
}

/// Start a worker that reads `reader`, decodes it with `decoder`, and
/// delivers commands in order.
///
/// The worker ends with `Ok` on EOF or when the handle stops receiving,
/// and with `Err` on a read failure or, in strict mode, the first bad
/// frame.
pub fn spawn_decoder<R>(
    reader: R,
    decoder: StreamDecoder,
    config: &PipelineConfig,
) -> Result<DecoderHandle>
where
    R: Read + Send + 'static,
{
    let reader = ChunkReader::with_config(
        reader,
        ReaderConfig {
            read_chunk_size: config.read_chunk_size,
        },
    );
    spawn_worker(reader, DecodeState::new(), decoder, config.capacity)
}

pub(crate) fn spawn_worker<R>(
    reader: ChunkReader<R>,
    state: DecodeState,
    decoder: StreamDecoder,
    capacity: usize,
) -> Result<DecoderHandle>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    let worker = thread::Builder::new()
        .name("m8link-decoder".into())
        .spawn(move || decode_loop(reader, state, decoder, tx))
        .map_err(SessionError::Spawn)?;

    Ok(DecoderHandle {
        commands: rx,
        worker,
    })
}

fn decode_loop<R: Read>(
    mut reader: ChunkReader<R>,
    mut state: DecodeState,
    mut decoder: StreamDecoder,
    tx: SyncSender<Command>,
) -> Result<DecodeStats> {
    debug!(mode = %decoder.mode(), "decode worker started");
    loop {
        if state.has_buffered() {
            let commands = decoder.next(&[], &mut state)?;
            if !deliver(&tx, commands) {
                return Ok(decoder.stats());
            }
            continue;
        }

        let chunk = match reader.read_chunk() {
            Ok(chunk) => chunk,
            Err(FramingError::ConnectionClosed) => {
                info!(stats = ?decoder.stats(), "stream ended");
                return Ok(decoder.stats());
            }
            Err(err) => {
                warn!(error = %err, "read failed");
                return Err(SessionError::Read(err));
            }
        };

        let commands = decoder.next(&chunk, &mut state)?;
        if !deliver(&tx, commands) {
            return Ok(decoder.stats());
        }
    }
}

/// Send in order; `false` once the consumer is gone.
fn deliver(tx: &SyncSender<Command>, commands: Vec<Command>) -> bool {
    for command in commands {
        if tx.send(command).is_err() {
            debug!("consumer gone; stopping decode worker");
            return false;
        }
    }
    true
}

/// Deliver every command from `handle` to `renderer`, then join the worker.
///
/// Returns the first renderer error, or the worker's own outcome once the
/// stream ends.
pub fn run_pipeline<R>(handle: DecoderHandle, renderer: &mut R) -> Result<DecodeStats>
where
    R: Renderer + ?Sized,
    R::Error: std::error::Error + Send + Sync + 'static,
{
    for command in handle.iter() {
        apply(renderer, &command).map_err(|err| SessionError::Render(Box::new(err)))?;
    }
    handle.join()
}
