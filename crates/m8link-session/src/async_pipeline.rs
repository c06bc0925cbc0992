//! Tokio variant of the decode pipeline.

use m8link_command::Command;
use m8link_frame::{DecodeState, FramingError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::decoder::{DecodeStats, StreamDecoder};
use crate::error::{Result, SessionError};
use crate::pipeline::PipelineConfig;

/// The consumer side of an async decode task.
#[derive(Debug)]
pub struct AsyncDecoderHandle {
    commands: mpsc::Receiver<Command>,
    task: JoinHandle<Result<DecodeStats>>,
}

impl AsyncDecoderHandle {
    /// Next command in stream order. `None` once the task has finished.
    pub async fn recv(&mut self) -> Option<Command> {
        self.commands.recv().await
    }

    /// Stop consuming and wait for the task.
    pub async fn join(self) -> Result<DecodeStats> {
        let Self { commands, task } = self;
        drop(commands);
        task.await.map_err(|_| SessionError::WorkerPanicked)?
    }
}

/// Spawn a task on the current runtime that reads `reader`, decodes it,
/// and delivers commands over a bounded channel.
///
/// Same ordering and termination rules as
/// [`spawn_decoder`](crate::pipeline::spawn_decoder).
pub fn spawn_async_decoder<R>(
    reader: R,
    decoder: StreamDecoder,
    config: &PipelineConfig,
) -> AsyncDecoderHandle
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.capacity.max(1));
    let chunk_size = config.read_chunk_size.max(1);
    let task = tokio::spawn(decode_task(reader, decoder, chunk_size, tx));
    AsyncDecoderHandle { commands: rx, task }
}

async fn decode_task<R>(
    mut reader: R,
    mut decoder: StreamDecoder,
    chunk_size: usize,
    tx: mpsc::Sender<Command>,
) -> Result<DecodeStats>
where
    R: AsyncRead + Unpin,
{
    let mut state = DecodeState::new();
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = if state.has_buffered() {
            0
        } else {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|err| SessionError::Read(FramingError::Io(err)))?;
            if n == 0 {
                debug!(stats = ?decoder.stats(), "async stream ended");
                return Ok(decoder.stats());
            }
            n
        };

        for command in decoder.next(&buf[..n], &mut state)? {
            if tx.send(command).await.is_err() {
                return Ok(decoder.stats());
            }
        }
    }
}
