use std::io::{ErrorKind, Read, Write};

use m8link_command::{Command, ControlMessage, JoypadKeys};
use m8link_frame::{ChunkReader, DecodeState, FramingError, ReaderConfig};
use m8link_transport::DeviceStream;
use tracing::{debug, info};

use crate::decoder::StreamDecoder;
use crate::error::{Result, SessionError};
use crate::pipeline::{spawn_worker, DecoderHandle, PipelineConfig};

/// Sends control messages to the device.
///
/// Remembers the last input state sent so unchanged key masks are not
/// resent.
#[derive(Debug)]
pub struct ControlWriter<W> {
    inner: W,
    last_input: JoypadKeys,
}

impl<W: Write> ControlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            last_input: JoypadKeys::NONE,
        }
    }

    /// Ask the device to start streaming and redraw the whole screen.
    ///
    /// The device forgets any held keys on reset, so the remembered input
    /// state is cleared too.
    pub fn start(&mut self) -> std::io::Result<()> {
        self.send(ControlMessage::EnableAndResetDisplay)?;
        self.last_input = JoypadKeys::NONE;
        info!("display enabled and reset");
        Ok(())
    }

    /// Report the currently held keys. Returns whether a message was sent.
    pub fn set_input(&mut self, keys: JoypadKeys) -> std::io::Result<bool> {
        if keys == self.last_input {
            return Ok(false);
        }
        self.send(ControlMessage::SetInputState(keys))?;
        debug!(%keys, "input state sent");
        self.last_input = keys;
        Ok(true)
    }

    /// Write one control message and flush.
    pub fn send(&mut self, message: ControlMessage) -> std::io::Result<()> {
        let bytes = message.to_bytes();
        let mut written = 0usize;
        while written < bytes.len() {
            match self.inner.write(&bytes[written..]) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => written += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        self.inner.flush()
    }

    pub fn last_input(&self) -> JoypadKeys {
        self.last_input
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// One connection to a device: raw chunks in, commands out, control
/// messages back.
///
/// Owns the only [`DecodeState`] for its stream. Dropping the session
/// discards any partially received packet.
pub struct Session<R = DeviceStream, W = DeviceStream> {
    reader: ChunkReader<R>,
    state: DecodeState,
    decoder: StreamDecoder,
    control: ControlWriter<W>,
}

impl Session<DeviceStream, DeviceStream> {
    /// Build a session over an opened device stream.
    ///
    /// The stream is cloned so reads and control writes use separate
    /// handles.
    pub fn open(stream: DeviceStream, decoder: StreamDecoder) -> Result<Self> {
        Self::open_with_config(stream, decoder, ReaderConfig::default())
    }

    pub fn open_with_config(
        stream: DeviceStream,
        decoder: StreamDecoder,
        config: ReaderConfig,
    ) -> Result<Self> {
        let reader = stream.try_clone()?;
        Ok(Self::with_config(reader, stream, decoder, config))
    }
}

impl<R: Read, W: Write> Session<R, W> {
    pub fn new(reader: R, writer: W, decoder: StreamDecoder) -> Self {
        Self::with_config(reader, writer, decoder, ReaderConfig::default())
    }

    pub fn with_config(reader: R, writer: W, decoder: StreamDecoder, config: ReaderConfig) -> Self {
        Self {
            reader: ChunkReader::with_config(reader, config),
            state: DecodeState::new(),
            decoder,
            control: ControlWriter::new(writer),
        }
    }

    /// Send the enable-and-reset message.
    pub fn start(&mut self) -> Result<()> {
        self.control.start().map_err(SessionError::Write)
    }

    /// Report held keys if they changed since the last report.
    pub fn set_input(&mut self, keys: JoypadKeys) -> Result<bool> {
        self.control.set_input(keys).map_err(SessionError::Write)
    }

    /// Read one chunk (blocking) and decode every frame it completes.
    ///
    /// May return an empty list when the chunk only extended a partial
    /// packet. In strict mode input left over from a bad frame is decoded
    /// first, without reading.
    pub fn next_commands(&mut self) -> Result<Vec<Command>> {
        if self.state.has_buffered() {
            return Ok(self.decoder.next(&[], &mut self.state)?);
        }
        let chunk = match self.reader.read_chunk() {
            Ok(chunk) => chunk,
            Err(FramingError::ConnectionClosed) => {
                info!("device closed the stream");
                return Err(SessionError::Disconnected);
            }
            Err(err) => return Err(SessionError::Read(err)),
        };
        Ok(self.decoder.next(&chunk, &mut self.state)?)
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }

    pub fn control(&mut self) -> &mut ControlWriter<W> {
        &mut self.control
    }

    /// Move reading and decoding to a worker thread.
    ///
    /// Any partial packet already received carries over to the worker.
    /// The control writer stays with the caller.
    pub fn into_pipeline(
        self,
        config: &PipelineConfig,
    ) -> Result<(ControlWriter<W>, DecoderHandle)>
    where
        R: Send + 'static,
    {
        let handle = spawn_worker(self.reader, self.state, self.decoder, config.capacity)?;
        Ok((self.control, handle))
    }
}

impl<R, W> std::fmt::Debug for Session<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}
