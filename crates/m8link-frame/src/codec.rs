use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::packetizer::{feed_frames, DecodeState, FrameResult};
use crate::slip::encode_packet;

/// SLIP codec for use with `tokio_util::codec::{FramedRead, FramedWrite}`.
///
/// Decoded items are per-frame results: a corrupt frame surfaces as an
/// `Err` item and the stream keeps going. Only transport errors end the
/// stream.
#[derive(Debug, Default)]
pub struct SlipCodec {
    state: DecodeState,
    ready: VecDeque<FrameResult>,
}

impl SlipCodec {
    /// Create a codec with idle packetizer state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Packetizer state carried between reads.
    pub fn state(&self) -> &DecodeState {
        &self.state
    }
}

impl Decoder for SlipCodec {
    type Item = FrameResult;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.ready.is_empty() && !src.is_empty() {
            let chunk = src.split();
            self.ready.extend(feed_frames(&chunk, &mut self.state));
        }
        Ok(self.ready.pop_front())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                self.state.reset();
                Ok(None)
            }
        }
    }
}

impl Encoder<&[u8]> for SlipCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_packet(item, dst);
        Ok(())
    }
}
