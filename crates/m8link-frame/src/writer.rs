use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::error::{FramingError, Result};
use crate::slip::encode_packet;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes SLIP-encoded packets to any `Write` stream.
///
/// The device never receives SLIP frames, so this is the device side of the
/// link: replaying captures, simulators, and tests.
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> PacketWriter<T> {
    /// Create a new packet writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send one packet (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_packet(payload, &mut self.buf);
        self.write_buffered()
    }

    /// Send raw, already-encoded bytes unchanged.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FramingError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FramingError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FramingError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PacketReader;
    use crate::slip::{END, ESC, ESC_END, ESC_ESC};

    #[test]
    fn send_encodes_and_terminates() {
        let mut writer = PacketWriter::new(Vec::new());
        writer.send(&[0x01, END, ESC]).unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![0x01, ESC, ESC_END, ESC, ESC_ESC, END]
        );
    }

    #[test]
    fn send_raw_is_verbatim() {
        let mut writer = PacketWriter::new(Vec::new());
        writer.send_raw(&[ESC, 0x00, END]).unwrap();
        assert_eq!(writer.get_ref(), &vec![ESC, 0x00, END]);
    }

    #[test]
    fn zero_length_write_reports_closed() {
        let mut writer = PacketWriter::new(ZeroWriter);
        assert!(matches!(
            writer.send(b"x"),
            Err(FramingError::ConnectionClosed)
        ));
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = PacketWriter::new(left);
        let mut reader = PacketReader::new(right);

        writer.send(&[0xFE, END, ESC]).unwrap();
        writer.send(&[0xFB, 0x80, 0x00]).unwrap();

        assert_eq!(reader.read_packet().unwrap().as_bytes(), &[0xFE, END, ESC]);
        assert_eq!(reader.read_packet().unwrap().as_bytes(), &[0xFB, 0x80, 0x00]);
    }

    #[test]
    fn concurrent_reader_writer_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = PacketWriter::new(left);
        let mut reader = PacketReader::new(right);

        let reader_thread = std::thread::spawn(move || {
            for expected in 0..64u8 {
                let packet = reader.read_packet().unwrap();
                assert_eq!(packet.as_bytes(), &[0xFB, expected, END]);
            }
        });

        for i in 0..64u8 {
            writer.send(&[0xFB, i, END]).unwrap();
        }

        reader_thread.join().unwrap();
    }
}
