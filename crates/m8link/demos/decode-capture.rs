//! Decode a raw capture file and replay it into a recording renderer.
//!
//! Run with:
//!   cargo run --example decode-capture -- capture.bin
//!
//! Without an argument a small synthetic capture is decoded instead,
//! including one corrupt frame to show resilient substitution.

use std::fs::File;
use std::io::{Cursor, Read};

use m8link::frame::PacketWriter;
use m8link::session::{
    run_pipeline, spawn_decoder, CollectingSink, PipelineConfig, RecordingRenderer, StreamDecoder,
};

fn synthetic_capture() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut writer = PacketWriter::new(Vec::new());
    writer.send(&[0xFE, 0x00, 0x00, 0x00, 0x00, 0x40, 0x01, 0xF0, 0x00, 0x00, 0x00, 0x00])?;
    writer.send(&[0xFD, b'M', 0x08, 0x00, 0x08, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00])?;
    writer.send(&[0x42])?;
    writer.send(&[0xFB, 0x08, 0x00])?;
    Ok(writer.into_inner())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn Read + Send> = match std::env::args().nth(1) {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(Cursor::new(synthetic_capture()?)),
    };

    let sink = CollectingSink::new();
    let handle = spawn_decoder(
        reader,
        StreamDecoder::resilient(sink.clone()),
        &PipelineConfig::default(),
    )?;

    let mut renderer = RecordingRenderer::new();
    let stats = run_pipeline(handle, &mut renderer)?;

    for call in renderer.calls() {
        println!("{call:?}");
    }
    eprintln!(
        "decoded {} commands, dropped {} frames",
        stats.decoded, stats.dropped
    );
    for dropped in sink.take() {
        eprintln!("  dropped [{}]: {}", m8link::session::hex(&dropped.raw), dropped.error);
    }

    Ok(())
}
