//! Decode a capture file on a tokio runtime.
//!
//! Run with:
//!   cargo run --example async-decode --features async -- capture.bin

use m8link::session::{spawn_async_decoder, NullSink, PipelineConfig, StreamDecoder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: async-decode <capture.bin>")?;
    let file = tokio::fs::File::open(&path).await?;

    let mut handle = spawn_async_decoder(
        file,
        StreamDecoder::resilient(NullSink),
        &PipelineConfig::default(),
    );

    let mut index = 0u64;
    while let Some(command) = handle.recv().await {
        println!("#{index} {command:?}");
        index += 1;
    }

    let stats = handle.join().await?;
    eprintln!(
        "decoded {} commands, dropped {} frames",
        stats.decoded, stats.dropped
    );
    Ok(())
}
