use std::fs::File;
use std::io::Read;
use std::path::Path;

use m8link_frame::{ChunkReader, DecodeState, FramingError, ReaderConfig};
use tracing::{debug, info};

use crate::cmd::{DecodeArgs, Globals};
use crate::exit::{decode_error, framing_error, io_error, CliResult, SUCCESS};
use crate::output::print_command;

pub fn run(args: DecodeArgs, globals: &Globals) -> CliResult<i32> {
    let input = open_input(&args.input)?;
    let mut reader = ChunkReader::with_config(
        input,
        ReaderConfig {
            read_chunk_size: args.chunk_size,
        },
    );
    let mut state = DecodeState::new();
    let mut decoder = globals.decoder();
    debug!(mode = %decoder.mode(), chunk_size = args.chunk_size, "decoding capture");

    let mut offset = 0usize;
    let mut index = 0u64;
    loop {
        let chunk = match reader.read_chunk() {
            Ok(chunk) => chunk,
            Err(FramingError::ConnectionClosed) => break,
            Err(err) => return Err(framing_error("read failed", err)),
        };

        let mut input: &[u8] = &chunk;
        loop {
            let commands = decoder.next(input, &mut state).map_err(|err| {
                decode_error(&format!("decode failed in chunk at byte {offset}"), err)
            })?;
            for command in &commands {
                print_command(index, command, globals.format);
                index += 1;
            }
            if !state.has_buffered() {
                break;
            }
            input = &[];
        }
        offset += chunk.len();
    }

    if !state.is_idle() {
        debug!(
            pending = state.partial().len(),
            "capture ended inside a frame; partial packet discarded"
        );
    }
    let stats = decoder.stats();
    info!(
        bytes = offset,
        commands = index,
        dropped = stats.dropped,
        "capture decoded"
    );

    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin().lock()));
    }
    let file = File::open(path).map_err(|err| io_error(&format!("open {}", path.display()), err))?;
    Ok(Box::new(file))
}
