use std::path::PathBuf;

use clap::{Args, Subcommand};
use m8link_command::{CommandConfig, JoypadKeys};
use m8link_frame::DEFAULT_READ_CHUNK_SIZE;
use m8link_session::{DecodeMode, StreamDecoder, TracingSink, Verbosity};
use m8link_transport::SerialDevice;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod keys;
pub mod monitor;
pub mod version;

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct Globals {
    pub format: OutputFormat,
    pub mode: DecodeMode,
    pub diagnostics: Verbosity,
}

impl Globals {
    pub fn decoder(&self) -> StreamDecoder {
        StreamDecoder::new(
            self.mode,
            CommandConfig::default(),
            Box::new(TracingSink::new(self.diagnostics)),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enable the device display and print decoded commands.
    Monitor(MonitorArgs),
    /// Decode a captured raw byte stream.
    Decode(DecodeArgs),
    /// Send one input state message.
    Keys(KeysArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, globals: &Globals) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, globals),
        Command::Decode(args) => decode::run(args, globals),
        Command::Keys(args) => keys::run(args, globals),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device node.
    #[arg(env = "M8_DEV", default_value = SerialDevice::DEFAULT_PATH)]
    pub device: PathBuf,
    /// Exit after printing N commands.
    #[arg(long)]
    pub count: Option<u64>,
    /// Also print no-op entries for dropped frames.
    #[arg(long)]
    pub show_dropped: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file, or `-` for stdin.
    pub input: PathBuf,
    /// Bytes per read; small values exercise chunk boundaries.
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Serial device node.
    #[arg(env = "M8_DEV", default_value = SerialDevice::DEFAULT_PATH)]
    pub device: PathBuf,
    /// Held keys, comma-separated (`left,up`), or `none`.
    #[arg(long)]
    pub keys: JoypadKeys,
    /// Send enable-and-reset before the key state.
    #[arg(long)]
    pub reset: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
