mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use m8link_session::{DecodeMode, Verbosity};

use crate::cmd::{Command, Globals};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "m8link", version, about = "M8 headless display client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Frame error handling: resilient or strict.
    #[arg(
        long,
        value_name = "MODE",
        env = "M8_DECODE_MODE",
        default_value = "resilient",
        global = true
    )]
    mode: DecodeMode,

    /// Dropped-frame reporting: quiet, normal, or verbose.
    #[arg(
        long,
        value_name = "LEVEL",
        env = "M8_DIAGNOSTICS",
        default_value = "normal",
        global = true
    )]
    diagnostics: Verbosity,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level, cli.diagnostics);

    let globals = Globals {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        mode: cli.mode,
        diagnostics: cli.diagnostics,
    };
    let result = cmd::run(cli.command, &globals);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use m8link_command::JoypadKeys;

    use super::*;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "m8link",
            "decode",
            "capture.bin",
            "--chunk-size",
            "7",
            "--mode",
            "strict",
        ])
        .expect("decode args should parse");

        assert_eq!(cli.mode, DecodeMode::Strict);
        match cli.command {
            Command::Decode(args) => assert_eq!(args.chunk_size, 7),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_key_list() {
        let cli = Cli::try_parse_from(["m8link", "keys", "/dev/null", "--keys", "left,edit"])
            .expect("keys args should parse");
        match cli.command {
            Command::Keys(args) => assert_eq!(args.keys, JoypadKeys::LEFT | JoypadKeys::EDIT),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_key() {
        let err = Cli::try_parse_from(["m8link", "keys", "/dev/null", "--keys", "jump"])
            .expect_err("unknown key should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = Cli::try_parse_from(["m8link", "--mode", "lenient", "decode", "-"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_monitor_with_count() {
        let cli = Cli::try_parse_from([
            "m8link",
            "monitor",
            "/dev/ttyACM1",
            "--count",
            "3",
            "--diagnostics",
            "verbose",
        ])
        .expect("monitor args should parse");
        assert_eq!(cli.diagnostics, Verbosity::Verbose);
        match cli.command {
            Command::Monitor(args) => {
                assert_eq!(args.count, Some(3));
                assert_eq!(args.device.to_str(), Some("/dev/ttyACM1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
