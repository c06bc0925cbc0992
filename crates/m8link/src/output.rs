use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use m8link_command::{Command, JoypadKeys, Position};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize, Default)]
struct CommandOutput {
    index: u64,
    command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    opcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<Vec<&'static str>>,
}

impl CommandOutput {
    fn new(index: u64, command: &Command) -> Self {
        let mut out = Self {
            index,
            command: command.name(),
            opcode: command.opcode().map(|op| format!("0x{:02X}", op.byte())),
            ..Self::default()
        };

        match command {
            Command::DrawRectangle { pos, size, color } => {
                out.set_pos(*pos);
                out.width = Some(size.width);
                out.height = Some(size.height);
                out.color = Some(color.to_string());
            }
            Command::DrawCharacter { code, pos, fg, bg } => {
                out.set_pos(*pos);
                out.code = Some(*code);
                out.color = Some(fg.to_string());
                out.background = Some(bg.to_string());
            }
            Command::DrawOscilloscopeWaveform { color, samples } => {
                out.color = Some(color.to_string());
                out.samples = Some(samples.len());
            }
            Command::JoypadKeyState { mask } => {
                out.keys = Some(mask.names());
            }
            Command::NoOp => {}
        }
        out
    }

    fn set_pos(&mut self, pos: Position) {
        self.x = Some(pos.x);
        self.y = Some(pos.y);
    }
}

pub fn print_command(index: u64, command: &Command, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CommandOutput::new(index, command);
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "COMMAND", "DETAILS"])
                .add_row(vec![
                    index.to_string(),
                    command.name().to_string(),
                    details(command),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let details = details(command);
            if details.is_empty() {
                println!("#{index} {}", command.name());
            } else {
                println!("#{index} {} {details}", command.name());
            }
        }
    }
}

/// One-line human summary of a command's fields.
pub fn details(command: &Command) -> String {
    match command {
        Command::DrawRectangle { pos, size, color } => {
            format!("pos={pos} size={size} color={color}")
        }
        Command::DrawCharacter { code, pos, fg, bg } => {
            format!("char={} pos={pos} fg={fg} bg={bg}", char_label(*code))
        }
        Command::DrawOscilloscopeWaveform { color, samples } if samples.is_empty() => {
            format!("color={color} off")
        }
        Command::DrawOscilloscopeWaveform { color, samples } => {
            format!("color={color} samples={}", samples.len())
        }
        Command::JoypadKeyState { mask } => format!("keys={mask}"),
        Command::NoOp => String::new(),
    }
}

fn char_label(code: u8) -> String {
    if code.is_ascii_graphic() || code == b' ' {
        format!("'{}'", code as char)
    } else {
        format!("0x{code:02X}")
    }
}

#[derive(Serialize)]
struct KeysOutput {
    keys: Vec<&'static str>,
    mask: String,
}

pub fn print_keys(keys: JoypadKeys, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = KeysOutput {
                keys: keys.names(),
                mask: format!("0x{:02X}", keys.bits()),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("keys={keys} mask=0x{:02X}", keys.bits());
        }
    }
}
