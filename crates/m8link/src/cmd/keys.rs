use m8link_command::ControlMessage;
use m8link_session::ControlWriter;
use m8link_transport::SerialDevice;
use tracing::info;

use crate::cmd::{Globals, KeysArgs};
use crate::exit::{io_error, transport_error, CliResult, SUCCESS};
use crate::output::print_keys;

pub fn run(args: KeysArgs, globals: &Globals) -> CliResult<i32> {
    let stream =
        SerialDevice::open(&args.device).map_err(|err| transport_error("open failed", err))?;
    let mut control = ControlWriter::new(stream);

    if args.reset {
        control
            .start()
            .map_err(|err| io_error("enable and reset failed", err))?;
    }

    // A one-shot command has no previous state to compare against, so the
    // message is always sent.
    control
        .send(ControlMessage::SetInputState(args.keys))
        .map_err(|err| io_error("send failed", err))?;
    info!(device = %args.device.display(), keys = %args.keys, "input state sent");

    print_keys(args.keys, globals.format);
    Ok(SUCCESS)
}
