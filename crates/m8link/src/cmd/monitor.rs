use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use m8link_command::Command;
use m8link_session::{PipelineConfig, Session, SessionError};
use m8link_transport::SerialDevice;
use tracing::info;

use crate::cmd::{Globals, MonitorArgs};
use crate::exit::{session_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::print_command;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: MonitorArgs, globals: &Globals) -> CliResult<i32> {
    let stream =
        SerialDevice::open(&args.device).map_err(|err| transport_error("open failed", err))?;
    let mut session = Session::open(stream, globals.decoder())
        .map_err(|err| session_error("session setup failed", err))?;
    session
        .start()
        .map_err(|err| session_error("enable and reset failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (_control, handle) = session
        .into_pipeline(&PipelineConfig::default())
        .map_err(|err| session_error("pipeline setup failed", err))?;

    let mut printed = 0u64;
    while running.load(Ordering::SeqCst) {
        let command = match handle.recv_timeout(POLL_INTERVAL) {
            Ok(command) => command,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                // The worker ends on EOF as well as on errors; for a live
                // device both mean the link is gone.
                return match handle.join() {
                    Ok(_) => Err(session_error("monitor", SessionError::Disconnected)),
                    Err(err) => Err(session_error("monitor", err)),
                };
            }
        };

        if matches!(command, Command::NoOp) && !args.show_dropped {
            continue;
        }

        print_command(printed, &command, globals.format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    // The worker may be blocked in a read; it is not joined and ends with
    // the process.
    info!(printed, "monitor stopped");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
