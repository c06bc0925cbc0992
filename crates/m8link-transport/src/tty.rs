//! Terminal line settings via termios.

use std::io;
use std::mem::MaybeUninit;
use std::os::fd::RawFd;
use std::time::Duration;

/// Longest read timeout expressible in `VTIME` (deciseconds in a `cc_t`).
const MAX_VTIME_DECISECONDS: u64 = u8::MAX as u64;

pub(crate) fn is_tty(fd: RawFd) -> bool {
    // SAFETY: `isatty` only inspects the descriptor and has no memory effects.
    unsafe { libc::isatty(fd) == 1 }
}

/// Put the terminal into raw mode: no echo, no line buffering, no byte
/// translation. Every byte of the SLIP stream reaches the reader verbatim.
pub(crate) fn make_raw(fd: RawFd, read_timeout: Option<Duration>) -> io::Result<()> {
    let mut termios = get_attrs(fd)?;
    // SAFETY: `termios` is a fully initialized value obtained from `tcgetattr`.
    unsafe { libc::cfmakeraw(&mut termios) };
    apply_read_timeout(&mut termios, read_timeout);
    set_attrs(fd, &termios)
}

pub(crate) fn set_read_timeout(fd: RawFd, read_timeout: Option<Duration>) -> io::Result<()> {
    let mut termios = get_attrs(fd)?;
    apply_read_timeout(&mut termios, read_timeout);
    set_attrs(fd, &termios)
}

fn apply_read_timeout(termios: &mut libc::termios, read_timeout: Option<Duration>) {
    match read_timeout {
        Some(timeout) => {
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = vtime_deciseconds(timeout);
        }
        None => {
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;
        }
    }
}

fn vtime_deciseconds(timeout: Duration) -> libc::cc_t {
    let deciseconds = timeout.as_millis().div_ceil(100) as u64;
    deciseconds.clamp(1, MAX_VTIME_DECISECONDS) as libc::cc_t
}

fn get_attrs(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: `termios` points to writable storage of the right size; on
    // success `tcgetattr` fully initializes it.
    let rc = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `tcgetattr` returned success, so the value is initialized.
    Ok(unsafe { termios.assume_init() })
}

fn set_attrs(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: `termios` is a valid, initialized reference for the duration of the call.
    let rc = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
