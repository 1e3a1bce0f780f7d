//! Process terminal access: TTY detection, window size and raw stdin.

use std::io;
use std::time::Duration;

use crate::core::terminal::{InputSource, ReadStatus};

#[cfg(unix)]
use libc::{self, c_int};

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

/// Columns of the terminal attached to stdout, or 0 when stdout is not a terminal.
#[cfg(unix)]
pub fn stdout_width() -> usize {
    read_winsize(libc::STDOUT_FILENO)
        .map(|(cols, _)| usize::from(cols))
        .unwrap_or(0)
}

#[cfg(not(unix))]
pub fn stdout_width() -> usize {
    0
}

#[cfg(unix)]
pub fn stdout_is_terminal() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) == 1 }
}

#[cfg(not(unix))]
pub fn stdout_is_terminal() -> bool {
    use std::io::IsTerminal;
    io::stdout().is_terminal()
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0);
    }
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Stdin in character-at-a-time mode.
///
/// Echo, line buffering and signal generation are disabled so Ctrl-C arrives as a byte and
/// reaches the same cancellation path as SIGINT. Output post-processing stays on, so `\n`
/// written by a canvas still returns the carriage.
#[cfg(unix)]
pub struct StdinSource {
    fd: c_int,
    original_termios: Option<libc::termios>,
}

#[cfg(unix)]
impl StdinSource {
    pub fn new() -> Self {
        Self {
            fd: libc::STDIN_FILENO,
            original_termios: None,
        }
    }
}

#[cfg(unix)]
impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl InputSource for StdinSource {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        let original = get_termios(self.fd)?;
        let mut raw = original;
        raw.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        raw.c_iflag &= !(libc::IXON | libc::ICRNL | libc::INLCR | libc::IGNCR);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        set_termios(self.fd, &raw)?;
        self.original_termios = Some(original);
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        let Some(original) = self.original_termios.take() else {
            return Ok(());
        };
        // Drop unread keystrokes so they do not leak into the shell.
        let _ = unsafe { libc::tcflush(self.fd, libc::TCIFLUSH) };
        set_termios(self.fd, &original)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<ReadStatus> {
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        if !poll_readable(self.fd, timeout_ms)? {
            return Ok(ReadStatus::Idle);
        }
        let read_len = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut _, buf.len()) };
        if read_len < 0 {
            let err = io::Error::last_os_error();
            if matches!(
                err.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
            ) {
                return Ok(ReadStatus::Idle);
            }
            return Err(err);
        }
        if read_len == 0 {
            return Ok(ReadStatus::Closed);
        }
        Ok(ReadStatus::Data(read_len as usize))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::{get_termios, InputSource, ReadStatus, StdinSource};
    use libc::c_int;
    use std::time::Duration;

    struct Pty {
        master: c_int,
        slave: c_int,
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.master);
                libc::close(self.slave);
            }
        }
    }

    fn open_pty() -> Pty {
        let mut master: c_int = 0;
        let mut slave: c_int = 0;
        let result = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, 0, "openpty failed");
        Pty { master, slave }
    }

    fn source_for(pty: &Pty) -> StdinSource {
        StdinSource {
            fd: pty.slave,
            original_termios: None,
        }
    }

    #[test]
    fn raw_mode_round_trips_termios() {
        let pty = open_pty();
        let mut source = source_for(&pty);
        let before = get_termios(pty.slave).expect("termios");

        source.enter_raw_mode().expect("raw");
        let raw = get_termios(pty.slave).expect("termios");
        assert_eq!(raw.c_lflag & libc::ICANON, 0);
        assert_eq!(raw.c_lflag & libc::ISIG, 0);

        source.leave_raw_mode().expect("restore");
        let after = get_termios(pty.slave).expect("termios");
        assert_eq!(before.c_lflag, after.c_lflag);
    }

    #[test]
    fn reads_bytes_written_to_pty() {
        let pty = open_pty();
        let mut source = source_for(&pty);
        source.enter_raw_mode().expect("raw");

        let mut buf = [0u8; 16];
        assert_eq!(
            source
                .read_timeout(&mut buf, Duration::from_millis(10))
                .expect("idle read"),
            ReadStatus::Idle
        );

        let written = unsafe { libc::write(pty.master, b"\x1b[B".as_ptr() as *const _, 3) };
        assert_eq!(written, 3);
        let status = source
            .read_timeout(&mut buf, Duration::from_millis(500))
            .expect("read");
        assert_eq!(status, ReadStatus::Data(3));
        assert_eq!(&buf[..3], b"\x1b[B");

        source.leave_raw_mode().expect("restore");
    }

    #[test]
    fn leave_without_enter_is_a_no_op() {
        let mut source = StdinSource::new();
        source.leave_raw_mode().expect("no-op");
    }
}
