//! Terminal backends
//!
//! A backend owns the OS side of a session: raw mode, geometry, and the
//! actual byte I/O. The session never touches file descriptors directly.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::session::SessionError;

/// OS-facing half of a terminal session
pub trait Backend {
    /// Save the current mode and switch the terminal to raw input.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Put back the mode saved by `enter_raw_mode`. A no-op if raw mode
    /// was never entered.
    fn restore_mode(&mut self) -> io::Result<()>;

    /// Terminal size as `(cols, rows)`
    fn window_size(&self) -> io::Result<(u16, u16)>;

    /// Write all bytes to the terminal in one go
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read a single input byte, or `None` if the read timed out.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

static TERMINAL_IN_USE: AtomicBool = AtomicBool::new(false);

/// Process-wide claim on the controlling terminal.
///
/// Only one lock can exist at a time; it is released on drop.
#[derive(Debug)]
pub struct TerminalLock {
    _private: (),
}

impl TerminalLock {
    pub fn acquire() -> Result<Self, SessionError> {
        if TERMINAL_IN_USE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::AlreadyActive);
        }
        Ok(Self { _private: () })
    }

    /// Whether some lock is currently held
    pub fn is_held() -> bool {
        TERMINAL_IN_USE.load(Ordering::Acquire)
    }
}

impl Drop for TerminalLock {
    fn drop(&mut self) {
        TERMINAL_IN_USE.store(false, Ordering::Release);
    }
}

/// Convert a read timeout to termios `VTIME` deciseconds (1..=255)
pub fn timeout_deciseconds(timeout: Duration) -> u8 {
    let ds = (timeout.as_millis() + 99) / 100;
    ds.clamp(1, u8::MAX as u128) as u8
}

/// Backend driving the process's stdin/stdout through termios
#[cfg(unix)]
pub struct TtyBackend {
    saved_mode: Option<libc::termios>,
    read_timeout: Duration,
    _lock: TerminalLock,
}

#[cfg(unix)]
impl TtyBackend {
    /// Claim the terminal. Fails if another backend already holds it.
    pub fn open(read_timeout: Duration) -> Result<Self, SessionError> {
        let lock = TerminalLock::acquire()?;
        Ok(Self {
            saved_mode: None,
            read_timeout,
            _lock: lock,
        })
    }

    fn stdin_fd() -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        io::stdin().as_raw_fd()
    }

    /// Derive the raw mode from the saved one
    fn raw_mode(&self, saved: &libc::termios) -> libc::termios {
        let mut mode = *saved;
        mode.c_cflag |= libc::CS8;
        mode.c_iflag &= !(libc::IXON | libc::ICRNL);
        mode.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG);
        mode.c_oflag &= !libc::OPOST;
        // Return whatever is available, or give up after VTIME deciseconds
        mode.c_cc[libc::VMIN] = 0;
        mode.c_cc[libc::VTIME] = timeout_deciseconds(self.read_timeout) as libc::cc_t;
        mode
    }
}

#[cfg(unix)]
impl Backend for TtyBackend {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        let fd = Self::stdin_fd();

        // SAFETY: termios is plain data; tcgetattr fills it completely on success.
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let active = self.raw_mode(&saved);
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &active) } != 0 {
            return Err(io::Error::last_os_error());
        }
        self.saved_mode = Some(saved);
        Ok(())
    }

    fn restore_mode(&mut self) -> io::Result<()> {
        if let Some(saved) = self.saved_mode.take() {
            if unsafe { libc::tcsetattr(Self::stdin_fd(), libc::TCSAFLUSH, &saved) } != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    fn window_size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        use std::io::Write;
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        // SAFETY: reading at most one byte into a valid one-byte buffer.
        let n = unsafe {
            libc::read(
                Self::stdin_fd(),
                (&mut byte as *mut u8).cast::<libc::c_void>(),
                1,
            )
        };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_lock_is_exclusive() {
        let first = TerminalLock::acquire().unwrap();
        assert!(TerminalLock::is_held());
        assert!(matches!(
            TerminalLock::acquire(),
            Err(SessionError::AlreadyActive)
        ));

        drop(first);
        assert!(!TerminalLock::is_held());
        let again = TerminalLock::acquire();
        assert!(again.is_ok());
    }

    #[test]
    fn test_timeout_deciseconds() {
        assert_eq!(timeout_deciseconds(Duration::from_millis(100)), 1);
        assert_eq!(timeout_deciseconds(Duration::from_millis(0)), 1);
        assert_eq!(timeout_deciseconds(Duration::from_millis(250)), 3);
        assert_eq!(timeout_deciseconds(Duration::from_secs(60)), 255);
    }
}
