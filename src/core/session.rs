//! Render session
//!
//! A `Session` owns raw mode, the logical cursor, the cached terminal size
//! and the batched output buffer. Drawing only mutates the buffer;
//! `commit` is the single point where output reaches the terminal.
//!
//! ```text
//! init()    → raw mode, alternate screen, size, clear
//!   draw    → move_cursor / draw_text / set_cursor_visible (buffered)
//!   commit  → one write, buffer emptied
//! shutdown  → restore mode, leave alternate screen (also on drop)
//! ```

use std::fmt::Display;
use std::io;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::backend::Backend;
use super::buffer::{self, BufferError, OutputBuffer, DEFAULT_CAPACITY, DEFAULT_LIMIT};

/// Rows assumed when the terminal reports zero
pub const FALLBACK_ROWS: u16 = 24;

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("a terminal session is already active")]
    AlreadyActive,

    #[error("failed to configure terminal mode")]
    Mode(#[source] io::Error),

    #[error("failed to get window size")]
    WindowSize(#[source] io::Error),

    #[error("terminal reported zero columns")]
    ZeroWidth,

    #[error("terminal I/O failed")]
    Io(#[source] io::Error),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl SessionError {
    /// Errors that leave the session unusable
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SessionError::Buffer(BufferError::Overflow { .. })
        )
    }
}

/// Session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial output buffer allocation
    pub buffer_capacity: usize,
    /// Hard limit on buffered output between commits
    pub buffer_limit: usize,
    /// How long a key read waits before returning nothing
    pub read_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            buffer_limit: DEFAULT_LIMIT,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// An active raw-mode terminal session
pub struct Session<B: Backend> {
    backend: B,
    cursor_x: u16,
    cursor_y: u16,
    width: u16,
    height: u16,
    cursor_hidden: bool,
    buffer: OutputBuffer,
    active: bool,
}

impl<B: Backend> Session<B> {
    /// Take over the terminal behind `backend`.
    ///
    /// On any failure after raw mode was entered, the terminal is restored
    /// before the error is returned.
    pub fn init(mut backend: B, config: &SessionConfig) -> Result<Self, SessionError> {
        backend.enter_raw_mode().map_err(SessionError::Mode)?;

        let buffer = match OutputBuffer::new(config.buffer_capacity, config.buffer_limit) {
            Ok(buffer) => buffer,
            Err(e) => {
                let _ = backend.restore_mode();
                return Err(e.into());
            }
        };

        let mut session = Self {
            backend,
            cursor_x: 1,
            cursor_y: 1,
            width: 0,
            height: 0,
            cursor_hidden: false,
            buffer,
            active: true,
        };

        // From here on, dropping `session` restores the terminal
        session.write_now(EnterAlternateScreen)?;
        session.refresh_window_size()?;
        session.clear_screen()?;

        info!("Session started: {}x{}", session.width, session.height);
        Ok(session)
    }

    /// Re-query the terminal size.
    ///
    /// Zero columns is an error; zero rows falls back to 24.
    pub fn refresh_window_size(&mut self) -> Result<(u16, u16), SessionError> {
        let (cols, rows) = self
            .backend
            .window_size()
            .map_err(SessionError::WindowSize)?;
        if cols == 0 {
            return Err(SessionError::ZeroWidth);
        }
        let rows = if rows == 0 {
            debug!("Terminal reported zero rows, assuming {}", FALLBACK_ROWS);
            FALLBACK_ROWS
        } else {
            rows
        };
        self.width = cols;
        self.height = rows;
        Ok((cols, rows))
    }

    /// Buffer a cursor move to 1-based `(x, y)`.
    pub fn move_cursor(&mut self, x: u16, y: u16) -> Result<(), SessionError> {
        let (x, y) = (x.max(1), y.max(1));
        self.buffer.queue(MoveTo(x - 1, y - 1))?;
        self.cursor_x = x;
        self.cursor_y = y;
        Ok(())
    }

    /// Buffer a show/hide cursor sequence.
    pub fn set_cursor_visible(&mut self, visible: bool) -> Result<(), SessionError> {
        if visible {
            self.buffer.queue(Show)?;
        } else {
            self.buffer.queue(Hide)?;
        }
        self.cursor_hidden = !visible;
        Ok(())
    }

    /// Buffer `text` at `(x, y)` without moving the logical cursor.
    ///
    /// The move, the text and the move back are appended together; on
    /// overflow nothing is buffered.
    pub fn draw_text(&mut self, x: u16, y: u16, text: impl AsRef<[u8]>) -> Result<(), SessionError> {
        let text = text.as_ref();
        let to = buffer::encode(MoveTo(x.max(1) - 1, y.max(1) - 1))?;
        let back = buffer::encode(MoveTo(self.cursor_x - 1, self.cursor_y - 1))?;

        let mut seq = Vec::with_capacity(to.len() + text.len() + back.len());
        seq.extend_from_slice(to.as_bytes());
        seq.extend_from_slice(text);
        seq.extend_from_slice(back.as_bytes());
        self.buffer.append(&seq)?;
        Ok(())
    }

    /// Write everything buffered so far and empty the buffer.
    pub fn commit(&mut self) -> Result<(), SessionError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.backend
            .write_all(self.buffer.as_bytes())
            .map_err(SessionError::Io)?;
        self.buffer.clear();
        Ok(())
    }

    /// Clear the screen right away, bypassing the buffer.
    pub fn clear_screen(&mut self) -> Result<(), SessionError> {
        self.write_now(Clear(ClearType::All))
    }

    /// Wait up to the read timeout for one input byte.
    pub fn read_key(&mut self) -> Result<Option<u8>, SessionError> {
        self.backend.read_byte().map_err(SessionError::Io)
    }

    /// Logical cursor as 1-based `(x, y)`
    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_x, self.cursor_y)
    }

    /// Cached terminal size as `(width, height)`
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn cursor_visible(&self) -> bool {
        !self.cursor_hidden
    }

    /// Output waiting for the next commit
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Restore the terminal and end the session.
    pub fn shutdown(mut self) -> Result<(), SessionError> {
        self.restore()
    }

    /// Restore the terminal, then terminate the process.
    pub fn die(mut self, reason: impl Display) -> ! {
        if let Err(e) = self.restore() {
            warn!("Terminal restore failed: {}", e);
        }
        drop(self);
        crate::fatal::die(reason)
    }

    fn write_now(&mut self, command: impl crossterm::Command) -> Result<(), SessionError> {
        let seq = buffer::encode(command)?;
        self.backend
            .write_all(seq.as_bytes())
            .map_err(SessionError::Io)
    }

    fn restore(&mut self) -> Result<(), SessionError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let mut seq = String::new();
        if self.cursor_hidden {
            seq.push_str(&buffer::encode(Show)?);
        }
        seq.push_str(&buffer::encode(LeaveAlternateScreen)?);
        let written = self.backend.write_all(seq.as_bytes());
        let restored = self.backend.restore_mode();

        info!("Session ended");
        written.map_err(SessionError::Io)?;
        restored.map_err(SessionError::Mode)
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Terminal restore on drop failed: {}", e);
        }
    }
}
