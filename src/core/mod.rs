//! Terminal session components.
//!
//! - **buffer**: Bounded, growable output buffer for batched escape sequences
//! - **backend**: OS seam (termios raw mode, geometry, byte I/O) and the
//!   process-wide terminal lock
//! - **session**: `Session`, the raw-mode render session built on a backend
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Backend (TtyBackend on unix)
//! │   ├── TerminalLock (one per process)
//! │   └── saved termios mode
//! └── OutputBuffer (flushed by commit)
//! ```

pub mod backend;
pub mod buffer;
pub mod session;
