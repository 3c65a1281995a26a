//! keyterm - raw terminal sessions with multi-key bindings
//!
//! keyterm takes exclusive raw control of the controlling terminal, batches
//! drawing into a single escape-sequence buffer, and resolves raw key bytes
//! into (possibly multi-key) combos bound to actions.
//!
//! # Modules
//!
//! - **core**: `Session`, its output buffer and terminal backends
//! - **input**: Key pattern parsing and the combo matcher
//! - **ui**: Text shaping helpers
//! - **config**: TOML configuration
//! - **fatal**: Report-and-exit for unrecoverable errors
//!
//! # Event loop
//!
//! ```text
//! session.read_key() → matcher.handle_key(byte, &table)
//!     Handled(action) → action draws via session
//!     Pending         → wait for the next byte
//!     Unrecognized    → combo dropped
//! session.commit()
//! ```
//!
//! The session never calls into the matcher.

pub mod config;
pub mod core;
pub mod fatal;
pub mod input;
pub mod ui;

pub use crate::core::backend::{Backend, TerminalLock};
#[cfg(unix)]
pub use crate::core::backend::TtyBackend;
pub use crate::core::buffer::{BufferError, OutputBuffer};
pub use crate::core::session::{Session, SessionConfig, SessionError};
pub use crate::input::{Binding, KeyMatcher, KeyResult, KeyStatus, Pattern, Token};
pub use crate::ui::format_line;
