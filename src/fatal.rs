//! Unrecoverable errors.

use std::fmt::Display;

use tracing::error;

/// Report `reason` and terminate the process.
///
/// Destructors do not run after this, so any terminal restoration must
/// happen before calling it (see `Session::die`).
pub fn die(reason: impl Display) -> ! {
    error!("fatal: {}", reason);
    eprintln!("keyterm: {}", reason);
    std::process::exit(1)
}
