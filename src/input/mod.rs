//! Key input handling.
//!
//! - **token**: Pattern syntax (`^x`, `/b`, `/r`, `^^`, `//`) parsed into typed tokens
//! - **binding**: Patterns bound to host actions
//! - **matcher**: Incremental multi-key combo resolution
//!
//! # Example
//!
//! ```
//! use keyterm::input::{Binding, KeyMatcher, KeyResult};
//!
//! let table = vec![
//!     Binding::parse("^q", "quit").unwrap(),
//!     Binding::parse("gg", "top").unwrap(),
//! ];
//! let mut matcher = KeyMatcher::default();
//! assert_eq!(matcher.handle_key(b'g', &table), KeyResult::Pending);
//! assert_eq!(matcher.handle_key(b'g', &table), KeyResult::Handled(&"top"));
//! ```

pub mod binding;
pub mod matcher;
pub mod token;

pub use binding::{Arg, Binding};
pub use matcher::{KeyMatcher, KeyResult, KeyStatus, DEFAULT_MAX_COMBO};
pub use token::{ctrl, parse_pattern, Pattern, PatternError, Token, KEY_BACKSPACE, KEY_ENTER};
