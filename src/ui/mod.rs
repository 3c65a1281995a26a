//! Text shaping helpers for drawing through a `Session`.

pub mod text;

pub use text::format_line;
