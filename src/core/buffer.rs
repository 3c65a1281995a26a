//! Batched output buffer
//!
//! Every drawing operation appends escape sequences and text here; nothing
//! reaches the terminal until the session commits the buffer.

use std::collections::TryReserveError;

use crossterm::Command;
use thiserror::Error;

/// Default initial allocation, matching a typical stdio `BUFSIZ`
pub const DEFAULT_CAPACITY: usize = 8192;

/// Default hard limit for a single frame of output
pub const DEFAULT_LIMIT: usize = 1 << 20;

/// Output buffer errors
#[derive(Error, Debug)]
pub enum BufferError {
    #[error("output buffer overflow: {needed} bytes needed, {available} available")]
    Overflow { needed: usize, available: usize },

    #[error("failed to allocate output buffer")]
    Alloc(#[source] TryReserveError),

    #[error("failed to encode escape sequence")]
    Encode(#[from] std::fmt::Error),
}

/// Growable byte buffer with an explicit upper bound.
///
/// Appends grow the allocation on demand up to `limit`. An append that does
/// not fit is rejected as a whole and leaves the buffer untouched.
#[derive(Debug)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl OutputBuffer {
    /// Allocate a buffer with `capacity` bytes reserved up front.
    ///
    /// `limit` is raised to `capacity` if it is smaller.
    pub fn new(capacity: usize, limit: usize) -> Result<Self, BufferError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity).map_err(BufferError::Alloc)?;
        Ok(Self {
            bytes,
            limit: limit.max(capacity),
        })
    }

    /// Bytes waiting to be committed
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in use
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Currently allocated capacity
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Hard upper bound on buffered bytes
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes that can still be appended before hitting the limit
    pub fn remaining(&self) -> usize {
        self.limit - self.bytes.len()
    }

    /// Append `data`, growing the allocation if needed.
    pub fn append(&mut self, data: &[u8]) -> Result<(), BufferError> {
        let available = self.remaining();
        if data.len() > available {
            return Err(BufferError::Overflow {
                needed: data.len(),
                available,
            });
        }
        self.bytes.try_reserve(data.len()).map_err(BufferError::Alloc)?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Append the ANSI encoding of a crossterm command.
    pub fn queue(&mut self, command: impl Command) -> Result<(), BufferError> {
        let encoded = encode(command)?;
        self.append(encoded.as_bytes())
    }

    /// Drop buffered bytes, keeping the allocation
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Render a crossterm command to its ANSI escape sequence.
pub fn encode(command: impl Command) -> Result<String, BufferError> {
    let mut out = String::new();
    command.write_ansi(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::cursor::{Hide, MoveTo};

    #[test]
    fn test_append_grows_until_limit() {
        let mut buf = OutputBuffer::new(4, 16).unwrap();
        buf.append(b"0123456789").unwrap();
        assert_eq!(buf.len(), 10);
        assert!(buf.capacity() >= 10);
        assert!(buf.len() <= buf.capacity());
        assert_eq!(buf.remaining(), 6);
    }

    #[test]
    fn test_overflow_is_rejected_whole() {
        let mut buf = OutputBuffer::new(8, 8).unwrap();
        buf.append(b"abcde").unwrap();

        match buf.append(b"fghij") {
            Err(BufferError::Overflow { needed, available }) => {
                assert_eq!(needed, 5);
                assert_eq!(available, 3);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        assert_eq!(buf.as_bytes(), b"abcde");

        // Exactly filling the limit is fine
        buf.append(b"fgh").unwrap();
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_limit_never_below_capacity() {
        let buf = OutputBuffer::new(64, 8).unwrap();
        assert_eq!(buf.limit(), 64);
    }

    #[test]
    fn test_queue_commands() {
        let mut buf = OutputBuffer::new(32, 64).unwrap();
        buf.queue(MoveTo(4, 2)).unwrap();
        buf.queue(Hide).unwrap();
        assert_eq!(buf.as_bytes(), b"\x1b[3;5H\x1b[?25l");

        buf.clear();
        assert!(buf.is_empty());
    }
}
