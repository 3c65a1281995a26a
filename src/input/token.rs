//! Key pattern tokens
//!
//! A binding pattern is written as a short string and parsed once into
//! typed tokens. Each token matches exactly one raw input byte.
//!
//! | Syntax | Token | Matches |
//! |--------|-------|---------|
//! | `x` | `Literal(b'x')` | `x` |
//! | `^x` | `Ctrl(b'x')` | ctrl+x (`x & 0x1f`) |
//! | `/b` | `Backspace` | `0x08` |
//! | `/r` | `Enter` | `0x0d` |
//! | `^^` | `Caret` | `^` |
//! | `//` | `Slash` | `/` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Backspace as delivered in raw mode
pub const KEY_BACKSPACE: u8 = 0x08;
/// Carriage return (Enter) as delivered in raw mode
pub const KEY_ENTER: u8 = 0x0d;

const CTRL_MASK: u8 = 0x1f;
const CTRL_PREFIX: u8 = b'^';
const ESCAPE_PREFIX: u8 = b'/';

/// Raw byte produced by pressing ctrl together with `key`
pub const fn ctrl(key: u8) -> u8 {
    key & CTRL_MASK
}

/// Pattern parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty key pattern")]
    Empty,

    #[error("pattern {pattern:?} ends with a dangling '{prefix}'")]
    Dangling { pattern: String, prefix: char },

    #[error("unknown escape '/{escape}' in pattern {pattern:?}")]
    UnknownEscape { pattern: String, escape: char },

    #[error("non-ASCII key {key:?} in pattern {pattern:?}")]
    NonAscii { pattern: String, key: char },
}

/// One matchable unit of a key pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(u8),
    Ctrl(u8),
    Backspace,
    Enter,
    Caret,
    Slash,
}

impl Token {
    /// Whether the raw input byte `pressed` satisfies this token
    pub fn matches(self, pressed: u8) -> bool {
        match self {
            Token::Literal(b) => pressed == b,
            Token::Ctrl(key) => pressed.is_ascii_control() && ctrl(pressed) == ctrl(key),
            Token::Backspace => pressed == KEY_BACKSPACE,
            Token::Enter => pressed == KEY_ENTER,
            Token::Caret => pressed == CTRL_PREFIX,
            Token::Slash => pressed == ESCAPE_PREFIX,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Token::Literal(b) => write!(f, "{}", b as char),
            Token::Ctrl(key) => write!(f, "^{}", key as char),
            Token::Backspace => f.write_str("/b"),
            Token::Enter => f.write_str("/r"),
            Token::Caret => f.write_str("^^"),
            Token::Slash => f.write_str("//"),
        }
    }
}

/// A parsed key pattern: a non-empty token sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    tokens: Vec<Token>,
}

impl Pattern {
    pub fn new(tokens: Vec<Token>) -> Result<Self, PatternError> {
        if tokens.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of input bytes a full match consumes
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Parse the textual pattern syntax into tokens.
///
/// Patterns are ASCII only; each token stands for a single raw byte.
pub fn parse_pattern(pattern: &str) -> Result<Pattern, PatternError> {
    if let Some(key) = pattern.chars().find(|c| !c.is_ascii()) {
        return Err(PatternError::NonAscii {
            pattern: pattern.to_string(),
            key,
        });
    }
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != CTRL_PREFIX && b != ESCAPE_PREFIX {
            tokens.push(Token::Literal(b));
            i += 1;
            continue;
        }

        let next = match bytes.get(i + 1) {
            Some(&next) => next,
            None => {
                return Err(PatternError::Dangling {
                    pattern: pattern.to_string(),
                    prefix: b as char,
                })
            }
        };
        let token = match (b, next) {
            (CTRL_PREFIX, CTRL_PREFIX) => Token::Caret,
            (CTRL_PREFIX, key) => Token::Ctrl(key),
            (_, ESCAPE_PREFIX) => Token::Slash,
            (_, b'b') => Token::Backspace,
            (_, b'r') => Token::Enter,
            (_, other) => {
                return Err(PatternError::UnknownEscape {
                    pattern: pattern.to_string(),
                    escape: other as char,
                })
            }
        };
        tokens.push(token);
        i += 2;
    }

    Pattern::new(tokens)
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_pattern(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_pattern(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
