//! Key bindings
//!
//! A binding pairs a parsed pattern with a host-defined action. The action
//! type is generic so each host carries its own typed payload; `Arg` is
//! the loosely typed argument config files attach to a binding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::token::{parse_pattern, Pattern, PatternError};

/// A pattern bound to an action
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<A> {
    pub pattern: Pattern,
    pub action: A,
}

impl<A> Binding<A> {
    pub fn new(pattern: Pattern, action: A) -> Self {
        Self { pattern, action }
    }

    /// Build a binding from the textual pattern syntax
    pub fn parse(keys: &str, action: A) -> Result<Self, PatternError> {
        Ok(Self::new(parse_pattern(keys)?, action))
    }
}

/// Small tagged argument value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Arg {
    #[default]
    None,
    Int(i64),
    Uint(u64),
    Str(String),
}

impl Arg {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Arg::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Arg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Arg::None => serializer.serialize_none(),
            Arg::Int(i) => serializer.serialize_i64(*i),
            Arg::Uint(u) => serializer.serialize_u64(*u),
            Arg::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Arg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        // Config integers are always signed; `Uint` is only built in code
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(i) => Arg::Int(i),
            Raw::Str(s) => Arg::Str(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::token::Token;

    #[test]
    fn test_parse_binding() {
        let b = Binding::parse("^xs", "save").unwrap();
        assert_eq!(b.pattern.tokens(), &[Token::Ctrl(b'x'), Token::Literal(b's')]);
        assert_eq!(b.action, "save");
        assert!(Binding::parse("", ()).is_err());
    }

    #[test]
    fn test_arg_accessors() {
        assert_eq!(Arg::Str("hi".into()).as_str(), Some("hi"));
        assert_eq!(Arg::Uint(3).as_uint(), Some(3));
        assert_eq!(Arg::None.as_int(), None);
        assert_eq!(Arg::default(), Arg::None);
    }

    #[test]
    fn test_arg_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            arg: Arg,
        }
        let doc: Doc = toml::from_str("arg = -7").unwrap();
        assert_eq!(doc.arg, Arg::Int(-7));
        let doc: Doc = toml::from_str(r#"arg = "hi""#).unwrap();
        assert_eq!(doc.arg, Arg::Str("hi".into()));
        assert!(toml::from_str::<Doc>("arg = true").is_err());
    }
}
