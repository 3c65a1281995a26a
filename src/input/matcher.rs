//! Incremental key combo matching
//!
//! Raw bytes are fed one at a time. The matcher keeps the bytes typed since
//! the last resolution (the combo) and checks them against a binding table
//! on every byte:
//!
//! ```text
//! byte → combo += byte
//!      → first binding whose pattern equals the combo  → Handled, combo cleared
//!      → else some pattern starts with the combo       → Pending
//!      → else                                          → Unrecognized, combo cleared
//! ```
//!
//! The table is passed on each call, so hosts can switch tables between
//! keystrokes (modal interfaces).

use tracing::{debug, warn};

use super::binding::Binding;
use super::token::Pattern;

/// Default maximum combo length
pub const DEFAULT_MAX_COMBO: usize = 5;

/// Outcome of feeding one byte, borrowing the matched action
#[derive(Debug, PartialEq)]
pub enum KeyResult<'t, A> {
    /// A binding matched completely
    Handled(&'t A),
    /// The combo is a prefix of at least one binding
    Pending,
    /// Nothing matches
    Unrecognized,
}

/// Outcome of feeding one byte, without the action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStatus {
    Handled,
    Pending,
    Unrecognized,
}

impl<A> KeyResult<'_, A> {
    pub fn status(&self) -> KeyStatus {
        match self {
            KeyResult::Handled(_) => KeyStatus::Handled,
            KeyResult::Pending => KeyStatus::Pending,
            KeyResult::Unrecognized => KeyStatus::Unrecognized,
        }
    }
}

/// How a combo relates to one pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Full,
    Prefix,
    Miss,
}

fn fit(pattern: &Pattern, combo: &[u8]) -> Fit {
    let tokens = pattern.tokens();
    if combo.len() > tokens.len() {
        return Fit::Miss;
    }
    if !tokens.iter().zip(combo).all(|(token, &b)| token.matches(b)) {
        return Fit::Miss;
    }
    if combo.len() == tokens.len() {
        Fit::Full
    } else {
        Fit::Prefix
    }
}

/// Resolves raw input bytes against binding tables
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    combo: Vec<u8>,
    max_combo: usize,
}

impl Default for KeyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMBO)
    }
}

impl KeyMatcher {
    /// Create a matcher whose combo holds at most `max_combo` bytes.
    pub fn new(max_combo: usize) -> Self {
        let max_combo = max_combo.max(1);
        Self {
            combo: Vec::with_capacity(max_combo),
            max_combo,
        }
    }

    /// Bytes typed since the last resolution
    pub fn pending(&self) -> &[u8] {
        &self.combo
    }

    pub fn max_combo(&self) -> usize {
        self.max_combo
    }

    /// Forget the current combo
    pub fn reset(&mut self) {
        self.combo.clear();
    }

    /// Bindings longer than the combo capacity; these can never fire.
    pub fn unreachable<'t, A>(&self, table: &'t [Binding<A>]) -> Vec<&'t Binding<A>> {
        table
            .iter()
            .filter(|binding| binding.pattern.len() > self.max_combo)
            .collect()
    }

    /// Feed one raw byte and resolve the combo against `table`.
    ///
    /// Table order is the only precedence: the first binding that fully
    /// matches wins, even if an earlier binding is still a live prefix.
    pub fn handle_key<'t, A>(&mut self, byte: u8, table: &'t [Binding<A>]) -> KeyResult<'t, A> {
        if self.combo.len() >= self.max_combo {
            warn!("Key combo full ({} bytes), starting over", self.combo.len());
            self.combo.clear();
        }
        self.combo.push(byte);

        let mut pending = false;
        for binding in table {
            match fit(&binding.pattern, &self.combo) {
                Fit::Full => {
                    debug!("Key combo {:?} matched {}", self.combo, binding.pattern);
                    self.combo.clear();
                    return KeyResult::Handled(&binding.action);
                }
                Fit::Prefix => pending = true,
                Fit::Miss => {}
            }
        }

        if pending {
            KeyResult::Pending
        } else {
            debug!("Key combo {:?} unrecognized", self.combo);
            self.combo.clear();
            KeyResult::Unrecognized
        }
    }

    /// Feed one raw byte and run `invoke` on the matched action, if any.
    pub fn dispatch<A, F>(&mut self, byte: u8, table: &[Binding<A>], invoke: F) -> KeyStatus
    where
        F: FnOnce(&A),
    {
        let result = self.handle_key(byte, table);
        if let KeyResult::Handled(action) = result {
            invoke(action);
        }
        result.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::token::ctrl;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Act {
        A,
        B,
        C,
    }

    fn table(entries: &[(&str, Act)]) -> Vec<Binding<Act>> {
        entries
            .iter()
            .map(|&(keys, act)| Binding::parse(keys, act).unwrap())
            .collect()
    }

    #[test]
    fn test_ctrl_and_literal_prefix() {
        let t = table(&[("^a", Act::A), ("ab", Act::B)]);
        let mut m = KeyMatcher::default();

        assert_eq!(m.handle_key(0x01, &t), KeyResult::Handled(&Act::A));
        assert!(m.pending().is_empty());

        assert_eq!(m.handle_key(b'a', &t), KeyResult::Pending);
        assert_eq!(m.pending(), b"a");
        assert_eq!(m.handle_key(b'b', &t), KeyResult::Handled(&Act::B));
        assert!(m.pending().is_empty());
    }

    #[test]
    fn test_special_tokens_fire() {
        let t = table(&[("/b", Act::A), ("/r", Act::B), ("^^", Act::C), ("//", Act::A)]);
        let mut m = KeyMatcher::default();

        assert_eq!(m.handle_key(0x08, &t), KeyResult::Handled(&Act::A));
        assert_eq!(m.handle_key(0x0d, &t), KeyResult::Handled(&Act::B));
        assert_eq!(m.handle_key(b'^', &t), KeyResult::Handled(&Act::C));
        assert_eq!(m.handle_key(b'/', &t), KeyResult::Handled(&Act::A));
        assert_eq!(m.handle_key(b'b', &t), KeyResult::Unrecognized);
    }

    #[test]
    fn test_empty_table_does_not_grow_combo() {
        let t: Vec<Binding<Act>> = Vec::new();
        let mut m = KeyMatcher::default();
        for _ in 0..100 {
            assert_eq!(m.handle_key(b'z', &t), KeyResult::Unrecognized);
            assert!(m.pending().is_empty());
        }
    }

    #[test]
    fn test_first_full_match_wins() {
        let t = table(&[("x", Act::A), ("x", Act::B)]);
        let mut m = KeyMatcher::default();
        assert_eq!(m.handle_key(b'x', &t), KeyResult::Handled(&Act::A));
    }

    #[test]
    fn test_later_full_match_beats_earlier_prefix() {
        let t = table(&[("gg", Act::A), ("g", Act::B)]);
        let mut m = KeyMatcher::default();
        assert_eq!(m.handle_key(b'g', &t), KeyResult::Handled(&Act::B));
    }

    #[test]
    fn test_divergent_combo_resets() {
        let t = table(&[("abc", Act::A), ("x", Act::B)]);
        let mut m = KeyMatcher::default();
        assert_eq!(m.handle_key(b'a', &t), KeyResult::Pending);
        assert_eq!(m.handle_key(b'b', &t), KeyResult::Pending);
        assert_eq!(m.handle_key(b'x', &t), KeyResult::Unrecognized);
        assert!(m.pending().is_empty());
        assert_eq!(m.handle_key(b'x', &t), KeyResult::Handled(&Act::B));
    }

    #[test]
    fn test_combo_never_exceeds_capacity() {
        let t = table(&[("aaaaaaa", Act::A)]);
        let mut m = KeyMatcher::new(3);
        for _ in 0..10 {
            let _ = m.handle_key(b'a', &t);
            assert!(m.pending().len() <= 3);
        }
    }

    #[test]
    fn test_unreachable_bindings() {
        let t = table(&[("abc", Act::A), ("abcd", Act::B), ("x", Act::C)]);
        let m = KeyMatcher::new(3);
        let long: Vec<Act> = m.unreachable(&t).iter().map(|b| b.action).collect();
        assert_eq!(long, vec![Act::B]);
        assert!(KeyMatcher::default().unreachable(&t).is_empty());
    }

    #[test]
    fn test_ctrl_combo_sequence() {
        let t = table(&[("^x^s", Act::A), ("^x^c", Act::B)]);
        let mut m = KeyMatcher::default();
        assert_eq!(m.handle_key(ctrl(b'x'), &t), KeyResult::Pending);
        assert_eq!(m.handle_key(ctrl(b'c'), &t), KeyResult::Handled(&Act::B));
    }

    #[test]
    fn test_table_swap_between_keys() {
        let normal = table(&[("i", Act::A)]);
        let insert = table(&[("/r", Act::B)]);
        let mut m = KeyMatcher::default();
        assert_eq!(m.handle_key(b'i', &normal), KeyResult::Handled(&Act::A));
        assert_eq!(m.handle_key(b'i', &insert), KeyResult::Unrecognized);
        assert_eq!(m.handle_key(b'\r', &insert), KeyResult::Handled(&Act::B));
    }

    #[test]
    fn test_dispatch_is_deterministic() {
        let t = table(&[("^a", Act::A), ("ab", Act::B), ("abc", Act::C)]);
        let input = b"\x01abzab\x01ac";

        let run = || {
            let mut m = KeyMatcher::default();
            let mut fired = Vec::new();
            let statuses: Vec<KeyStatus> = input
                .iter()
                .map(|&b| m.dispatch(b, &t, |act| fired.push(*act)))
                .collect();
            (statuses, fired)
        };

        let (statuses, fired) = run();
        assert_eq!(
            statuses,
            vec![
                KeyStatus::Handled,
                KeyStatus::Pending,
                KeyStatus::Handled,
                KeyStatus::Unrecognized,
                KeyStatus::Pending,
                KeyStatus::Handled,
                KeyStatus::Handled,
                KeyStatus::Pending,
                KeyStatus::Unrecognized,
            ]
        );
        assert_eq!(fired, vec![Act::A, Act::B, Act::B, Act::A]);
        assert_eq!(run(), (statuses, fired));
    }
}
