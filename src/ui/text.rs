//! Fixed-width line formatting

/// Build a line exactly `width` bytes wide.
///
/// Bytes before `offset` are spaces, `text` follows (cut to fit, newlines
/// turned into spaces) and the rest is padded with spaces. An `offset`
/// past `width` yields a blank line.
pub fn format_line(offset: usize, width: usize, text: impl AsRef<[u8]>) -> Vec<u8> {
    let text = text.as_ref();
    let offset = offset.min(width);
    let len = text.len().min(width - offset);

    let mut line = vec![b' '; width];
    for (dst, &b) in line[offset..offset + len].iter_mut().zip(text) {
        *dst = if b == b'\n' { b' ' } else { b };
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_and_offsets() {
        assert_eq!(format_line(2, 8, "abc"), b"  abc   ");
        assert_eq!(format_line(0, 3, ""), b"   ");
    }

    #[test]
    fn test_truncates_to_width() {
        assert_eq!(format_line(3, 6, "abcdef"), b"   abc");
        assert_eq!(format_line(0, 4, "abcdef"), b"abcd");
    }

    #[test]
    fn test_newlines_become_spaces() {
        assert_eq!(format_line(1, 7, "a\nb\n"), b" a b   ");
    }

    #[test]
    fn test_offset_past_width() {
        assert_eq!(format_line(10, 4, "abc"), b"    ");
        assert!(format_line(0, 0, "abc").is_empty());
    }

    #[test]
    fn test_always_exact_width() {
        let texts = ["", "x", "hello\nworld", "a much longer piece of text"];
        for width in 0..20 {
            for offset in 0..25 {
                for text in &texts {
                    let line = format_line(offset, width, text);
                    assert_eq!(line.len(), width);
                    assert!(line[..offset.min(width)].iter().all(|&b| b == b' '));
                    assert!(!line.contains(&b'\n'));
                }
            }
        }
    }
}
