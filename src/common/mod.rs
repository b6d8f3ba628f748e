//! Common utilities shared by the CLI and the harness core

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Render bytes for a human reader, replacing invalid UTF-8
/// and cutting at `max` characters.
pub fn excerpt(bytes: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut out: String = text.chars().take(max).collect();
    if text.chars().nth(max).is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short() {
        assert_eq!(excerpt(b"hello", 10), "hello");
    }

    #[test]
    fn test_excerpt_truncates() {
        assert_eq!(excerpt(b"hello world", 5), "hello...");
    }

    #[test]
    fn test_excerpt_lossy() {
        assert_eq!(excerpt(&[b'a', 0xff, b'b'], 10), "a\u{fffd}b");
    }
}
