//! Logging helpers for player- and author-entered text.
//! Answers and questions can hold anything, so they are escaped onto a single
//! line and capped in length before reaching the log.

use std::fmt::Write;

/// Default preview length for logged user text.
pub const MAX_PREVIEW: usize = 120;

/// Escape `s` for single-line logging, truncated at [`MAX_PREVIEW`] characters.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, MAX_PREVIEW)
}

/// Escape newlines, tabs, backslashes and other control characters, keeping
/// at most `limit` characters of input and marking the cut with an ellipsis.
pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
