//! Helpers for logging player-authored text (room names, descriptions) on one line.

use std::fmt::Write;

/// Longest preview of a user string written to the log.
pub const LOG_PREVIEW_CHARS: usize = 80;

/// Escape control characters and cap the length so a description with embedded
/// newlines cannot break log lines apart.
pub fn escape_log(s: &str) -> String {
    escape_log_limited(s, LOG_PREVIEW_CHARS)
}

pub fn escape_log_limited(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
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
