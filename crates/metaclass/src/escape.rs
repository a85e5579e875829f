//! Source-literal escaping for diagnostic text
//!
//! [`escape`] produces a single-quoted literal that evaluates back to the
//! input exactly. Everything outside printable ASCII is written as a hex
//! escape, so the output is pure ASCII.

use std::fmt::Write;

/// Escape a string as a single-quoted, round-trippable literal
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        push_escaped(&mut out, c);
    }
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\'' => out.push_str("\\'"),
        '\\' => out.push_str("\\\\"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\n' => out.push_str("\\n"),
        ' '..='~' => out.push(c),
        '\u{0}'..='\u{ff}' => {
            let _ = write!(out, "\\x{:02x}", c as u32);
        }
        '\u{100}'..='\u{ffff}' => {
            let _ = write!(out, "\\u{:04x}", c as u32);
        }
        _ => {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
}

/// Diagnostic description of an entity: `(new MetaClass('Name', [[prototype]]))`
pub fn describe(name: &str) -> String {
    format!("(new MetaClass({}, [[prototype]]))", escape(name))
}
