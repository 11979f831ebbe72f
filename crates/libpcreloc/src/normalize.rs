//! Line-by-line normalization of `.pc` file content.
//!
//! [`normalize`] rewrites the `prefix`, `exec_prefix`, `libdir` and
//! `includedir` definitions according to [`RULES`](crate::rule::RULES) and
//! passes every other line through untouched. The transformation is total,
//! preserves line structure, and is idempotent.
//!
//! # Example
//!
//! ```
//! use libpcreloc::normalize::normalize;
//!
//! let input = "prefix=/build/out\nlibdir=/build/out/lib\n\nName: zlib\n";
//! assert_eq!(
//!     normalize(input),
//!     "prefix=${pcfiledir}/../..\nlibdir=${exec_prefix}/lib\n\nName: zlib\n"
//! );
//! ```

use std::borrow::Cow;

use crate::rule::find_rule;

/// Normalize the full text of a `.pc` file.
///
/// Lines are split on `\n` only and re-joined with `\n`, so the output has
/// exactly as many lines as the input and keeps (or lacks) a trailing newline
/// the same way. A `\r` before the newline stays part of the line.
pub fn normalize(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 64);
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&normalize_line(line));
    }
    out
}

/// Normalize a single line (without its terminator).
pub fn normalize_line(line: &str) -> Cow<'_, str> {
    match find_rule(line) {
        Some(rule) => Cow::Owned(rule.replacement_line()),
        None => Cow::Borrowed(line),
    }
}

/// Whether `content` is already in normalized form.
pub fn is_normalized(content: &str) -> bool {
    content.split('\n').all(|line| normalize_line(line) == line)
}
