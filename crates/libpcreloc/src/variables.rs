//! Variable definitions and expansion, as a pkg-config consumer sees them.
//!
//! This is used to check a relocated file: after [`normalize`] the path
//! variables only make sense once `${pcfiledir}` is known, so
//! [`resolve_paths`] expands them for a given file location.
//!
//! The line grammar follows pkgconf:
//!
//! - **Variable definitions**: `name=value`
//! - **Field declarations**: `Name: value` (ignored here)
//! - **Comments**: lines starting with `#`
//! - **Continuations**: a trailing `\` joins the next line
//!
//! [`normalize`]: crate::normalize::normalize

use std::path::Path;

use crate::error::{Error, Result};

/// Name of the built-in variable holding the `.pc` file's directory.
pub const PCFILEDIR: &str = "pcfiledir";

/// Maximum nesting of `${...}` expansion before assuming a cycle.
const MAX_EXPANSION_DEPTH: usize = 64;

/// Ordered variable definitions from a `.pc` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    entries: Vec<(String, String)>,
}

impl Variables {
    /// Collect the `key=value` definitions in `content`.
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        for line in LogicalLines::new(content) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = parse_variable(line) {
                entries.push((key.to_string(), value.to_string()));
            }
        }
        Self { entries }
    }

    /// Raw (unexpanded) value of `key`; the last definition wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Define `key` unless the file already does.
    pub fn define_default(&mut self, key: &str, value: &str) {
        if self.get(key).is_none() {
            self.entries.insert(0, (key.to_string(), value.to_string()));
        }
    }

    /// Number of definitions, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no definitions were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fully expand the value of `key`.
    ///
    /// Returns `Ok(None)` if `key` is not defined.
    pub fn expand(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        let lookup = |name: &str| self.get(name).map(str::to_string);
        expand_variables(raw, &lookup, false).map(Some)
    }
}

/// The install paths a consumer would compute for one `.pc` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub prefix: Option<String>,
    pub exec_prefix: Option<String>,
    pub libdir: Option<String>,
    pub includedir: Option<String>,
}

impl ResolvedPaths {
    /// `(name, value)` pairs for the defined paths, in a fixed order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("prefix", &self.prefix),
            ("exec_prefix", &self.exec_prefix),
            ("libdir", &self.libdir),
            ("includedir", &self.includedir),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// Expand the path variables of `content` as if the file lived in `pcfiledir`.
///
/// A `pcfiledir` defined by the file itself takes precedence, as in pkgconf.
///
/// # Errors
///
/// Fails on undefined or circular variable references.
pub fn resolve_paths(content: &str, pcfiledir: &Path) -> Result<ResolvedPaths> {
    let mut vars = Variables::parse(content);
    vars.define_default(PCFILEDIR, &pcfiledir.to_string_lossy());

    Ok(ResolvedPaths {
        prefix: vars.expand("prefix")?,
        exec_prefix: vars.expand("exec_prefix")?,
        libdir: vars.expand("libdir")?,
        includedir: vars.expand("includedir")?,
    })
}

/// Parse `line` as a variable definition.
///
/// A line is a definition when its first `=` comes before any `:` (ignoring
/// both inside `${...}`) and the key is a valid variable name.
fn parse_variable(line: &str) -> Option<(&str, &str)> {
    let eq = find_delimiter(line, '=')?;
    if find_delimiter(line, ':').is_some_and(|colon| colon < eq) {
        return None;
    }

    let key = line[..eq].trim();
    if !is_valid_variable_name(key) {
        return None;
    }
    Some((key, line[eq + 1..].trim()))
}

/// Find the byte offset of the first `delim` that is not inside a `${...}` block.
fn find_delimiter(line: &str, delim: char) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            i += 2;
            while i < bytes.len() && bytes[i] != b'}' {
                i += 1;
            }
            i += 1;
        } else if bytes[i] == delim as u8 {
            return Some(i);
        } else {
            i += 1;
        }
    }
    None
}

/// Valid names are ASCII letters, digits, `_`, `.` and `-`, not starting
/// with a digit or `-`.
fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

/// Joins continuation lines (ending with `\`) into logical lines.
struct LogicalLines<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> LogicalLines<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines(),
        }
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.lines.next()?;
        let Some(head) = first.strip_suffix('\\') else {
            return Some(first.to_string());
        };

        let mut buf = head.to_string();
        for next in self.lines.by_ref() {
            match next.strip_suffix('\\') {
                Some(part) => buf.push_str(part),
                None => {
                    buf.push_str(next);
                    break;
                }
            }
        }
        Some(buf)
    }
}

/// Expand `${name}` references in `value`.
///
/// `$$` is an escape for a literal `$`. An unterminated `${` is kept as-is.
/// Undefined names expand to nothing when `allow_undefined` is set and are
/// an error otherwise.
///
/// # Errors
///
/// Returns [`Error::UndefinedVariable`] or, when nesting exceeds 64 levels,
/// [`Error::CircularVariableReference`].
pub fn expand_variables<F>(value: &str, lookup: &F, allow_undefined: bool) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    expand_variables_depth(value, lookup, allow_undefined, 0)
}

fn expand_variables_depth<F>(
    value: &str,
    lookup: &F,
    allow_undefined: bool,
    depth: usize,
) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if depth > MAX_EXPANSION_DEPTH {
        return Err(Error::CircularVariableReference {
            variable: value.to_string(),
        });
    }

    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$$") {
            result.push('$');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("${") {
            let Some(end) = after.find('}') else {
                // Unterminated, emit literally.
                result.push_str(tail);
                return Ok(result);
            };
            let name = &after[..end];
            match lookup(name) {
                Some(resolved) => {
                    let expanded =
                        expand_variables_depth(&resolved, lookup, allow_undefined, depth + 1)?;
                    result.push_str(&expanded);
                }
                None if allow_undefined => {}
                None => {
                    return Err(Error::UndefinedVariable {
                        variable: name.to_string(),
                        context: value.to_string(),
                    });
                }
            }
            rest = &after[end + 1..];
        } else {
            result.push('$');
            rest = &tail[1..];
        }
    }
    result.push_str(rest);

    Ok(result)
}
