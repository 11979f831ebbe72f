//! Generate a shell command that relocates `.pc` files with `find` and `sed`.
//!
//! This is for build pipelines that run phases as shell scripts. The command
//! performs the same rewrite as [`normalize`](crate::normalize::normalize),
//! in place, for every `*.pc` file under a directory.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{Error, Result};
use crate::rule::RULES;

/// The `sed` expressions for all rules, in rule order, unquoted.
pub fn sed_script() -> Vec<String> {
    RULES.iter().map(|rule| rule.sed_expression()).collect()
}

/// Build the `find ... -exec sed -i ... {} \;` command for `output_dir`.
///
/// The directory is quoted for a POSIX shell. The sed expressions are
/// single-quoted so the shell leaves `${...}` alone.
///
/// # Errors
///
/// Returns [`Error::UnquotablePath`] if the path is not UTF-8 or contains a
/// NUL byte.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use libpcreloc::shell::shell_command;
///
/// let cmd = shell_command(Path::new("/build/output")).unwrap();
/// assert!(cmd.starts_with("find /build/output -type f -name '*.pc' -exec sed -i"));
/// assert!(cmd.ends_with("{} \\;"));
/// ```
pub fn shell_command(output_dir: &Path) -> Result<String> {
    let unquotable = || Error::UnquotablePath {
        path: output_dir.to_path_buf(),
    };
    let dir = output_dir.to_str().ok_or_else(unquotable)?;
    // `find` would read a leading `-` as a predicate.
    let dir = if dir.starts_with('-') {
        Cow::Owned(format!("./{dir}"))
    } else {
        Cow::Borrowed(dir)
    };
    let dir = shlex::try_quote(&dir).map_err(|_| unquotable())?;

    let mut cmd = format!("find {dir} -type f -name '*.pc' -exec sed -i");
    for expr in sed_script() {
        debug_assert!(!expr.contains('\''));
        cmd.push_str(" -e '");
        cmd.push_str(&expr);
        cmd.push('\'');
    }
    cmd.push_str(" {} \\;");
    Ok(cmd)
}
