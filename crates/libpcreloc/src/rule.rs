//! The rewrite rules applied to path variables in `.pc` files.
//!
//! Each [`Rule`] replaces a whole `key=value` line with a fixed line that
//! refers back to other variables, ending at `${pcfiledir}`. pkg-config
//! defines `pcfiledir` at query time as the directory holding the `.pc`
//! file, so the rewritten file keeps working after the tree is moved.
//!
//! The same table drives both the in-process normalizer and the generated
//! `sed` script, so the two cannot drift apart.

/// A single whole-line rewrite for one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Variable name on the left of `=`.
    pub key: &'static str,
    /// Required ending of the value, if any. The suffix must end the line.
    pub suffix: Option<&'static str>,
    /// New value. The `${...}` sequences are emitted literally for pkg-config.
    pub replacement: &'static str,
}

/// All rules, in evaluation order.
///
/// `lib64` is listed before `lib`; a value can end in at most one of them,
/// so the order only decides which check runs first.
pub const RULES: &[Rule] = &[
    Rule {
        key: "prefix",
        suffix: None,
        replacement: "${pcfiledir}/../..",
    },
    Rule {
        key: "exec_prefix",
        suffix: None,
        replacement: "${prefix}",
    },
    Rule {
        key: "libdir",
        suffix: Some("/lib64"),
        replacement: "${exec_prefix}/lib64",
    },
    Rule {
        key: "libdir",
        suffix: Some("/lib"),
        replacement: "${exec_prefix}/lib",
    },
    Rule {
        key: "includedir",
        suffix: Some("/include"),
        replacement: "${prefix}/include",
    },
];

impl Rule {
    /// Whether `line` is a definition of this rule's variable that the rule rewrites.
    ///
    /// The line must start with `key=` exactly (no leading whitespace, no space
    /// before `=`). For suffixed rules the rest of the line must end with the
    /// suffix.
    pub fn matches(&self, line: &str) -> bool {
        let Some(value) = line
            .strip_prefix(self.key)
            .and_then(|rest| rest.strip_prefix('='))
        else {
            return false;
        };

        match self.suffix {
            Some(suffix) => value.ends_with(suffix),
            None => true,
        }
    }

    /// The rewritten line if this rule matches `line`.
    pub fn apply(&self, line: &str) -> Option<String> {
        self.matches(line).then(|| self.replacement_line())
    }

    /// The full `key=replacement` line this rule produces.
    pub fn replacement_line(&self) -> String {
        format!("{}={}", self.key, self.replacement)
    }

    /// The `sed` substitution performing this rewrite.
    ///
    /// Uses `|` as the delimiter since paths contain `/`. The result must be
    /// single-quoted when passed through a shell.
    pub fn sed_expression(&self) -> String {
        match self.suffix {
            Some(suffix) => format!(
                "s|^{}=.*{}$|{}|",
                self.key,
                suffix,
                self.replacement_line()
            ),
            None => format!("s|^{}=.*|{}|", self.key, self.replacement_line()),
        }
    }
}

/// Find the first rule that rewrites `line`.
pub fn find_rule(line: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.matches(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_rule_ignores_value() {
        let rule = find_rule("prefix=/opt/.tangram/tmp/abc123/output").unwrap();
        assert_eq!(rule.key, "prefix");
        assert!(rule.matches("prefix="));
        assert!(rule.matches("prefix=anything at all"));
    }

    #[test]
    fn key_must_be_followed_by_equals() {
        assert!(find_rule("prefix_extra=/usr").is_none());
        assert!(find_rule("prefix =/usr").is_none());
        assert!(find_rule(" prefix=/usr").is_none());
        assert!(find_rule("prefix").is_none());
    }

    #[test]
    fn lib64_checked_before_lib() {
        let rule = find_rule("libdir=/some/path/lib64").unwrap();
        assert_eq!(rule.suffix, Some("/lib64"));

        let rule = find_rule("libdir=/some/path/lib").unwrap();
        assert_eq!(rule.suffix, Some("/lib"));
    }

    #[test]
    fn suffix_must_end_the_line() {
        assert!(find_rule("libdir=/usr/lib/x86_64-linux-gnu").is_none());
        assert!(find_rule("libdir=/usr/lib/").is_none());
        assert!(find_rule("includedir=/usr/include/glib-2.0").is_none());
        assert!(find_rule("libdir=/usr/mylib").is_none());
    }

    #[test]
    fn bare_suffix_value_matches() {
        assert_eq!(
            find_rule("libdir=/lib").map(Rule::replacement_line),
            Some("libdir=${exec_prefix}/lib".to_string())
        );
    }

    #[test]
    fn every_replacement_matches_its_own_rule() {
        for rule in RULES {
            let line = rule.replacement_line();
            assert_eq!(find_rule(&line), Some(rule), "{line}");
        }
    }

    #[test]
    fn replacement_is_literal() {
        let rule = &RULES[0];
        assert_eq!(rule.replacement_line(), "prefix=${pcfiledir}/../..");
    }

    #[test]
    fn lib_and_lib64_exclusive() {
        for line in ["libdir=/a/lib", "libdir=/a/lib64", "libdir=/lib64", "libdir=/lib"] {
            let count = RULES.iter().filter(|r| r.matches(line)).count();
            assert_eq!(count, 1, "{line}");
        }
    }

    #[test]
    fn sed_expressions() {
        let exprs: Vec<String> = RULES.iter().map(Rule::sed_expression).collect();
        assert_eq!(
            exprs,
            [
                "s|^prefix=.*|prefix=${pcfiledir}/../..|",
                "s|^exec_prefix=.*|exec_prefix=${prefix}|",
                "s|^libdir=.*/lib64$|libdir=${exec_prefix}/lib64|",
                "s|^libdir=.*/lib$|libdir=${exec_prefix}/lib|",
                "s|^includedir=.*/include$|includedir=${prefix}/include|",
            ]
        );
    }
}
