//! `libpcreloc` — make pkg-config metadata relocatable.
//!
//! Build systems usually install `.pc` files with the absolute build-time
//! prefix baked in:
//!
//! ```text
//! prefix=/build/tmp/abc123/output
//! libdir=/build/tmp/abc123/output/lib
//! ```
//!
//! Once the output is moved (into a content-addressed store, a cache, a
//! different machine) those paths are wrong. This crate rewrites them to be
//! relative to the `.pc` file itself through pkg-config's built-in
//! `${pcfiledir}` variable, so the metadata stays valid wherever the tree ends
//! up.
//!
//! # Architecture
//!
//! - [`rule`] — The rewrite rules for `prefix`, `exec_prefix`, `libdir`, `includedir`
//! - [`normalize`] — Pure text normalization of `.pc` content
//! - [`relocate`] — Finding `.pc` files under a directory and rewriting them in place
//! - [`shell`] — The equivalent `find`/`sed` command for shell-driven build phases
//! - [`variables`] — Variable expansion, to see what a consumer resolves after relocation
//! - [`error`] — Error types and result aliases
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use libpcreloc::normalize::normalize;
//! use libpcreloc::variables::resolve_paths;
//!
//! let pc = normalize("prefix=/build/out\nexec_prefix=/build/out\nlibdir=/build/out/lib64\n");
//! assert_eq!(pc, "prefix=${pcfiledir}/../..\nexec_prefix=${prefix}\nlibdir=${exec_prefix}/lib64\n");
//!
//! let paths = resolve_paths(&pc, Path::new("/store/xyz/lib64/pkgconfig")).unwrap();
//! assert_eq!(paths.libdir.as_deref(), Some("/store/xyz/lib64/pkgconfig/../../lib64"));
//! ```

pub mod error;
pub mod normalize;
pub mod relocate;
pub mod rule;
pub mod shell;
pub mod variables;

pub use error::{Error, Result};
pub use normalize::normalize;
pub use relocate::{FileOutcome, Relocator, Summary};

/// The version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The `PCRELOC_LOG` environment variable name, read by the `pcreloc` binary
/// to pick a log level.
pub const ENV_PCRELOC_LOG: &str = "PCRELOC_LOG";
