//! In-place relocation of `.pc` files under a build output directory.
//!
//! This is the native counterpart of [`shell_command`](crate::shell::shell_command):
//! it finds every `*.pc` regular file below a root, runs
//! [`normalize`](crate::normalize::normalize) over it and writes the result
//! back. Files are replaced atomically (temporary file in the same directory,
//! then rename) with their original permissions, so read-only outputs are
//! handled the way `sed -i` handles them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::normalize::normalize;

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was rewritten.
    Rewritten,
    /// The file would be rewritten, but check mode is on.
    WouldRewrite,
    /// The file was already normalized.
    Unchanged,
}

impl FileOutcome {
    /// Whether the file's content differs from its normalized form.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Totals for one or more relocation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of `.pc` files read as text. Files in `skipped` are not counted.
    pub scanned: usize,
    /// Files rewritten, or that would be in check mode.
    pub changed: Vec<PathBuf>,
    /// Number of files already normalized.
    pub unchanged: usize,
    /// Files that could not be processed as text.
    pub skipped: Vec<PathBuf>,
}

impl Summary {
    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        self.scanned += 1;
        if outcome.is_change() {
            self.changed.push(path);
        } else {
            self.unchanged += 1;
        }
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: Summary) {
        self.scanned += other.scanned;
        self.changed.extend(other.changed);
        self.unchanged += other.unchanged;
        self.skipped.extend(other.skipped);
    }

    /// True when nothing needed (or needs) rewriting.
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Applies normalization to files on disk.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use libpcreloc::relocate::Relocator;
///
/// let summary = Relocator::new()
///     .relocate_tree(Path::new("/build/output"))
///     .unwrap();
/// println!("{} of {} files rewritten", summary.changed.len(), summary.scanned);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Relocator {
    check_only: bool,
    follow_links: bool,
}

impl Relocator {
    /// A relocator that rewrites files and does not follow symlinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report what would change without writing anything.
    pub fn check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }

    /// Follow symbolic links while walking directories.
    pub fn follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Normalize one file.
    ///
    /// # Errors
    ///
    /// [`Error::NotUtf8`] if the content is not UTF-8, [`Error::Io`] if it
    /// cannot be read or replaced.
    pub fn relocate_file(&self, path: &Path) -> Result<FileOutcome> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let content = String::from_utf8(bytes).map_err(|_| Error::NotUtf8 {
            path: path.to_path_buf(),
        })?;

        let normalized = normalize(&content);
        if normalized == content {
            debug!("{}: already relocatable", path.display());
            return Ok(FileOutcome::Unchanged);
        }

        if self.check_only {
            info!("{}: needs relocation", path.display());
            return Ok(FileOutcome::WouldRewrite);
        }

        replace_contents(path, &normalized)?;
        info!("{}: relocated", path.display());
        Ok(FileOutcome::Rewritten)
    }

    /// Normalize every `.pc` file below `root`.
    ///
    /// Files that are not UTF-8 are skipped with a warning.
    pub fn relocate_tree(&self, root: &Path) -> Result<Summary> {
        let mut summary = Summary::default();
        for path in find_pc_files(root, self.follow_links)? {
            match self.relocate_file(&path) {
                Ok(outcome) => summary.record(path, outcome),
                Err(Error::NotUtf8 { path }) => {
                    warn!("{}: not valid UTF-8, skipping", path.display());
                    summary.skipped.push(path);
                }
                Err(e) => return Err(e),
            }
        }
        debug!(
            "{}: {} scanned, {} changed, {} skipped",
            root.display(),
            summary.scanned,
            summary.changed.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Normalize `path`, walking it if it is a directory.
    pub fn relocate_path(&self, path: &Path) -> Result<Summary> {
        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if meta.is_dir() {
            return self.relocate_tree(path);
        }

        let mut summary = Summary::default();
        let outcome = self.relocate_file(path)?;
        summary.record(path.to_path_buf(), outcome);
        Ok(summary)
    }
}

/// Whether the file name matches `*.pc`.
pub fn is_pc_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(b".pc"))
}

/// Recursively collect `*.pc` regular files below `root`, sorted by path.
///
/// Symlinks are only considered when `follow_links` is set. Unreadable
/// subdirectories are reported and skipped; failing to read `root` itself
/// is an error.
pub fn find_pc_files(root: &Path, follow_links: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(follow_links) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                warn!("{e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if entry.file_type().is_file() && is_pc_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Atomically replace the contents of `path`, keeping its permissions.
///
/// A symlink is resolved first so the link itself survives.
fn replace_contents(path: &Path, contents: &str) -> Result<()> {
    let target = if fs::symlink_metadata(path)
        .map_err(|e| Error::io(path, e))?
        .file_type()
        .is_symlink()
    {
        fs::canonicalize(path).map_err(|e| Error::io(path, e))?
    } else {
        path.to_path_buf()
    };

    let permissions = fs::metadata(&target)
        .map_err(|e| Error::io(&target, e))?
        .permissions();
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(&target)
        .map_err(|e| Error::io(&target, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BUILD_PC: &str = "\
prefix=/build/tmp/output
exec_prefix=${prefix}
libdir=/build/tmp/output/lib
includedir=/build/tmp/output/include

Name: foo
Version: 1.0
";

    const RELOCATED_PC: &str = "\
prefix=${pcfiledir}/../..
exec_prefix=${prefix}
libdir=${exec_prefix}/lib
includedir=${prefix}/include

Name: foo
Version: 1.0
";

    fn write(dir: &TempDir, rel: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    // ── Discovery ───────────────────────────────────────────────────

    #[test]
    fn is_pc_file_matches_suffix() {
        assert!(is_pc_file(Path::new("/a/lib/pkgconfig/zlib.pc")));
        assert!(is_pc_file(Path::new(".pc")));
        assert!(!is_pc_file(Path::new("zlib.pc.in")));
        assert!(!is_pc_file(Path::new("zlib.pcx")));
        assert!(!is_pc_file(Path::new("/")));
    }

    #[test]
    fn find_pc_files_recurses_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(&dir, "share/pkgconfig/b.pc", b"");
        write(&dir, "lib/pkgconfig/a.pc", b"");
        write(&dir, "lib/pkgconfig/notes.txt", b"");
        write(&dir, "lib64/pkgconfig/deep/c.pc", b"");

        let files = find_pc_files(dir.path(), false).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            [
                PathBuf::from("lib/pkgconfig/a.pc"),
                PathBuf::from("lib64/pkgconfig/deep/c.pc"),
                PathBuf::from("share/pkgconfig/b.pc"),
            ]
        );
    }

    #[test]
    fn find_pc_files_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        assert!(find_pc_files(&dir.path().join("missing"), false).is_err());
    }

    // ── Single files ────────────────────────────────────────────────

    #[test]
    fn relocate_file_rewrites() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "lib/pkgconfig/foo.pc", BUILD_PC.as_bytes());

        let outcome = Relocator::new().relocate_file(&path).unwrap();
        assert_eq!(outcome, FileOutcome::Rewritten);
        assert_eq!(fs::read_to_string(&path).unwrap(), RELOCATED_PC);

        let outcome = Relocator::new().relocate_file(&path).unwrap();
        assert_eq!(outcome, FileOutcome::Unchanged);
    }

    #[test]
    fn check_only_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "foo.pc", BUILD_PC.as_bytes());

        let outcome = Relocator::new().check_only(true).relocate_file(&path).unwrap();
        assert_eq!(outcome, FileOutcome::WouldRewrite);
        assert_eq!(fs::read_to_string(&path).unwrap(), BUILD_PC);
    }

    #[test]
    fn non_utf8_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.pc", b"prefix=/x\xff\n");
        let err = Relocator::new().relocate_file(&path).unwrap_err();
        assert!(matches!(err, Error::NotUtf8 { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Relocator::new()
            .relocate_file(&dir.path().join("nope.pc"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_file_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ro.pc", BUILD_PC.as_bytes());
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();

        Relocator::new().relocate_file(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), RELOCATED_PC);
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }

    #[cfg(unix)]
    #[test]
    fn explicit_symlink_rewrites_target() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "real/foo.pc", BUILD_PC.as_bytes());
        let link = dir.path().join("link.pc");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        Relocator::new().relocate_file(&link).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), RELOCATED_PC);
    }

    // ── Trees ───────────────────────────────────────────────────────

    #[test]
    fn relocate_tree_summary() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "lib/pkgconfig/a.pc", BUILD_PC.as_bytes());
        write(&dir, "lib/pkgconfig/b.pc", RELOCATED_PC.as_bytes());
        let bad = write(&dir, "lib/pkgconfig/c.pc", b"\xff\xfe");
        write(&dir, "lib/pkgconfig/d.txt", BUILD_PC.as_bytes());

        let summary = Relocator::new().relocate_tree(dir.path()).unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.changed, vec![a.clone()]);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.skipped, vec![bad]);
        assert!(!summary.is_clean());

        assert_eq!(fs::read_to_string(&a).unwrap(), RELOCATED_PC);
        assert_eq!(
            fs::read_to_string(dir.path().join("lib/pkgconfig/d.txt")).unwrap(),
            BUILD_PC
        );

        let again = Relocator::new().relocate_tree(dir.path()).unwrap();
        assert!(again.is_clean());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_skipped_unless_followed() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = write(&outside, "foo.pc", BUILD_PC.as_bytes());
        std::os::unix::fs::symlink(&target, dir.path().join("foo.pc")).unwrap();

        let summary = Relocator::new().relocate_tree(dir.path()).unwrap();
        assert_eq!(summary.scanned, 0);

        let summary = Relocator::new()
            .follow_links(true)
            .relocate_tree(dir.path())
            .unwrap();
        assert_eq!(summary.scanned, 1);
        assert_eq!(fs::read_to_string(&target).unwrap(), RELOCATED_PC);
    }

    #[test]
    fn relocate_path_dispatches() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "x/foo.pc", BUILD_PC.as_bytes());

        let summary = Relocator::new().check_only(true).relocate_path(&file).unwrap();
        assert_eq!(summary.changed, vec![file.clone()]);

        let summary = Relocator::new().relocate_path(dir.path()).unwrap();
        assert_eq!(summary.changed, vec![file]);
    }

    #[test]
    fn summary_merge() {
        let mut a = Summary {
            scanned: 2,
            changed: vec![PathBuf::from("a.pc")],
            unchanged: 1,
            skipped: vec![],
        };
        a.merge(Summary {
            scanned: 1,
            changed: vec![],
            unchanged: 0,
            skipped: vec![PathBuf::from("b.pc")],
        });
        assert_eq!(a.scanned, 3);
        assert_eq!(a.changed.len(), 1);
        assert_eq!(a.skipped.len(), 1);
    }
}
