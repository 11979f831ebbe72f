//! `pcreloc` — rewrite pkg-config files so a build output can be relocated.
//!
//! Run it over an install prefix after `make install` (or any equivalent
//! step). Every `*.pc` file below the given directories gets its `prefix`,
//! `exec_prefix`, `libdir` and `includedir` rewritten relative to
//! `${pcfiledir}`.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use log::{LevelFilter, debug, warn};

use libpcreloc::normalize::{is_normalized, normalize};
use libpcreloc::relocate::{Relocator, Summary, find_pc_files};
use libpcreloc::shell::shell_command;
use libpcreloc::variables::resolve_paths;
use libpcreloc::{ENV_PCRELOC_LOG, VERSION};

/// Make pkg-config metadata relocatable.
///
/// Rewrites absolute `prefix`, `exec_prefix`, `libdir` and `includedir`
/// definitions in `.pc` files so they resolve relative to the file itself.
/// With no paths (or `-`), reads a `.pc` file on stdin and writes the result
/// to stdout.
#[derive(Parser, Debug)]
#[command(name = "pcreloc", version = VERSION, about, long_about = None)]
struct Cli {
    /// Do not write anything; list files that would change and exit 1 if any.
    #[arg(long)]
    check: bool,

    /// Print the equivalent `find`/`sed` command for each directory and exit.
    #[arg(long = "print-command", conflicts_with_all = ["check", "resolve"])]
    print_command: bool,

    /// Print the paths a pkg-config consumer would resolve for each file.
    #[arg(long)]
    resolve: bool,

    /// Follow symbolic links while walking directories.
    #[arg(short = 'L', long = "follow-links")]
    follow_links: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Base log level: off, error, warn, info, debug or trace.
    #[arg(long = "log-level", env = ENV_PCRELOC_LOG, value_name = "LEVEL", default_value = "warn")]
    log_level: LevelFilter,

    /// `.pc` files or directories to relocate.
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
}

impl Cli {
    /// Log level after applying `-v`/`-q` on top of `--log-level`.
    fn effective_level(&self) -> LevelFilter {
        const LEVELS: [LevelFilter; 6] = [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
            LevelFilter::Trace,
        ];

        if self.quiet {
            return LevelFilter::Error;
        }
        let base = LEVELS
            .iter()
            .position(|l| *l == self.log_level)
            .unwrap_or(2);
        LEVELS[(base + usize::from(self.verbose)).min(LEVELS.len() - 1)]
    }

    fn reads_stdin(&self) -> bool {
        match self.paths.as_slice() {
            [] => true,
            [only] => only.as_os_str() == "-",
            _ => false,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.effective_level());

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pcreloc: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(level: LevelFilter) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[pcreloc][{}] {}", record.level(), message))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .ok();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    if cli.print_command {
        return print_commands(&cli.paths);
    }

    if cli.reads_stdin() {
        return run_stdin(cli);
    }

    if cli.paths.iter().any(|p| p.as_os_str() == "-") {
        bail!("'-' (stdin) cannot be combined with other paths");
    }

    let relocator = Relocator::new()
        .check_only(cli.check)
        .follow_links(cli.follow_links);

    let mut summary = Summary::default();
    for path in &cli.paths {
        let part = relocator
            .relocate_path(path)
            .with_context(|| format!("failed to relocate '{}'", path.display()))?;
        summary.merge(part);
    }

    debug!(
        "{} files scanned, {} changed, {} unchanged, {} skipped",
        summary.scanned,
        summary.changed.len(),
        summary.unchanged,
        summary.skipped.len()
    );

    if cli.check {
        for path in &summary.changed {
            println!("{}", path.display());
        }
    }

    if cli.resolve {
        for path in &cli.paths {
            print_resolved(path, cli.follow_links)?;
        }
    }

    if cli.check && !summary.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// `--print-command`
fn print_commands(paths: &[PathBuf]) -> Result<ExitCode> {
    if paths.is_empty() {
        bail!("--print-command needs at least one directory");
    }
    for path in paths {
        let cmd = shell_command(path)?;
        println!("{cmd}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Filter mode: stdin to stdout, or a check of stdin.
fn run_stdin(cli: &Cli) -> Result<ExitCode> {
    if cli.resolve {
        bail!("--resolve needs file paths; pcfiledir is unknown for stdin");
    }

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    if cli.check {
        if is_normalized(&input) {
            return Ok(ExitCode::SUCCESS);
        }
        println!("<stdin>");
        return Ok(ExitCode::FAILURE);
    }

    print!("{}", normalize(&input));
    Ok(ExitCode::SUCCESS)
}

/// `--resolve`: print what a consumer would see for each `.pc` file under `path`.
fn print_resolved(path: &Path, follow_links: bool) -> Result<()> {
    let (files, named) = if path.is_dir() {
        (find_pc_files(path, follow_links)?, false)
    } else {
        (vec![path.to_path_buf()], true)
    };

    for file in files {
        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) if named => {
                return Err(e).with_context(|| format!("failed to read '{}'", file.display()));
            }
            Err(e) => {
                warn!("{}: {e}, not resolving", file.display());
                continue;
            }
        };
        let pcfiledir = match file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let resolved = resolve_paths(&content, pcfiledir)
            .with_context(|| format!("failed to resolve variables in '{}'", file.display()))?;

        println!("{}", file.display());
        for (name, value) in resolved.entries() {
            println!("  {name}={value}");
        }
    }
    Ok(())
}
