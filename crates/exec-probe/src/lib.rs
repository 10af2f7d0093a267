//! # exec-probe
//!
//! Find out whether an external program is usable before relying on it.
//!
//! ## How it works
//!
//! [`locate`] resolves a program the same way a shell would:
//!
//! 1. A name containing a path separator is checked as-is (relative to the
//!    current directory when relative).
//! 2. A bare name is searched in each `PATH` entry in order; on Windows every
//!    `PATHEXT` extension is tried too.
//!
//! [`version`] runs the located program with its version flag and returns
//! the first non-empty line it prints.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use exec_probe::{locate, version};
//!
//! let qpdf = locate("qpdf").expect("qpdf not installed");
//! println!("{} ({})", qpdf.display(), version(&qpdf, "--version").unwrap());
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by exec-probe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// An explicit path does not point at an executable file.
    #[error("'{program}' does not exist or is not executable")]
    NotFound { program: String },

    /// A bare program name was not found in any `PATH` directory.
    #[error("'{program}' not found on PATH")]
    NotOnPath { program: String },

    /// The program exists but could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but printed nothing usable.
    #[error("'{program}' printed no version information (exit: {status})")]
    NoVersion { program: String, status: String },
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve `program` to an existing executable file.
pub fn locate(program: impl AsRef<OsStr>) -> Result<PathBuf, ProbeError> {
    let program = program.as_ref();
    let as_path = Path::new(program);

    if has_separator(as_path) {
        return if is_executable(as_path) {
            Ok(as_path.to_path_buf())
        } else {
            Err(ProbeError::NotFound {
                program: as_path.display().to_string(),
            })
        };
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    locate_in(program, &path_var).ok_or_else(|| ProbeError::NotOnPath {
        program: program.to_string_lossy().into_owned(),
    })
}

/// Search `program` in the directories of a `PATH`-style list.
pub fn locate_in(program: &OsStr, path_list: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_list)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

/// Run `program flag` and return the first non-empty output line.
///
/// Some tools print their version to stderr, so both streams are checked.
pub fn version(program: impl AsRef<OsStr>, flag: &str) -> Result<String, ProbeError> {
    let program = program.as_ref();
    let display = program.to_string_lossy().into_owned();

    let output = Command::new(program)
        .arg(flag)
        .output()
        .map_err(|source| ProbeError::Spawn {
            program: display.clone(),
            source,
        })?;

    first_line(&output.stdout)
        .or_else(|| first_line(&output.stderr))
        .ok_or_else(|| ProbeError::NoVersion {
            program: display,
            status: output.status.to_string(),
        })
}

// ── Internals ────────────────────────────────────────────────────────────────

fn has_separator(path: &Path) -> bool {
    path.components().count() > 1 || path.is_absolute()
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &OsStr) -> Vec<PathBuf> {
    let base = dir.join(program);
    let exts = std::env::var_os("PATHEXT")
        .unwrap_or_else(|| std::ffi::OsString::from(".EXE;.BAT;.CMD"));
    let mut out = vec![base.clone()];
    for ext in exts.to_string_lossy().split(';').filter(|e| !e.is_empty()) {
        let mut name = base.clone().into_os_string();
        name.push(ext);
        out.push(PathBuf::from(name));
    }
    out
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &OsStr) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
