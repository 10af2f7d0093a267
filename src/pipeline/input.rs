//! Input normalisation: every input form becomes an HTML file path.
//!
//! The renderer only reads files, so inline HTML is written to a scratch
//! `.html` file under the intermediate label and from then on treated exactly
//! like a caller-supplied file.

use crate::error::{Html2PdfError, Result};
use crate::pipeline::temp::{TempStore, LABEL_INTERMEDIATE};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to convert.
///
/// A bare `&str`/`String` converts into [`Input::FromHtml`]; a `Path`/`PathBuf`
/// converts into [`Input::FromFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// An HTML file on disk, passed to the renderer as-is.
    FromFile(PathBuf),
    /// HTML markup held in memory.
    FromHtml(String),
}

impl From<&str> for Input {
    fn from(html: &str) -> Self {
        Input::FromHtml(html.to_string())
    }
}

impl From<String> for Input {
    fn from(html: String) -> Self {
        Input::FromHtml(html)
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Input::FromFile(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Input::FromFile(path.to_path_buf())
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::FromFile(p) => write!(f, "{}", p.display()),
            Input::FromHtml(s) => write!(f, "<inline html, {} bytes>", s.len()),
        }
    }
}

/// Resolve `input` to an HTML file path, writing inline HTML to scratch.
pub fn normalize(input: &Input, store: &TempStore) -> Result<PathBuf> {
    match input {
        Input::FromFile(path) => {
            let meta = std::fs::metadata(path).map_err(|e| Html2PdfError::io(path, e))?;
            if !meta.is_file() {
                return Err(Html2PdfError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
                ));
            }
            debug!("Using HTML file: {}", path.display());
            Ok(path.clone())
        }
        Input::FromHtml(html) => {
            let path = store.allocate(".html", LABEL_INTERMEDIATE)?;
            std::fs::write(&path, html).map_err(|e| Html2PdfError::io(&path, e))?;
            debug!("Wrote {} bytes of inline HTML to {}", html.len(), path.display());
            Ok(path)
        }
    }
}
