//! Error types for the html2pdf-pipeline library.
//!
//! The taxonomy is flat. An external tool either succeeded or it
//! did not, so every tool failure collapses into [`Html2PdfError::ToolFailed`]
//! tagged with the tool that failed (`invalid_wkhtmltopdf`, `invalid_exiftool`,
//! `invalid_qpdf`). A missing executable is not distinguished from one that
//! exited nonzero: both mean the stage could not produce its output.
//!
//! Filesystem problems on our side of the process boundary (unreadable source
//! file, unwritable scratch directory) keep their own [`Html2PdfError::Io`]
//! kind so callers can tell "the tool rejected this document" apart from
//! "the machine is misconfigured".

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The three external programs the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// HTML → PDF renderer.
    Renderer,
    /// PDF metadata editor.
    Metadata,
    /// Encryption and linearization.
    Security,
}

impl Tool {
    /// Canonical program name, used for the default executable and the error tag.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Renderer => "wkhtmltopdf",
            Tool::Metadata => "exiftool",
            Tool::Security => "qpdf",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All errors returned by the html2pdf-pipeline library.
#[derive(Debug, Error)]
pub enum Html2PdfError {
    // ── External tool errors ──────────────────────────────────────────────
    /// The tool exited nonzero or could not be launched at all.
    ///
    /// `detail` carries the exit status or launch error plus whatever the
    /// tool printed, for logging only.
    #[error("invalid_{tool}: `{program}` failed: {detail}")]
    ToolFailed {
        tool: Tool,
        program: String,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading the input, writing a scratch file or reading the final artifact failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// An options document could not be parsed.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Html2PdfError {
    /// Short machine-readable tag for this error, e.g. `invalid_wkhtmltopdf`.
    ///
    /// This is the message the abort-on-error entry points panic with.
    pub fn tag(&self) -> String {
        match self {
            Html2PdfError::ToolFailed { tool, .. } => format!("invalid_{}", tool.name()),
            Html2PdfError::Io { .. } => "io_error".to_string(),
            Html2PdfError::InvalidOptions(_) => "invalid_options".to_string(),
            Html2PdfError::InvalidConfig(_) => "invalid_config".to_string(),
            Html2PdfError::Internal(_) => "internal_error".to_string(),
        }
    }

    /// The tool that failed, if this is a tool failure.
    pub fn tool(&self) -> Option<Tool> {
        match self {
            Html2PdfError::ToolFailed { tool, .. } => Some(*tool),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Html2PdfError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Html2PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_tag_uses_canonical_name() {
        let e = Html2PdfError::ToolFailed {
            tool: Tool::Renderer,
            program: "/opt/bin/my-wkhtmltopdf".into(),
            detail: "exit status: 1".into(),
        };
        assert_eq!(e.tag(), "invalid_wkhtmltopdf");
        assert_eq!(e.tool(), Some(Tool::Renderer));
    }

    #[test]
    fn tool_failure_display_starts_with_tag() {
        let e = Html2PdfError::ToolFailed {
            tool: Tool::Security,
            program: "qpdf".into(),
            detail: "exit status: 2".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("invalid_qpdf"), "got: {msg}");
        assert!(msg.contains("exit status: 2"));
    }

    #[test]
    fn io_error_is_its_own_kind() {
        let e = Html2PdfError::io(
            "/nope/input.html",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(e.tag(), "io_error");
        assert_eq!(e.tool(), None);
        assert!(e.to_string().contains("/nope/input.html"));
    }

    #[test]
    fn tool_names() {
        assert_eq!(Tool::Renderer.to_string(), "wkhtmltopdf");
        assert_eq!(Tool::Metadata.to_string(), "exiftool");
        assert_eq!(Tool::Security.to_string(), "qpdf");
    }
}
