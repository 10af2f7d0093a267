//! Process runner: invoke an external tool and reduce the outcome to Ok/Err.
//!
//! Exit status is the only signal. Output is captured (stdout followed by
//! stderr) and kept for logs and the error detail, never parsed. There is no
//! retry and no timeout here: a hung tool blocks the calling thread until it
//! exits, so callers needing bounded latency must enforce it from outside.
//!
//! [`ToolRunner`] is the seam between the pipeline and the OS. The default
//! [`SystemRunner`] spawns real processes; tests and embedders can inject
//! their own through [`crate::config::PipelineConfigBuilder::runner`].

use crate::error::{Html2PdfError, Result, Tool};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Instant;
use tracing::{debug, warn};

/// Runs one external tool invocation to completion.
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, blocking until it exits.
    ///
    /// Must return [`Html2PdfError::ToolFailed`] tagged with `tool` on a
    /// nonzero exit or when the program cannot be launched.
    fn run(&self, tool: Tool, program: &Path, args: &[OsString]) -> Result<()>;
}

/// Spawns real processes with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, tool: Tool, program: &Path, args: &[OsString]) -> Result<()> {
        run(tool, program, args)
    }
}

/// Run `program` with `args` synchronously.
pub fn run(tool: Tool, program: &Path, args: &[OsString]) -> Result<()> {
    let start = Instant::now();
    debug!("Running {} ({} args)", program.display(), args.len());

    let output = Command::new(program).args(args).output().map_err(|e| {
        warn!("Failed to launch {}: {}", program.display(), e);
        failure(tool, program, format!("could not launch: {e}"))
    })?;

    let combined = combine(&output.stdout, &output.stderr);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if output.status.success() {
        debug!("{} finished in {}ms", tool, elapsed_ms);
        if !combined.is_empty() {
            debug!("{} output: {}", tool, combined.trim_end());
        }
        Ok(())
    } else {
        warn!(
            "{} failed after {}ms with {}",
            tool, elapsed_ms, output.status
        );
        let detail = if combined.trim().is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {}", output.status, combined.trim())
        };
        Err(failure(tool, program, detail))
    }
}

fn failure(tool: Tool, program: &Path, detail: String) -> Html2PdfError {
    Html2PdfError::ToolFailed {
        tool,
        program: program.display().to_string(),
        detail,
    }
}

/// Merge stdout and stderr into one lossy UTF-8 string.
fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(stderr));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_keeps_both_streams() {
        assert_eq!(combine(b"out", b"err"), "out\nerr");
        assert_eq!(combine(b"out\n", b"err"), "out\nerr");
        assert_eq!(combine(b"", b"err"), "err");
        assert_eq!(combine(b"out", b""), "out");
    }

    #[test]
    fn missing_program_is_a_tool_failure() {
        let err = run(
            Tool::Renderer,
            Path::new("/definitely/not/a/real/wkhtmltopdf"),
            &[],
        )
        .unwrap_err();
        assert_eq!(err.tag(), "invalid_wkhtmltopdf");
        assert!(err.to_string().contains("could not launch"), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_ok() {
        assert!(run(Tool::Metadata, Path::new("true"), &[]).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_tagged_with_tool() {
        let err = run(Tool::Security, Path::new("false"), &[]).unwrap_err();
        assert_eq!(err.tag(), "invalid_qpdf");
        assert_eq!(err.tool(), Some(Tool::Security));
    }

    #[cfg(unix)]
    #[test]
    fn failure_detail_includes_output() {
        let args: Vec<OsString> = vec!["-c".into(), "echo broken >&2; exit 3".into()];
        let err = run(Tool::Renderer, Path::new("sh"), &args).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken"), "got: {msg}");
        assert!(msg.contains('3'), "got: {msg}");
    }
}
