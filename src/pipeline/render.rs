//! Render stage: HTML file → intermediate PDF via wkhtmltopdf.
//!
//! ```text
//! wkhtmltopdf [--dpi N] [-T t -R r -B b -L l | --margin-<side> v ...]
//!             [--orientation O] [--page-height H] [--page-size S] [--page-width W]
//!             <source.html> <dest.pdf>
//! ```
//!
//! Flags are emitted in the fixed order above regardless of how the options
//! were built, so identical options always produce identical argument vectors.

use crate::error::{Result, Tool};
use crate::options::{ConversionOptions, Length, Margin};
use crate::pipeline::runner::ToolRunner;
use crate::pipeline::temp::{TempStore, LABEL_INTERMEDIATE};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Side order used for positional margin sequences.
const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Short flags for a uniform margin, in [`SIDES`] order.
const SHORT_SIDE_FLAGS: [&str; 4] = ["-T", "-R", "-B", "-L"];

/// Build the renderer flags for the render subset of `options`.
///
/// Returns an empty vector when no render option is set.
pub fn build_args(options: &ConversionOptions) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(dpi) = options.dpi {
        args.push("--dpi".to_string());
        args.push(dpi.to_string());
    }
    if let Some(ref margin) = options.margin {
        args.extend(margin_args(margin));
    }
    if let Some(orientation) = options.orientation {
        args.push("--orientation".to_string());
        args.push(orientation.to_string());
    }
    if let Some(ref height) = options.page_height {
        args.push("--page-height".to_string());
        args.push(height.to_string());
    }
    if let Some(ref size) = options.page_size {
        args.push("--page-size".to_string());
        args.push(size.clone());
    }
    if let Some(ref width) = options.page_width {
        args.push("--page-width".to_string());
        args.push(width.to_string());
    }

    args
}

/// Resolve a margin into renderer flags.
///
/// * uniform → `-T v -R v -B v -L v`
/// * sides   → `--margin-<side> v` for each side present, in top/right/bottom/left order
/// * sequence → zipped with top/right/bottom/left; a short sequence sets only
///   the leading sides and extra entries are dropped
fn margin_args(margin: &Margin) -> Vec<String> {
    match margin {
        Margin::Uniform(value) => SHORT_SIDE_FLAGS
            .iter()
            .flat_map(|flag| [flag.to_string(), value.to_string()])
            .collect(),
        Margin::Sides(sides) => {
            let present = [&sides.top, &sides.right, &sides.bottom, &sides.left];
            SIDES
                .iter()
                .zip(present)
                .filter_map(|(side, value)| value.as_ref().map(|v| side_flag(side, v)))
                .flatten()
                .collect()
        }
        Margin::Sequence(values) => SIDES
            .iter()
            .zip(values)
            .flat_map(|(side, value)| side_flag(side, value))
            .collect(),
    }
}

fn side_flag(side: &str, value: &Length) -> [String; 2] {
    [format!("--margin-{side}"), value.to_string()]
}

/// Render `source` into a fresh intermediate PDF and return its path.
pub fn render(
    runner: &dyn ToolRunner,
    program: &Path,
    options: &ConversionOptions,
    source: &Path,
    store: &TempStore,
) -> Result<PathBuf> {
    let dest = store.allocate(".pdf", LABEL_INTERMEDIATE)?;
    let flags = build_args(options);
    debug!("Render args: {:?}", flags);

    let mut args: Vec<OsString> = flags.into_iter().map(OsString::from).collect();
    args.push(source.as_os_str().to_owned());
    args.push(dest.as_os_str().to_owned());

    runner.run(Tool::Renderer, program, &args)?;
    Ok(dest)
}
