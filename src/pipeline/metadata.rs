//! Metadata stage: wipe whatever the renderer embedded, then write the
//! caller's fields.
//!
//! exiftool runs twice against the intermediate PDF, rewriting it in place:
//!
//! ```text
//! exiftool -overwrite_original -all:all= <file.pdf>
//! exiftool -overwrite_original [-Author=..] [-Subject=..] [-Title=..] [-keywords=..] <file.pdf>
//! ```
//!
//! The second pass runs even when no field is set, so the output always
//! goes through the same two rewrites.

use crate::error::{Result, Tool};
use crate::options::ConversionOptions;
use crate::pipeline::runner::ToolRunner;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// Rewrite the file instead of leaving a `_original` backup next to it.
const OVERWRITE: &str = "-overwrite_original";
/// Delete every tag in every group.
const CLEAR_ALL: &str = "-all:all=";

/// Arguments for the first pass: clear all existing tags.
pub fn clear_args() -> Vec<String> {
    vec![OVERWRITE.to_string(), CLEAR_ALL.to_string()]
}

/// Per-field tag assignments for the metadata subset of `options`.
///
/// Returns an empty vector when no metadata option is set.
pub fn build_args(options: &ConversionOptions) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(ref author) = options.author {
        args.push(format!("-Author={author}"));
    }
    if let Some(ref subject) = options.subject {
        args.push(format!("-Subject={subject}"));
    }
    if let Some(ref title) = options.title {
        args.push(format!("-Title={title}"));
    }
    if let Some(ref keywords) = options.keywords {
        args.push(format!("-keywords={}", keywords.join(" ")));
    }
    args
}

/// Run both passes on `pdf` in place.
pub fn apply(
    runner: &dyn ToolRunner,
    program: &Path,
    options: &ConversionOptions,
    pdf: &Path,
) -> Result<()> {
    runner.run(Tool::Metadata, program, &with_target(clear_args(), pdf))?;

    let mut args = vec![OVERWRITE.to_string()];
    args.extend(build_args(options));
    debug!("Metadata args: {:?}", args);
    runner.run(Tool::Metadata, program, &with_target(args, pdf))
}

fn with_target(args: Vec<String>, pdf: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = args.into_iter().map(OsString::from).collect();
    args.push(pdf.as_os_str().to_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_give_no_fields() {
        assert!(build_args(&ConversionOptions::default()).is_empty());
    }

    #[test]
    fn fields_map_to_single_tokens() {
        let options = ConversionOptions::builder()
            .title("Annual Report")
            .author("Ada Lovelace")
            .subject("Engines")
            .build();
        assert_eq!(
            build_args(&options),
            [
                "-Author=Ada Lovelace",
                "-Subject=Engines",
                "-Title=Annual Report"
            ]
        );
    }

    #[test]
    fn keywords_join_with_single_space() {
        let options = ConversionOptions::builder()
            .keywords(["rust", "pdf", "html"])
            .build();
        assert_eq!(build_args(&options), ["-keywords=rust pdf html"]);
    }

    #[test]
    fn clear_pass_wipes_everything() {
        assert_eq!(clear_args(), ["-overwrite_original", "-all:all="]);
    }

    #[test]
    fn other_subsets_do_not_leak_in() {
        let options = ConversionOptions::builder()
            .dpi(96)
            .print(crate::options::PrintPermission::Low)
            .build();
        assert!(build_args(&options).is_empty());
    }
}
