//! Secure stage: optional encryption plus linearization via qpdf.
//!
//! ```text
//! qpdf --linearize [--encrypt <view> <edit> 256 --modify=<lvl> --print=<lvl> --] <src.pdf> <dest.pdf>
//! ```
//!
//! Linearization always happens. The encryption block is only added when at
//! least one security option is present; missing pieces then take their
//! defaults (empty passwords, `annotate`, `full`).

use crate::error::{Result, Tool};
use crate::options::ConversionOptions;
use crate::pipeline::runner::ToolRunner;
use crate::pipeline::temp::{TempStore, LABEL_RESULT};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// AES-256, the only key length qpdf accepts without weak-crypto opt-ins.
const KEY_LENGTH: &str = "256";

/// Build the qpdf flags for the security subset of `options`.
pub fn build_args(options: &ConversionOptions) -> Vec<String> {
    let mut args = vec!["--linearize".to_string()];

    if options.has_security() {
        args.push("--encrypt".to_string());
        args.push(options.password.clone().unwrap_or_default());
        args.push(options.edit_password.clone().unwrap_or_default());
        args.push(KEY_LENGTH.to_string());
        args.push(format!("--modify={}", options.modify.unwrap_or_default()));
        args.push(format!("--print={}", options.print.unwrap_or_default()));
        args.push("--".to_string());
    }

    args
}

/// `args` with both passwords masked, for logging.
pub fn redacted(args: &[String]) -> Vec<String> {
    let mut out = args.to_vec();
    if let Some(pos) = out.iter().position(|a| a == "--encrypt") {
        for slot in out.iter_mut().skip(pos + 1).take(2) {
            *slot = "***".to_string();
        }
    }
    out
}

/// Where the final PDF goes: the `output` option verbatim, or a fresh
/// scratch file under the result label.
pub fn resolve_destination(options: &ConversionOptions, store: &TempStore) -> Result<PathBuf> {
    match options.output {
        Some(ref path) => Ok(path.clone()),
        None => store.allocate(".pdf", LABEL_RESULT),
    }
}

/// Encrypt/linearize `source` into the final destination and return it.
pub fn secure(
    runner: &dyn ToolRunner,
    program: &Path,
    options: &ConversionOptions,
    source: &Path,
    store: &TempStore,
) -> Result<PathBuf> {
    let dest = resolve_destination(options, store)?;
    let flags = build_args(options);
    debug!("Security args: {:?}", redacted(&flags));

    let mut args: Vec<OsString> = flags.into_iter().map(OsString::from).collect();
    args.push(source.as_os_str().to_owned());
    args.push(dest.as_os_str().to_owned());

    runner.run(Tool::Security, program, &args)?;
    Ok(dest)
}
