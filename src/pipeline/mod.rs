//! Pipeline stages for HTML-to-PDF conversion.
//!
//! Each stage module owns one external tool: it translates
//! [`crate::options::ConversionOptions`] into that tool's argument vector
//! (`build_args`, pure and infallible) and runs it through a
//! [`runner::ToolRunner`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ metadata ──▶ secure
//! (→ .html)  (wkhtmltopdf)  (exiftool ×2)  (qpdf)
//! ```
//!
//! 1. [`input`]    — inline HTML is written to a scratch `.html` file
//! 2. [`render`]   — HTML to an intermediate PDF
//! 3. [`metadata`] — clear all tags, then write the requested ones, in place
//! 4. [`secure`]   — linearize, optionally encrypt, into the final destination
//!
//! [`temp`] tracks the scratch files and [`runner`] spawns the processes.

pub mod input;
pub mod metadata;
pub mod render;
pub mod runner;
pub mod secure;
pub mod temp;
