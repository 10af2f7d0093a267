//! # html2pdf-pipeline
//!
//! Convert HTML to PDF by driving three command-line tools in sequence:
//! [wkhtmltopdf](https://wkhtmltopdf.org/) renders, [exiftool](https://exiftool.org/)
//! replaces the document metadata, and [qpdf](https://qpdf.sourceforge.io/)
//! linearizes and optionally encrypts.
//!
//! The crate does no PDF work itself. It translates typed
//! [`ConversionOptions`] into each tool's argument vector, threads the
//! intermediate file from one tool to the next and makes sure every scratch
//! file it created is removed, whichever way the conversion ends.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML (file / string)
//!  │
//!  ├─ 1. Normalize  inline HTML → scratch .html file
//!  ├─ 2. Render     wkhtmltopdf  → intermediate .pdf
//!  ├─ 3. Metadata   exiftool ×2  → clear all tags, write title/author/…
//!  └─ 4. Secure     qpdf         → linearize (+ AES-256) → final .pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use html2pdf_pipeline::{to_binary, ConversionOptions, PrintPermission};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConversionOptions::builder()
//!         .title("Invoice 42")
//!         .page_size("A4")
//!         .password("s3cret")
//!         .print(PrintPermission::Low)
//!         .build();
//!     let pdf = to_binary("<h1>Invoice 42</h1>", &options)?;
//!     std::fs::write("invoice.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! html2pdf-pipeline = { version = "0.1", default-features = false }
//! ```
//!
//! ## Requirements
//!
//! `wkhtmltopdf`, `exiftool` and `qpdf` must be on `PATH`, or configured via
//! [`PipelineConfig`] / the `HTML2PDF_WKHTMLTOPDF`, `HTML2PDF_EXIFTOOL` and
//! `HTML2PDF_QPDF` environment variables. A missing tool is reported like any
//! other failure of that tool (`invalid_<tool>`).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, ToolPaths};
pub use convert::{to_binary, to_binary_or_abort, to_file, to_file_or_abort, Pipeline};
pub use error::{Html2PdfError, Result, Tool};
pub use options::{
    ConversionOptions, ConversionOptionsBuilder, Length, Margin, MarginSides, ModifyPermission,
    Orientation, PrintPermission,
};
pub use pipeline::input::Input;
pub use pipeline::runner::{SystemRunner, ToolRunner};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
