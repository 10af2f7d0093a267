//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to be told as
//! the pipeline moves through its four stages. The external tools can take
//! seconds on large documents, so a terminal front-end uses these events to
//! drive a spinner; a service might forward them to its own telemetry.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_pipeline::{ConversionProgressCallback, PipelineConfig, Stage};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     stages: Mutex<Vec<Stage>>,
//! }
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
//!         self.stages.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(Recorder::default()))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The four strictly sequential pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Turn the input into a file path (writing inline HTML to scratch).
    Normalize,
    /// HTML → intermediate PDF.
    Render,
    /// Clear all metadata, then write the requested fields.
    Metadata,
    /// Encrypt (optional) and linearize into the final destination.
    Secure,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Normalize => "normalize",
            Stage::Render => "render",
            Stage::Metadata => "metadata",
            Stage::Secure => "secure",
        })
    }
}

/// Called by the pipeline as it enters and leaves each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// async wrappers run the pipeline on a blocking thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before a stage starts.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. No further stage runs after this.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
