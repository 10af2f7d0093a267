//! Conversion entry points.
//!
//! Two result-returning operations sit on one staged core:
//!
//! * [`Pipeline::to_file`] returns the path of the finished PDF. When no
//!   `output` option was given that path is a scratch file which is left in
//!   place for the caller.
//! * [`Pipeline::to_binary`] reads the finished PDF into memory and always
//!   releases the scratch result file before returning, success or not.
//!
//! Each has an abort-on-error twin (`*_or_abort`) that panics with the error
//! tag, and an async twin (`*_async`) that runs the blocking pipeline on
//! Tokio's blocking pool. The free functions at the bottom use a
//! [`PipelineConfig::from_env`] pipeline.

use crate::config::PipelineConfig;
use crate::error::{Html2PdfError, Result};
use crate::options::ConversionOptions;
use crate::pipeline::input::{self, Input};
use crate::pipeline::temp::{TempStore, LABEL_INTERMEDIATE, LABEL_RESULT};
use crate::pipeline::{metadata, render, secure};
use crate::progress::Stage;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// A configured HTML → PDF converter.
///
/// Cheap to clone; holds no per-conversion state, so one pipeline can serve
/// any number of conversions, including concurrent ones on separate threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// A pipeline configured from the `HTML2PDF_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(PipelineConfig::from_env())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert `input` and return the path of the finished PDF.
    ///
    /// # Errors
    /// - [`Html2PdfError::ToolFailed`] tagged with the first tool that failed
    /// - [`Html2PdfError::Io`] when the input cannot be read or scratch files
    ///   cannot be created
    ///
    /// Intermediate scratch files are removed on every path. The scratch
    /// result file is kept on success and removed on failure.
    pub fn to_file(&self, input: impl Into<Input>, options: &ConversionOptions) -> Result<PathBuf> {
        let store = TempStore::new(self.config.resolved_scratch_dir());
        let result = self.run_stages(&input.into(), options, &store);
        if result.is_err() {
            store.release_all(LABEL_RESULT);
        }
        result
    }

    /// Convert `input` and return the finished PDF's bytes.
    ///
    /// A scratch result file is always deleted before returning. A file
    /// written to an explicit `output` path is left in place.
    pub fn to_binary(
        &self,
        input: impl Into<Input>,
        options: &ConversionOptions,
    ) -> Result<Vec<u8>> {
        let store = TempStore::new(self.config.resolved_scratch_dir());
        let _result = store.guard(LABEL_RESULT);

        let path = self.run_stages(&input.into(), options, &store)?;
        std::fs::read(&path).map_err(|e| Html2PdfError::io(&path, e))
    }

    /// [`Pipeline::to_file`], panicking with the error tag on failure.
    pub fn to_file_or_abort(
        &self,
        input: impl Into<Input>,
        options: &ConversionOptions,
    ) -> PathBuf {
        self.to_file(input, options).unwrap_or_else(abort)
    }

    /// [`Pipeline::to_binary`], panicking with the error tag on failure.
    pub fn to_binary_or_abort(
        &self,
        input: impl Into<Input>,
        options: &ConversionOptions,
    ) -> Vec<u8> {
        self.to_binary(input, options).unwrap_or_else(abort)
    }

    /// [`Pipeline::to_file`] on Tokio's blocking pool.
    pub async fn to_file_async(
        &self,
        input: impl Into<Input>,
        options: ConversionOptions,
    ) -> Result<PathBuf> {
        let pipeline = self.clone();
        let input = input.into();
        tokio::task::spawn_blocking(move || pipeline.to_file(input, &options))
            .await
            .map_err(|e| Html2PdfError::Internal(format!("Conversion task panicked: {e}")))?
    }

    /// [`Pipeline::to_binary`] on Tokio's blocking pool.
    pub async fn to_binary_async(
        &self,
        input: impl Into<Input>,
        options: ConversionOptions,
    ) -> Result<Vec<u8>> {
        let pipeline = self.clone();
        let input = input.into();
        tokio::task::spawn_blocking(move || pipeline.to_binary(input, &options))
            .await
            .map_err(|e| Html2PdfError::Internal(format!("Conversion task panicked: {e}")))?
    }

    /// Normalize → render → metadata → secure, stopping at the first failure.
    ///
    /// Intermediates are released when this returns; the result label is
    /// left to the caller.
    fn run_stages(
        &self,
        input: &Input,
        options: &ConversionOptions,
        store: &TempStore,
    ) -> Result<PathBuf> {
        let total_start = Instant::now();
        let _intermediates = store.guard(LABEL_INTERMEDIATE);
        let runner = self.config.resolved_runner();
        let tools = &self.config.tools;
        info!("Starting conversion: {}", input);

        // ── Step 1: Normalize input ──────────────────────────────────────
        let source = self.stage(Stage::Normalize, || input::normalize(input, store))?;

        // ── Step 2: Render HTML → PDF ────────────────────────────────────
        let rendered = self.stage(Stage::Render, || {
            render::render(runner.as_ref(), &tools.renderer, options, &source, store)
        })?;

        // ── Step 3: Strip and apply metadata ─────────────────────────────
        self.stage(Stage::Metadata, || {
            metadata::apply(runner.as_ref(), &tools.metadata, options, &rendered)
        })?;

        // ── Step 4: Encrypt + linearize ──────────────────────────────────
        let dest = self.stage(Stage::Secure, || {
            secure::secure(runner.as_ref(), &tools.security, options, &rendered, store)
        })?;

        info!(
            "Conversion complete: {} in {}ms",
            dest.display(),
            total_start.elapsed().as_millis()
        );
        Ok(dest)
    }

    /// Run one stage, reporting it to the progress callback.
    fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();
        let result = f();
        match (&result, cb) {
            (Ok(_), Some(cb)) => cb.on_stage_complete(stage, start.elapsed().as_millis() as u64),
            (Err(e), cb) => {
                warn!("Stage {} failed: {}", stage, e);
                if let Some(cb) = cb {
                    cb.on_stage_error(stage, &e.to_string());
                }
            }
            (Ok(_), None) => {}
        }
        result
    }
}

fn abort<T>(e: Html2PdfError) -> T {
    panic!("{}", e.tag())
}

// ── Free functions ───────────────────────────────────────────────────────

/// Convert `input` with a [`Pipeline::from_env`] pipeline; see [`Pipeline::to_file`].
///
/// # Example
/// ```rust,no_run
/// use html2pdf_pipeline::{to_file, ConversionOptions};
///
/// let options = ConversionOptions::builder().title("Hello").build();
/// let path = to_file("<h1>Hello</h1>", &options)?;
/// println!("{}", path.display());
/// # Ok::<(), html2pdf_pipeline::Html2PdfError>(())
/// ```
pub fn to_file(input: impl Into<Input>, options: &ConversionOptions) -> Result<PathBuf> {
    Pipeline::from_env().to_file(input, options)
}

/// Convert `input` with a [`Pipeline::from_env`] pipeline; see [`Pipeline::to_binary`].
pub fn to_binary(input: impl Into<Input>, options: &ConversionOptions) -> Result<Vec<u8>> {
    Pipeline::from_env().to_binary(input, options)
}

/// Abort-on-error [`to_file`].
pub fn to_file_or_abort(input: impl Into<Input>, options: &ConversionOptions) -> PathBuf {
    Pipeline::from_env().to_file_or_abort(input, options)
}

/// Abort-on-error [`to_binary`].
pub fn to_binary_or_abort(input: impl Into<Input>, options: &ConversionOptions) -> Vec<u8> {
    Pipeline::from_env().to_binary_or_abort(input, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Tool;
    use crate::pipeline::runner::ToolRunner;
    use crate::progress::ConversionProgressCallback;
    use std::ffi::OsString;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Simulates the three tools in-process and records every call.
    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<(Tool, Vec<String>)>>,
        fail: Option<Tool>,
    }

    impl FakeRunner {
        fn failing(tool: Tool) -> Self {
            Self {
                fail: Some(tool),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(Tool, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolRunner for FakeRunner {
        fn run(&self, tool: Tool, program: &Path, args: &[OsString]) -> Result<()> {
            let args: Vec<String> = args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            self.calls.lock().unwrap().push((tool, args.clone()));
            if self.fail == Some(tool) {
                return Err(Html2PdfError::ToolFailed {
                    tool,
                    program: program.display().to_string(),
                    detail: "exit status: 1".into(),
                });
            }
            let n = args.len();
            match tool {
                Tool::Renderer => {
                    let html = std::fs::read(&args[n - 2]).unwrap();
                    let mut pdf = b"%PDF-1.4\n".to_vec();
                    pdf.extend(html);
                    std::fs::write(&args[n - 1], pdf).unwrap();
                }
                Tool::Metadata => {}
                Tool::Security => {
                    std::fs::copy(&args[n - 2], &args[n - 1]).unwrap();
                }
            }
            Ok(())
        }
    }

    fn pipeline(runner: Arc<FakeRunner>, scratch: &Path) -> Pipeline {
        Pipeline::new(
            PipelineConfig::builder()
                .scratch_dir(scratch)
                .runner(runner)
                .build()
                .unwrap(),
        )
    }

    fn scratch_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn stages_run_in_order_with_expected_args() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let options = ConversionOptions::builder()
            .title("T")
            .dpi(96)
            .password("secret")
            .build();

        let out = pipeline(runner.clone(), dir.path())
            .to_file("<p>x</p>", &options)
            .unwrap();

        let calls = runner.calls();
        let tools: Vec<Tool> = calls.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            tools,
            [Tool::Renderer, Tool::Metadata, Tool::Metadata, Tool::Security]
        );

        let render_args = &calls[0].1;
        assert_eq!(&render_args[..2], ["--dpi", "96"]);
        assert!(render_args[2].ends_with(".html"));
        let rendered = &render_args[3];

        assert_eq!(calls[1].1, ["-overwrite_original", "-all:all=", rendered.as_str()]);
        assert_eq!(calls[2].1, ["-overwrite_original", "-Title=T", rendered.as_str()]);

        let secure_args = &calls[3].1;
        assert_eq!(secure_args[0], "--linearize");
        assert_eq!(secure_args[2], "secret");
        assert_eq!(&secure_args[secure_args.len() - 2], rendered);
        assert_eq!(secure_args.last().unwrap(), &out.to_string_lossy());
    }

    #[test]
    fn to_file_keeps_result_and_removes_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let out = pipeline(runner, dir.path())
            .to_file("<p>x</p>", &ConversionOptions::default())
            .unwrap();

        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF-"));
        let names = scratch_files(dir.path());
        assert_eq!(names.len(), 1, "got: {names:?}");
        assert!(names[0].starts_with("pdf_result_"), "got: {names:?}");
    }

    #[test]
    fn to_binary_leaves_scratch_empty() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let bytes = pipeline(runner, dir.path())
            .to_binary("<p>x</p>", &ConversionOptions::default())
            .unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(scratch_files(dir.path()).is_empty());
    }

    #[test]
    fn to_binary_cleans_up_after_late_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::failing(Tool::Security));
        let err = pipeline(runner, dir.path())
            .to_binary("<p>x</p>", &ConversionOptions::default())
            .unwrap_err();

        assert_eq!(err.tag(), "invalid_qpdf");
        assert!(scratch_files(dir.path()).is_empty());
    }

    #[test]
    fn to_file_drops_unfinished_result_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::failing(Tool::Security));
        let err = pipeline(runner, dir.path())
            .to_file("<p>x</p>", &ConversionOptions::default())
            .unwrap_err();

        assert_eq!(err.tag(), "invalid_qpdf");
        assert!(scratch_files(dir.path()).is_empty());
    }

    #[test]
    fn renderer_failure_short_circuits_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::failing(Tool::Renderer));
        let err = pipeline(runner.clone(), dir.path())
            .to_file("<p>x</p>", &ConversionOptions::default())
            .unwrap_err();

        assert_eq!(err.tag(), "invalid_wkhtmltopdf");
        assert_eq!(runner.calls().len(), 1);
        assert!(scratch_files(dir.path()).is_empty());
    }

    #[test]
    fn metadata_failure_skips_security() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::failing(Tool::Metadata));
        let err = pipeline(runner.clone(), dir.path())
            .to_file("<p>x</p>", &ConversionOptions::default())
            .unwrap_err();

        assert_eq!(err.tag(), "invalid_exiftool");
        assert!(runner.calls().iter().all(|(t, _)| *t != Tool::Security));
    }

    #[test]
    fn explicit_output_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let target = dir.path().join("custom.pdf");
        let runner = Arc::new(FakeRunner::default());
        let options = ConversionOptions::builder().output(&target).build();

        let out = pipeline(runner, &scratch).to_file("<p>x</p>", &options).unwrap();

        assert_eq!(out, target);
        assert!(target.exists());
        assert!(scratch_files(&scratch).is_empty());
    }

    #[test]
    fn to_binary_keeps_explicit_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("keep.pdf");
        let runner = Arc::new(FakeRunner::default());
        let options = ConversionOptions::builder().output(&target).build();

        let bytes = pipeline(runner, &dir.path().join("scratch"))
            .to_binary("<p>x</p>", &options)
            .unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), bytes);
    }

    #[test]
    fn input_forms_give_identical_output() {
        let dir = tempfile::tempdir().unwrap();
        let html = "<h1>Same</h1>";
        let src = dir.path().join("same.html");
        std::fs::write(&src, html).unwrap();
        let p = pipeline(Arc::new(FakeRunner::default()), &dir.path().join("scratch"));
        let options = ConversionOptions::default();

        let from_file = p.to_binary(Input::FromFile(src), &options).unwrap();
        let from_html = p.to_binary(Input::FromHtml(html.into()), &options).unwrap();
        let from_str = p.to_binary(html, &options).unwrap();
        assert_eq!(from_file, from_html);
        assert_eq!(from_html, from_str);
    }

    #[test]
    fn missing_input_file_is_io_error_and_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let err = pipeline(runner.clone(), dir.path())
            .to_file(dir.path().join("missing.html"), &ConversionOptions::default())
            .unwrap_err();
        assert_eq!(err.tag(), "io_error");
        assert!(runner.calls().is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid_wkhtmltopdf")]
    fn abort_variant_panics_with_tag() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::failing(Tool::Renderer));
        pipeline(runner, dir.path()).to_file_or_abort("<p>x</p>", &ConversionOptions::default());
    }

    #[test]
    fn abort_variant_returns_value_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = pipeline(Arc::new(FakeRunner::default()), dir.path())
            .to_binary_or_abort("<p>x</p>", &ConversionOptions::default());
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn progress_callback_sees_each_stage() {
        #[derive(Default)]
        struct Recorder {
            events: Mutex<Vec<String>>,
        }
        impl ConversionProgressCallback for Recorder {
            fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
                self.events.lock().unwrap().push(format!("ok:{stage}"));
            }
            fn on_stage_error(&self, stage: Stage, _error: &str) {
                self.events.lock().unwrap().push(format!("err:{stage}"));
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let config = PipelineConfig::builder()
            .scratch_dir(dir.path())
            .runner(Arc::new(FakeRunner::failing(Tool::Metadata)))
            .progress_callback(recorder.clone())
            .build()
            .unwrap();

        let _ = Pipeline::new(config).to_file("<p>x</p>", &ConversionOptions::default());
        assert_eq!(
            *recorder.events.lock().unwrap(),
            ["ok:normalize", "ok:render", "err:metadata"]
        );
    }

    #[test]
    fn async_wrapper_matches_sync() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(Arc::new(FakeRunner::default()), dir.path());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let bytes = rt
            .block_on(p.to_binary_async("<p>async</p>", ConversionOptions::default()))
            .unwrap();
        assert!(bytes.ends_with(b"<p>async</p>"));
        assert!(scratch_files(dir.path()).is_empty());
    }
}
