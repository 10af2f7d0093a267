//! Pipeline configuration: which executables to run and where scratch files go.
//!
//! [`PipelineConfig`] describes the *environment* a conversion runs in, while
//! [`crate::options::ConversionOptions`] describes the *document*. One config
//! is typically built at startup and reused for every conversion.

use crate::error::Html2PdfError;
use crate::pipeline::runner::{SystemRunner, ToolRunner};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable overriding the renderer executable.
pub const ENV_RENDERER: &str = "HTML2PDF_WKHTMLTOPDF";
/// Environment variable overriding the metadata tool executable.
pub const ENV_METADATA: &str = "HTML2PDF_EXIFTOOL";
/// Environment variable overriding the security tool executable.
pub const ENV_SECURITY: &str = "HTML2PDF_QPDF";
/// Environment variable overriding the scratch directory.
pub const ENV_SCRATCH_DIR: &str = "HTML2PDF_SCRATCH_DIR";

/// Executables for the three stages. Bare names are resolved on `PATH` by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub renderer: PathBuf,
    pub metadata: PathBuf,
    pub security: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            renderer: PathBuf::from("wkhtmltopdf"),
            metadata: PathBuf::from("exiftool"),
            security: PathBuf::from("qpdf"),
        }
    }
}

/// Configuration shared by every conversion.
///
/// # Example
/// ```rust
/// use html2pdf_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .renderer("/usr/local/bin/wkhtmltopdf")
///     .scratch_dir(std::env::temp_dir())
///     .build()
///     .unwrap();
/// assert_eq!(config.tools.security.to_str(), Some("qpdf"));
/// ```
#[derive(Clone, Default)]
pub struct PipelineConfig {
    pub tools: ToolPaths,

    /// Where scratch files are created. `None` uses the system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Pre-constructed tool runner. `None` spawns real processes.
    pub runner: Option<Arc<dyn ToolRunner>>,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("tools", &self.tools)
            .field("scratch_dir", &self.scratch_dir)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("runner", &self.runner.as_ref().map(|_| "<dyn ToolRunner>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults, with executables and scratch directory taken from the
    /// `HTML2PDF_*` environment variables when they are set and non-empty.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(p) = var(ENV_RENDERER) {
            config.tools.renderer = p.into();
        }
        if let Some(p) = var(ENV_METADATA) {
            config.tools.metadata = p.into();
        }
        if let Some(p) = var(ENV_SECURITY) {
            config.tools.security = p.into();
        }
        config.scratch_dir = var(ENV_SCRATCH_DIR).map(PathBuf::from);
        config
    }

    /// The runner used to invoke external tools.
    pub fn resolved_runner(&self) -> Arc<dyn ToolRunner> {
        match self.runner {
            Some(ref runner) => Arc::clone(runner),
            None => Arc::new(SystemRunner),
        }
    }

    /// The directory scratch files are created in.
    pub fn resolved_scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn renderer(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.tools.renderer = program.into();
        self
    }

    pub fn metadata_tool(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.tools.metadata = program.into();
        self
    }

    pub fn security_tool(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.tools.security = program.into();
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Html2PdfError> {
        let c = &self.config;
        for (label, program) in [
            ("renderer", &c.tools.renderer),
            ("metadata tool", &c.tools.metadata),
            ("security tool", &c.tools.security),
        ] {
            if program.as_os_str().is_empty() {
                return Err(Html2PdfError::InvalidConfig(format!(
                    "{label} executable must not be empty"
                )));
            }
        }
        if let Some(ref dir) = c.scratch_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(Html2PdfError::InvalidConfig(format!(
                    "scratch directory '{}' exists and is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_canonical_program_names() {
        let config = PipelineConfig::default();
        assert_eq!(config.tools.renderer, PathBuf::from("wkhtmltopdf"));
        assert_eq!(config.tools.metadata, PathBuf::from("exiftool"));
        assert_eq!(config.tools.security, PathBuf::from("qpdf"));
        assert_eq!(config.resolved_scratch_dir(), std::env::temp_dir());
    }

    #[test]
    fn builder_rejects_empty_program() {
        let err = PipelineConfig::builder().renderer("").build().unwrap_err();
        assert!(err.to_string().contains("renderer"), "got: {err}");
    }

    #[test]
    fn builder_rejects_file_as_scratch_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = PipelineConfig::builder()
            .scratch_dir(file.path())
            .build()
            .unwrap_err();
        assert_eq!(err.tag(), "invalid_config");
    }

    #[test]
    fn builder_accepts_missing_scratch_dir() {
        // Created lazily on first allocation.
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder()
            .scratch_dir(dir.path().join("not-yet"))
            .build()
            .unwrap();
        assert_eq!(config.resolved_scratch_dir(), dir.path().join("not-yet"));
    }
}
