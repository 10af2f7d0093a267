//! CLI binary for html2pdf-pipeline.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionOptions` / `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use html2pdf_pipeline::{
    ConversionOptions, ConversionProgressCallback, Input, Length, Margin, MarginSides,
    ModifyPermission, Orientation, Pipeline, PipelineConfig, PrintPermission, ProgressCallback,
    Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the running stage plus one
/// log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", describe(stage)));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<10} {}",
            green("✓"),
            stage,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Truncate very long tool output to keep the log tidy.
        let msg = match error.char_indices().nth(100) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        self.bar
            .println(format!("  {} {:<10} {}", red("✗"), stage, red(&msg)));
    }
}

fn describe(stage: Stage) -> &'static str {
    match stage {
        Stage::Normalize => "Preparing input",
        Stage::Render => "Rendering HTML (wkhtmltopdf)",
        Stage::Metadata => "Writing metadata (exiftool)",
        Stage::Secure => "Linearizing (qpdf)",
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a file, print the path of the produced PDF
  html2pdf page.html

  # Render to a chosen path
  html2pdf page.html -o page.pdf

  # Inline HTML, PDF bytes to stdout
  html2pdf --html '<h1>Hello</h1>' --stdout > hello.pdf

  # HTML from stdin
  curl -s https://example.com | html2pdf - -o example.pdf

  # Metadata, layout and encryption
  html2pdf report.html -o report.pdf --title "Q3 Report" --keywords finance,q3 \
      --page-size A4 --margin 10,15,10,15 --password s3cret --print low

  # Options from a JSON file (flags win)
  html2pdf report.html --options report-options.json

  # Check that the external tools are installed
  html2pdf --check

MARGINS:
  --margin 10            all sides
  --margin 5,10,15,20    top, right, bottom, left (shorter lists set only the leading sides)
  --margin top=5,left=1in

ENVIRONMENT VARIABLES:
  HTML2PDF_WKHTMLTOPDF   wkhtmltopdf executable (default: wkhtmltopdf on PATH)
  HTML2PDF_EXIFTOOL      exiftool executable    (default: exiftool on PATH)
  HTML2PDF_QPDF          qpdf executable        (default: qpdf on PATH)
  HTML2PDF_SCRATCH_DIR   directory for scratch files (default: system temp dir)
  RUST_LOG               tracing filter, overrides -v / -q
"#;

/// Convert HTML to PDF with wkhtmltopdf, exiftool and qpdf.
#[derive(Parser, Debug)]
#[command(
    name = "html2pdf",
    version,
    about = "Convert HTML to linearized, optionally encrypted PDF",
    long_about = "Convert HTML (a file, stdin or an inline string) to PDF. The document is \
rendered by wkhtmltopdf, its metadata is replaced by exiftool, and qpdf linearizes and \
optionally encrypts the result.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTML file to convert, or `-` to read HTML from stdin.
    #[arg(conflicts_with = "html", required_unless_present_any = ["html", "check"])]
    input: Option<PathBuf>,

    /// Inline HTML to convert instead of a file.
    #[arg(long)]
    html: Option<String>,

    /// Write the PDF here. Without it a scratch file is created and its path printed.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the PDF bytes to stdout instead of printing a path.
    #[arg(long)]
    stdout: bool,

    /// JSON file with conversion options; explicit flags override its values.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    // ── metadata ──────────────────────────────────────────────────────────
    /// Document author.
    #[arg(long, help_heading = "Metadata")]
    author: Option<String>,

    /// Document keywords, comma separated.
    #[arg(long, value_delimiter = ',', num_args = 1.., help_heading = "Metadata")]
    keywords: Option<Vec<String>>,

    /// Document subject.
    #[arg(long, help_heading = "Metadata")]
    subject: Option<String>,

    /// Document title.
    #[arg(long, help_heading = "Metadata")]
    title: Option<String>,

    // ── security ──────────────────────────────────────────────────────────
    /// Password required to open the PDF.
    #[arg(long, help_heading = "Security")]
    password: Option<String>,

    /// Password granting full edit rights.
    #[arg(long, help_heading = "Security")]
    edit_password: Option<String>,

    /// Changes allowed without the edit password.
    #[arg(long, value_enum, help_heading = "Security")]
    modify: Option<ModifyArg>,

    /// Printing allowed without the edit password.
    #[arg(long, value_enum, help_heading = "Security")]
    print: Option<PrintArg>,

    // ── render ────────────────────────────────────────────────────────────
    /// Rendering DPI.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help_heading = "Layout")]
    dpi: Option<u32>,

    /// Page margins: `10`, `5,10,15,20` or `top=5,left=1in`.
    #[arg(long, value_parser = parse_margin, help_heading = "Layout")]
    margin: Option<Margin>,

    /// Page orientation.
    #[arg(long, value_enum, help_heading = "Layout")]
    orientation: Option<OrientationArg>,

    /// Paper size name, e.g. A4 or Letter.
    #[arg(long, help_heading = "Layout")]
    page_size: Option<String>,

    /// Page height (number in mm, or with unit).
    #[arg(long, value_parser = parse_length, help_heading = "Layout")]
    page_height: Option<Length>,

    /// Page width (number in mm, or with unit).
    #[arg(long, value_parser = parse_length, help_heading = "Layout")]
    page_width: Option<Length>,

    // ── environment ───────────────────────────────────────────────────────
    /// wkhtmltopdf executable.
    #[arg(long, env = "HTML2PDF_WKHTMLTOPDF", help_heading = "Tools")]
    wkhtmltopdf: Option<PathBuf>,

    /// exiftool executable.
    #[arg(long, env = "HTML2PDF_EXIFTOOL", help_heading = "Tools")]
    exiftool: Option<PathBuf>,

    /// qpdf executable.
    #[arg(long, env = "HTML2PDF_QPDF", help_heading = "Tools")]
    qpdf: Option<PathBuf>,

    /// Directory for scratch files.
    #[arg(long, env = "HTML2PDF_SCRATCH_DIR", help_heading = "Tools")]
    scratch_dir: Option<PathBuf>,

    /// Report where each external tool is and which version it is, then exit.
    #[arg(long)]
    check: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModifyArg {
    All,
    Annotate,
    Form,
    Assembly,
    None,
}

impl From<ModifyArg> for ModifyPermission {
    fn from(v: ModifyArg) -> Self {
        match v {
            ModifyArg::All => ModifyPermission::All,
            ModifyArg::Annotate => ModifyPermission::Annotate,
            ModifyArg::Form => ModifyPermission::Form,
            ModifyArg::Assembly => ModifyPermission::Assembly,
            ModifyArg::None => ModifyPermission::None,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PrintArg {
    Full,
    Low,
    None,
}

impl From<PrintArg> for PrintPermission {
    fn from(v: PrintArg) -> Self {
        match v {
            PrintArg::Full => PrintPermission::Full,
            PrintArg::Low => PrintPermission::Low,
            PrintArg::None => PrintPermission::None,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports every stage, so library INFO logs are
    // only shown when the spinner is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.check;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(&cli, progress.clone().map(|p| p as ProgressCallback))?;

    // ── Check mode ───────────────────────────────────────────────────────
    if cli.check {
        return check_tools(&config);
    }

    // ── Build input and options ──────────────────────────────────────────
    let input = read_input(&cli)?;
    let options = build_options(&cli).await?;
    let pipeline = Pipeline::new(config);

    // ── Run conversion ───────────────────────────────────────────────────
    if cli.stdout {
        let result = pipeline.to_binary_async(input, options).await;
        if let Some(ref p) = progress {
            p.finish();
        }
        let bytes = result.context("Conversion failed")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&bytes)
            .context("Failed to write to stdout")?;
        handle.flush().context("Failed to write to stdout")?;
    } else {
        let result = pipeline.to_file_async(input, options).await;
        if let Some(ref p) = progress {
            p.finish();
        }
        let path = result.context("Conversion failed")?;
        if !cli.quiet {
            eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
        }
        println!("{}", path.display());
    }

    Ok(())
}

/// Map CLI args (clap already folds in the `HTML2PDF_*` variables) to
/// `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder();
    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir);
    }
    if let Some(ref p) = cli.wkhtmltopdf {
        builder = builder.renderer(p);
    }
    if let Some(ref p) = cli.exiftool {
        builder = builder.metadata_tool(p);
    }
    if let Some(ref p) = cli.qpdf {
        builder = builder.security_tool(p);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map CLI args (and the optional JSON options file) to `ConversionOptions`.
async fn build_options(cli: &Cli) -> Result<ConversionOptions> {
    let from_file = match cli.options {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read options from {:?}", path))?;
            ConversionOptions::from_json(&json)
                .with_context(|| format!("Invalid options file {:?}", path))?
        }
        None => ConversionOptions::default(),
    };

    let flags = ConversionOptions {
        author: cli.author.clone(),
        keywords: cli.keywords.clone(),
        subject: cli.subject.clone(),
        title: cli.title.clone(),
        password: cli.password.clone(),
        edit_password: cli.edit_password.clone(),
        modify: cli.modify.map(Into::into),
        print: cli.print.map(Into::into),
        dpi: cli.dpi,
        margin: cli.margin.clone(),
        orientation: cli.orientation.map(Into::into),
        page_height: cli.page_height.clone(),
        page_size: cli.page_size.clone(),
        page_width: cli.page_width.clone(),
        output: cli.output.clone(),
    };

    Ok(from_file.merge(flags))
}

fn read_input(cli: &Cli) -> Result<Input> {
    if let Some(ref html) = cli.html {
        return Ok(Input::FromHtml(html.clone()));
    }
    match cli.input {
        Some(ref path) if path.as_os_str() == "-" => {
            let mut html = String::new();
            io::stdin()
                .read_to_string(&mut html)
                .context("Failed to read HTML from stdin")?;
            Ok(Input::FromHtml(html))
        }
        Some(ref path) => Ok(Input::FromFile(path.clone())),
        None => anyhow::bail!("No input given: pass an HTML file, `-` or --html"),
    }
}

/// Print each tool's resolved path and version; fail if any is unusable.
fn check_tools(config: &PipelineConfig) -> Result<()> {
    let tools = [
        ("wkhtmltopdf", &config.tools.renderer, "--version"),
        ("exiftool", &config.tools.metadata, "-ver"),
        ("qpdf", &config.tools.security, "--version"),
    ];

    let mut missing = 0;
    for (name, program, flag) in tools {
        match exec_probe::locate(program) {
            Ok(path) => {
                let version = exec_probe::version(&path, flag)
                    .unwrap_or_else(|e| red(&e.to_string()));
                println!(
                    "{} {:<12} {}  {}",
                    green("✓"),
                    name,
                    path.display(),
                    dim(&version)
                );
            }
            Err(e) => {
                missing += 1;
                println!("{} {:<12} {}", red("✗"), name, red(&e.to_string()));
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{missing} required tool(s) unavailable");
    }
    Ok(())
}

/// Parse a length: a bare number, or anything else verbatim (`"1in"`).
fn parse_length(s: &str) -> Result<Length, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("length must not be empty".into());
    }
    Ok(match s.parse::<f64>() {
        Ok(n) => Length::Number(n),
        Err(_) => Length::Text(s.to_string()),
    })
}

/// Parse `--margin`: `10`, `5,10,15,20` or `top=5,left=1in`.
fn parse_margin(s: &str) -> Result<Margin, String> {
    let s = s.trim();

    if s.contains('=') {
        let mut sides = MarginSides::default();
        for part in s.split(',') {
            let (side, value) = part
                .split_once('=')
                .ok_or_else(|| format!("expected side=value, got '{}'", part.trim()))?;
            let value = Some(parse_length(value)?);
            match side.trim().to_lowercase().as_str() {
                "top" => sides.top = value,
                "right" => sides.right = value,
                "bottom" => sides.bottom = value,
                "left" => sides.left = value,
                other => return Err(format!("unknown margin side '{other}'")),
            }
        }
        return Ok(Margin::Sides(sides));
    }

    if s.contains(',') {
        let values = s
            .split(',')
            .map(parse_length)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Margin::Sequence(values));
    }

    Ok(Margin::Uniform(parse_length(s)?))
}
