//! Per-document conversion options.
//!
//! [`ConversionOptions`] covers three disjoint subsets, each read by exactly one
//! pipeline stage:
//!
//! | Subset   | Fields | Consumed by |
//! |----------|--------|-------------|
//! | render   | `dpi`, `margin`, `orientation`, `page_height`, `page_size`, `page_width` | wkhtmltopdf |
//! | metadata | `author`, `keywords`, `subject`, `title` | exiftool |
//! | security | `password`, `edit_password`, `modify`, `print` | qpdf |
//!
//! plus `output`, the final destination. Options can be built in code via
//! [`ConversionOptions::builder()`] or parsed from a JSON object with
//! [`ConversionOptions::from_json`]; unknown keys in the JSON are ignored so
//! option documents shared with other tools do not need trimming first.

use crate::error::Html2PdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Options for a single HTML → PDF conversion.
///
/// # Example
/// ```rust
/// use html2pdf_pipeline::{ConversionOptions, Margin, PrintPermission};
///
/// let options = ConversionOptions::builder()
///     .title("Quarterly report")
///     .keywords(["finance", "q3"])
///     .margin(Margin::from([10, 15, 10, 15]))
///     .password("secret")
///     .print(PrintPermission::Low)
///     .build();
/// assert!(options.has_security());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    // ── metadata ──────────────────────────────────────────────────────────
    pub author: Option<String>,
    /// Joined with a single space into one exiftool tag value.
    pub keywords: Option<Vec<String>>,
    pub subject: Option<String>,
    pub title: Option<String>,

    // ── security ──────────────────────────────────────────────────────────
    /// User (view) password. Default when encrypting: empty.
    pub password: Option<String>,
    /// Owner (edit) password. Default when encrypting: empty.
    pub edit_password: Option<String>,
    /// Default when encrypting: [`ModifyPermission::Annotate`].
    pub modify: Option<ModifyPermission>,
    /// Default when encrypting: [`PrintPermission::Full`].
    pub print: Option<PrintPermission>,

    // ── render ────────────────────────────────────────────────────────────
    pub dpi: Option<u32>,
    pub margin: Option<Margin>,
    pub orientation: Option<Orientation>,
    pub page_height: Option<Length>,
    /// Paper size name understood by the renderer, e.g. `A4` or `Letter`.
    pub page_size: Option<String>,
    pub page_width: Option<Length>,

    // ── output ────────────────────────────────────────────────────────────
    /// Final destination. When `None` a fresh scratch file is allocated.
    pub output: Option<PathBuf>,
}

impl ConversionOptions {
    /// Create a new builder for `ConversionOptions`.
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Parse options from a JSON object. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, Html2PdfError> {
        serde_json::from_str(json).map_err(|e| Html2PdfError::InvalidOptions(e.to_string()))
    }

    /// True when any key of the security subset is present, i.e. encryption
    /// was requested.
    pub fn has_security(&self) -> bool {
        self.password.is_some()
            || self.edit_password.is_some()
            || self.modify.is_some()
            || self.print.is_some()
    }

    /// Overlay every field set in `other` onto `self`.
    ///
    /// Used by the CLI to let explicit flags win over an options file.
    pub fn merge(mut self, other: ConversionOptions) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if other.$field.is_some() { self.$field = other.$field; } )*
            };
        }
        take!(
            author,
            keywords,
            subject,
            title,
            password,
            edit_password,
            modify,
            print,
            dpi,
            margin,
            orientation,
            page_height,
            page_size,
            page_width,
            output
        );
        self
    }
}

/// Builder for [`ConversionOptions`].
#[derive(Debug)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.options.author = Some(author.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.options.subject = Some(subject.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = Some(title.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.options.password = Some(pwd.into());
        self
    }

    pub fn edit_password(mut self, pwd: impl Into<String>) -> Self {
        self.options.edit_password = Some(pwd.into());
        self
    }

    pub fn modify(mut self, level: ModifyPermission) -> Self {
        self.options.modify = Some(level);
        self
    }

    pub fn print(mut self, level: PrintPermission) -> Self {
        self.options.print = Some(level);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options.dpi = Some(dpi);
        self
    }

    pub fn margin(mut self, margin: impl Into<Margin>) -> Self {
        self.options.margin = Some(margin.into());
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = Some(orientation);
        self
    }

    pub fn page_height(mut self, height: impl Into<Length>) -> Self {
        self.options.page_height = Some(height.into());
        self
    }

    pub fn page_size(mut self, size: impl Into<String>) -> Self {
        self.options.page_size = Some(size.into());
        self
    }

    pub fn page_width(mut self, width: impl Into<Length>) -> Self {
        self.options.page_width = Some(width.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.output = Some(path.into());
        self
    }

    pub fn build(self) -> ConversionOptions {
        self.options
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// A renderer length: a bare number (renderer default unit, millimetres) or a
/// string carrying its own unit such as `"0.5in"`. Passed to the renderer verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    Number(f64),
    Text(String),
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Number(n) => write!(f, "{n}"),
            Length::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Length {
    fn from(v: f64) -> Self {
        Length::Number(v)
    }
}

impl From<i32> for Length {
    fn from(v: i32) -> Self {
        Length::Number(f64::from(v))
    }
}

impl From<u32> for Length {
    fn from(v: u32) -> Self {
        Length::Number(f64::from(v))
    }
}

impl From<&str> for Length {
    fn from(v: &str) -> Self {
        Length::Text(v.to_string())
    }
}

impl From<String> for Length {
    fn from(v: String) -> Self {
        Length::Text(v)
    }
}

/// Page margins.
///
/// A sequence is read positionally as top, right, bottom, left. Sequences
/// shorter than four entries set only the leading sides; extra entries are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Margin {
    /// Same margin on all four sides.
    Uniform(Length),
    /// Positional top, right, bottom, left.
    Sequence(Vec<Length>),
    /// Explicit sides; absent sides are left to the renderer default.
    Sides(MarginSides),
}

/// Per-side margins, each optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginSides {
    pub top: Option<Length>,
    pub right: Option<Length>,
    pub bottom: Option<Length>,
    pub left: Option<Length>,
}

impl From<Length> for Margin {
    fn from(v: Length) -> Self {
        Margin::Uniform(v)
    }
}

impl From<f64> for Margin {
    fn from(v: f64) -> Self {
        Margin::Uniform(v.into())
    }
}

impl From<i32> for Margin {
    fn from(v: i32) -> Self {
        Margin::Uniform(v.into())
    }
}

impl<T: Into<Length>, const N: usize> From<[T; N]> for Margin {
    fn from(v: [T; N]) -> Self {
        Margin::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Length>> for Margin {
    fn from(v: Vec<Length>) -> Self {
        Margin::Sequence(v)
    }
}

impl From<MarginSides> for Margin {
    fn from(v: MarginSides) -> Self {
        Margin::Sides(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // wkhtmltopdf documents the capitalised spellings.
        f.write_str(match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        })
    }
}

/// What a reader holding only the view password may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifyPermission {
    All,
    #[default]
    Annotate,
    Form,
    Assembly,
    None,
}

impl fmt::Display for ModifyPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModifyPermission::All => "all",
            ModifyPermission::Annotate => "annotate",
            ModifyPermission::Form => "form",
            ModifyPermission::Assembly => "assembly",
            ModifyPermission::None => "none",
        })
    }
}

/// Print quality a reader holding only the view password may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintPermission {
    #[default]
    Full,
    Low,
    None,
}

impl fmt::Display for PrintPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrintPermission::Full => "full",
            PrintPermission::Low => "low",
            PrintPermission::None => "none",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let opts = ConversionOptions::from_json(
            r#"{"title": "Report", "colour_scheme": "dark", "pages": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(opts.title.as_deref(), Some("Report"));
        assert_eq!(opts, ConversionOptions::builder().title("Report").build());
    }

    #[test]
    fn margin_forms_parse() {
        let uniform = ConversionOptions::from_json(r#"{"margin": 10}"#).unwrap();
        assert_eq!(uniform.margin, Some(Margin::Uniform(Length::Number(10.0))));

        let seq = ConversionOptions::from_json(r#"{"margin": [5, "10mm"]}"#).unwrap();
        assert_eq!(
            seq.margin,
            Some(Margin::Sequence(vec![
                Length::Number(5.0),
                Length::Text("10mm".into())
            ]))
        );

        let sides = ConversionOptions::from_json(r#"{"margin": {"top": 1, "left": 2}}"#).unwrap();
        assert_eq!(
            sides.margin,
            Some(Margin::Sides(MarginSides {
                top: Some(Length::Number(1.0)),
                left: Some(Length::Number(2.0)),
                ..Default::default()
            }))
        );
    }

    #[test]
    fn permissions_parse_lowercase() {
        let opts =
            ConversionOptions::from_json(r#"{"modify": "assembly", "print": "low"}"#).unwrap();
        assert_eq!(opts.modify, Some(ModifyPermission::Assembly));
        assert_eq!(opts.print, Some(PrintPermission::Low));
        assert!(opts.has_security());
    }

    #[test]
    fn bad_permission_is_an_options_error() {
        let err = ConversionOptions::from_json(r#"{"print": "sometimes"}"#).unwrap_err();
        assert_eq!(err.tag(), "invalid_options");
    }

    #[test]
    fn no_security_by_default() {
        assert!(!ConversionOptions::default().has_security());
        assert!(ConversionOptions::builder()
            .edit_password("owner")
            .build()
            .has_security());
    }

    #[test]
    fn length_display_is_verbatim() {
        assert_eq!(Length::from(5).to_string(), "5");
        assert_eq!(Length::from(2.5).to_string(), "2.5");
        assert_eq!(Length::from("0.5in").to_string(), "0.5in");
    }

    #[test]
    fn merge_prefers_fields_from_other() {
        let base = ConversionOptions::builder()
            .title("From file")
            .author("Ada")
            .build();
        let flags = ConversionOptions::builder().title("From flag").build();
        let merged = base.merge(flags);
        assert_eq!(merged.title.as_deref(), Some("From flag"));
        assert_eq!(merged.author.as_deref(), Some("Ada"));
    }
}
