//! Configuration types for PDF-to-PNG conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs, serialise them for logging, and diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Pdf2PngError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for one PDF-to-PNG conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2png::{ConversionConfig, PageErrorPolicy};
///
/// let config = ConversionConfig::builder()
///     .scale(2.0)
///     .ocr_enabled(true)
///     .ocr_languages("deu+eng")
///     .on_page_error(PageErrorPolicy::Skip)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rasterisation scale factor applied to each page's intrinsic point
    /// size. Range: 0.1–8.0. Default: 2.4.
    ///
    /// PDF pages are measured in points (1/72 inch); a scale of 1.0 renders
    /// at 72 DPI. The 2.4 default (≈173 DPI) keeps text sharp enough for OCR
    /// while a US Letter page stays under 1500×2000 px.
    pub scale: f32,

    /// Persist each rendered page as `output_page_<N>.png`. Default: true.
    ///
    /// When false, pages are still rendered and kept in the in-memory result
    /// (and fed to OCR when enabled) but nothing is written to disk.
    pub write_pages: bool,

    /// Directory PNG files are written into. Default: the process's current
    /// working directory. Existing files of the same name are overwritten
    /// without warning.
    pub output_dir: PathBuf,

    /// Run OCR text extraction on each rendered page. Default: false.
    ///
    /// The OCR engine is only initialised when this is true, so disabled
    /// runs pay no model-load cost at all.
    pub ocr_enabled: bool,

    /// Tesseract language set, codes joined with `+` (e.g. "deu+eng").
    /// Default: "deu+eng".
    ///
    /// Every listed language must be installed; initialisation fails
    /// otherwise rather than silently recognising with a partial set.
    pub ocr_languages: String,

    /// Explicit path to the tesseract binary. If None, `tesseract` is
    /// resolved from `$PATH`.
    pub ocr_binary: Option<PathBuf>,

    /// What to do when a page's render, encode, or OCR step fails.
    /// Default: [`PageErrorPolicy::Halt`].
    ///
    /// PNG write failures are exempt: they are logged and recorded but never
    /// abort the run under either policy.
    pub on_page_error: PageErrorPolicy,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scale: 2.4,
            write_pages: true,
            output_dir: PathBuf::from("."),
            ocr_enabled: false,
            ocr_languages: "deu+eng".to_string(),
            ocr_binary: None,
            on_page_error: PageErrorPolicy::default(),
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("scale", &self.scale)
            .field("write_pages", &self.write_pages)
            .field("output_dir", &self.output_dir)
            .field("ocr_enabled", &self.ocr_enabled)
            .field("ocr_languages", &self.ocr_languages)
            .field("ocr_binary", &self.ocr_binary)
            .field("on_page_error", &self.on_page_error)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale.clamp(0.1, 8.0);
        self
    }

    pub fn write_pages(mut self, v: bool) -> Self {
        self.config.write_pages = v;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr_enabled = v;
        self
    }

    pub fn ocr_languages(mut self, langs: impl Into<String>) -> Self {
        self.config.ocr_languages = langs.into();
        self
    }

    pub fn ocr_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ocr_binary = Some(path.into());
        self
    }

    pub fn on_page_error(mut self, policy: PageErrorPolicy) -> Self {
        self.config.on_page_error = policy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2PngError> {
        let c = &self.config;
        if !(0.1..=8.0).contains(&c.scale) || !c.scale.is_finite() {
            return Err(Pdf2PngError::InvalidConfig(format!(
                "scale must be 0.1–8.0, got {}",
                c.scale
            )));
        }
        if c.ocr_enabled && !is_valid_language_set(&c.ocr_languages) {
            return Err(Pdf2PngError::InvalidConfig(format!(
                "OCR language set '{}' is malformed; expected codes joined \
                 with '+', e.g. 'deu+eng'",
                c.ocr_languages
            )));
        }
        Ok(self.config)
    }
}

/// A language set is one or more non-empty ASCII-alphanumeric codes joined
/// with `+`. Tesseract script names use underscores ("script/Latin" style
/// names are not accepted here).
fn is_valid_language_set(langs: &str) -> bool {
    !langs.is_empty()
        && langs.split('+').all(|code| {
            !code.is_empty()
                && code
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the driver does when a page's render, encode, or OCR step fails.
///
/// The original behaviour was to stop everything on the first failure, so
/// `Halt` is the default; `Skip` records the failure in the page's result
/// and continues with the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageErrorPolicy {
    /// Abort the run on the first failing page (default).
    #[default]
    Halt,
    /// Log the failure, record it in the page's result, and continue.
    Skip,
}
