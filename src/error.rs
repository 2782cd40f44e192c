//! Error types for the pdf2png library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2PngError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input file, wrong password, pdfium missing, OCR engine could not
//!   be initialised). Returned as `Err(Pdf2PngError)` from the top-level
//!   `convert*` functions.
//!
//! * [`PageError`] — **Per-page**: something went wrong while rendering,
//!   encoding, writing, or OCR-ing a single page. Stored inside
//!   [`crate::output::PageRecord`] so callers can inspect exactly which
//!   pages failed. Whether a page error aborts the run is decided by the
//!   configured [`crate::config::PageErrorPolicy`] — except PNG write
//!   failures, which are always logged and never abort.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2png library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageRecord`]; they only surface here (as
/// [`Pdf2PngError::PageFailed`]) when the error policy is set to halt.
#[derive(Debug, Error)]
pub enum Pdf2PngError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read, but is not a PDF.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The PDF byte buffer could not be parsed into a document.
    #[error("Failed to load PDF document: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    DocumentLoadFailure { detail: String },

    /// PDF requires a password but none was provided.
    #[error("The PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for the PDF document")]
    WrongPassword,

    /// A page index outside 1..=page_count was requested.
    ///
    /// Not expected in the normal flow — the driver derives its bounds from
    /// the document's own page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageFetchFailure { page: usize, total: usize },

    // ── Surface errors ────────────────────────────────────────────────────
    /// A surface (or viewport) was requested with a non-positive dimension.
    #[error("Invalid surface dimensions {width}x{height}: both must be positive")]
    InvalidDimension { width: i64, height: i64 },

    /// A surface operation was attempted after the surface was destroyed.
    #[error("Surface is not available (already destroyed)")]
    MissingSurface,

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine could not be initialised (binary missing, language
    /// data not installed, …).
    #[error("OCR engine initialisation failed: {detail}\nInstall tesseract and the required language data, or point --ocr-binary at an existing install.")]
    OcrInitFailed { detail: String },

    // ── Page escalation ───────────────────────────────────────────────────
    /// A page failed and the error policy is set to halt the run.
    #[error("Page {page} failed, halting run: {source}")]
    PageFailed {
        page: usize,
        #[source]
        source: PageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
executable, or install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// An error affecting a single page.
///
/// Stored in [`crate::output::PageRecord`] when a page fails. Render, encode
/// and OCR failures are subject to the configured
/// [`crate::config::PageErrorPolicy`]; write failures never abort the run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Rasterisation of the page content stream failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailure { page: usize, detail: String },

    /// PNG encoding of the rendered pixel buffer failed.
    #[error("Page {page}: PNG encoding failed: {detail}")]
    EncodeFailure { page: usize, detail: String },

    /// The PNG file could not be written. Logged, never fatal.
    #[error("Page {page}: failed to write '{path}': {detail}")]
    IoFailure {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// Text recognition failed for this page.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailure { page: usize, detail: String },
}

impl PageError {
    /// PNG write failures are reported to the operator but never abort the
    /// run, regardless of the configured error policy.
    pub fn is_always_recoverable(&self) -> bool {
        matches!(self, PageError::IoFailure { .. })
    }

    /// The 1-based page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailure { page, .. }
            | PageError::EncodeFailure { page, .. }
            | PageError::IoFailure { page, .. }
            | PageError::OcrFailure { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimension_display() {
        let e = Pdf2PngError::InvalidDimension {
            width: 0,
            height: 600,
        };
        let msg = e.to_string();
        assert!(msg.contains("0x600"), "got: {msg}");
    }

    #[test]
    fn page_failed_carries_source() {
        let e = Pdf2PngError::PageFailed {
            page: 3,
            source: PageError::RenderFailure {
                page: 3,
                detail: "bad content stream".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 3"), "got: {msg}");
        assert!(msg.contains("bad content stream"), "got: {msg}");
    }

    #[test]
    fn io_failure_is_always_recoverable() {
        let e = PageError::IoFailure {
            page: 1,
            path: PathBuf::from("output_page_1.png"),
            detail: "disk full".into(),
        };
        assert!(e.is_always_recoverable());

        let e = PageError::RenderFailure {
            page: 1,
            detail: "x".into(),
        };
        assert!(!e.is_always_recoverable());
    }

    #[test]
    fn page_error_reports_page_number() {
        let e = PageError::OcrFailure {
            page: 7,
            detail: "tesseract exited with status 1".into(),
        };
        assert_eq!(e.page(), 7);
    }
}
