//! Result types returned by the conversion pipeline.
//!
//! [`ConversionOutput`] is the top-level result: the ordered per-page
//! records (including the rendered PNG bytes), the document metadata, and
//! aggregate run statistics. Per-page failures live inside the records as
//! [`crate::error::PageError`] values so callers can inspect partial
//! success instead of losing the whole document to one bad page.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The complete result of a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// One record per processed page, ordered by page number.
    ///
    /// Under [`crate::config::PageErrorPolicy::Halt`] the run stops at the
    /// first failing page, so this may be shorter than the document.
    pub pages: Vec<PageRecord>,
    /// Document-level metadata read before any page was rendered.
    pub metadata: DocumentMetadata,
    /// Aggregate statistics for the run.
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// The OCR text of all successfully recognised pages, in page order.
    pub fn recognized_text(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages
            .iter()
            .filter_map(|p| p.text.as_deref().map(|t| (p.page_num, t)))
    }
}

/// The outcome of one page's pipeline (render → encode → write → OCR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number.
    pub page_num: usize,
    /// Rendered width in pixels.
    pub width: u32,
    /// Rendered height in pixels.
    pub height: u32,
    /// The encoded PNG bytes for this page.
    ///
    /// Kept in memory so callers can post-process pages without re-reading
    /// the files; skipped during serialisation (a 100-page document would
    /// produce an enormous JSON blob otherwise).
    #[serde(skip)]
    pub png: Vec<u8>,
    /// Where the PNG was written, when persistence was enabled and the
    /// write succeeded.
    pub png_path: Option<PathBuf>,
    /// Recognised text, when OCR was enabled and succeeded.
    pub text: Option<String>,
    /// Wall-clock time spent on this page in milliseconds.
    pub duration_ms: u64,
    /// The failure that affected this page, if any.
    ///
    /// A record can carry both a usable `png` and an error: PNG write
    /// failures leave the rendered image intact.
    pub error: Option<PageError>,
}

impl PageRecord {
    /// Whether every step attempted for this page succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages whose full pipeline completed without error.
    pub processed_pages: usize,
    /// Pages that recorded an error.
    pub failed_pages: usize,
    /// PNG files successfully written to disk.
    pub written_files: usize,
    /// Pages for which OCR produced text.
    pub ocr_pages: usize,
    /// Total wall-clock duration in milliseconds.
    pub total_duration_ms: u64,
    /// Milliseconds spent rasterising pages.
    pub render_duration_ms: u64,
    /// Milliseconds spent in OCR recognition.
    pub ocr_duration_ms: u64,
}

/// Document metadata extracted from the PDF without rendering any page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
