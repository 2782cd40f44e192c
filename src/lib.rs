//! # pdf2png
//!
//! Convert the pages of a PDF document into PNG images, with optional OCR
//! text extraction per page.
//!
//! ## Why this crate?
//!
//! Archival and data-entry pipelines (invoices, scanned forms, contracts)
//! often need each PDF page as a plain raster image: for thumbnailing, for
//! feeding an OCR engine, or for downstream tools that cannot read PDF.
//! This crate rasterises each page via pdfium at a configurable scale,
//! writes lossless PNGs with deterministic names, and can feed every page
//! through Tesseract in the same pass.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL into memory
//!  ├─ 2. Load     parse the byte buffer via pdfium (spawn_blocking)
//!  └─ 3. Pages    for each page, strictly in order:
//!        ├─ render  rasterise into a fresh per-page surface
//!        ├─ encode  surface → PNG bytes, surface torn down
//!        ├─ write   output_page_<N>.png (optional, failures never fatal)
//!        └─ ocr     tesseract text extraction (optional)
//! ```
//!
//! Pages are processed one at a time: page N's full pipeline completes
//! before page N+1 is fetched. There is no parallelism across pages — by
//! design, for a single-document single-pass tool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2png::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .scale(2.4)
//!         .output_dir("out")
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     eprintln!(
//!         "{} pages rendered, {} files written",
//!         output.stats.processed_pages, output.stats.written_files
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2png` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2png = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * **pdfium** — resolved from `PDFIUM_LIB_PATH`, a copy next to the
//!   executable, or the system library.
//! * **tesseract** — only when OCR is enabled; resolved from `$PATH` or the
//!   configured binary path, with the requested language data installed.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageErrorPolicy};
pub use convert::{convert, convert_from_bytes, convert_sync, inspect};
pub use error::{PageError, Pdf2PngError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageRecord};
pub use pipeline::surface::{Surface, Viewport};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
