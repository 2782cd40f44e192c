//! Pipeline stages for PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch OCR backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ surface ──▶ encode ──▶ ocr
//! (path/URL) (pdfium)  (RGBA8)    (PNG file)  (tesseract)
//! ```
//!
//! 1. [`input`]   — read the user-supplied path or URL fully into memory
//! 2. [`surface`] — the per-page render target and its viewport geometry
//! 3. [`render`]  — bind pdfium, load the document, rasterise pages; runs
//!    inside `spawn_blocking` because pdfium is not async-safe
//! 4. [`encode`]  — PNG-encode each surface and persist `output_page_<N>.png`
//! 5. [`ocr`]     — feed rendered pages to the Tesseract binary; the only
//!    stage that spawns an external process

pub mod encode;
pub mod input;
pub mod ocr;
pub mod render;
pub mod surface;
