//! Conversion entry points and the sequential page-loop driver.
//!
//! ## Why one `spawn_blocking` around the whole loop?
//!
//! pdfium is not async-safe, so the document handle must never cross an
//! await point. The driver therefore runs the entire page loop on one
//! blocking-pool thread: load the document once, then for each page in
//! strictly increasing order run the full pipeline — render into a fresh
//! surface, encode, optionally persist, optionally OCR — before the next
//! page is fetched. One page is in flight at a time; total latency scales
//! linearly with page count, which is the intended trade for a
//! single-document, single-pass tool.

use crate::config::{ConversionConfig, PageErrorPolicy};
use crate::error::{PageError, Pdf2PngError};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageRecord};
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::surface::Surface;
use crate::pipeline::{encode, input, render};
use pdfium_render::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a PDF file or URL to PNG page images.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` with one [`PageRecord`] per processed page. Under
/// [`PageErrorPolicy::Skip`] this includes failed pages (check
/// `record.error`); PNG write failures are recorded but never abort.
///
/// # Errors
/// Returns `Err(Pdf2PngError)` for fatal errors:
/// - File not found / permission denied / not a valid PDF
/// - Document parse failure, missing or wrong password
/// - OCR engine initialisation failure (only when OCR is enabled)
/// - A page failure under [`PageErrorPolicy::Halt`]
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PngError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // Read the whole document into memory before processing begins.
    let bytes = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_from_bytes(bytes, config).await
}

/// Convert PDF bytes already in memory.
///
/// This is the recommended API when PDF data comes from a database, network
/// stream, or in-memory buffer rather than a file on disk.
pub async fn convert_from_bytes(
    bytes: impl Into<Vec<u8>>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PngError> {
    let bytes = bytes.into();
    let config = config.clone();

    tokio::task::spawn_blocking(move || convert_blocking(&bytes, &config))
        .await
        .map_err(|e| Pdf2PngError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PngError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2PngError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Extract PDF metadata without rendering any page.
///
/// Does not require a tesseract install.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2PngError> {
    let bytes = input::resolve_input(input_str.as_ref(), 120).await?;

    tokio::task::spawn_blocking(move || {
        let pdfium = render::bind_pdfium()?;
        let document = render::load_document(&pdfium, &bytes, None)?;
        Ok(render::read_metadata(&document))
    })
    .await
    .map_err(|e| Pdf2PngError::Internal(format!("Inspect task panicked: {}", e)))?
}

// ── Blocking core ────────────────────────────────────────────────────────

/// Per-stage wall-clock accumulators for [`ConversionStats`].
#[derive(Default)]
struct StageTimings {
    render_ms: u64,
    ocr_ms: u64,
}

/// The sequential driver: document load, page loop, termination.
fn convert_blocking(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PngError> {
    let total_start = Instant::now();

    let pdfium = render::bind_pdfium()?;
    let document = render::load_document(&pdfium, bytes, config.password.as_deref())?;
    info!("PDF document loaded");

    let metadata = render::read_metadata(&document);
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // The OCR engine is created strictly before the first page fetch, and
    // only when OCR is enabled — disabled runs pay no model cost.
    let ocr = if config.ocr_enabled {
        Some(OcrEngine::initialize(config)?)
    } else {
        None
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    let mut pages: Vec<PageRecord> = Vec::with_capacity(total_pages);
    let mut timings = StageTimings::default();

    // Page indices strictly increasing; a 0-page document skips the loop
    // entirely and terminates cleanly.
    for page_num in 1..=total_pages {
        info!("Processing page {}/{}", page_num, total_pages);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        // Index invalidity here would be an internal bug (bounds come from
        // the document itself), so fetch failure is fatal rather than a
        // per-page condition.
        let page = render::fetch_page(&document, page_num)?;
        let record = process_page(&page, page_num, total_pages, config, ocr.as_ref(), &mut timings);

        match &record.error {
            Some(err) => {
                warn!("{}", err);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total_pages, err.to_string());
                }
                let halt = config.on_page_error == PageErrorPolicy::Halt
                    && !err.is_always_recoverable();
                if halt {
                    if let Some(ref cb) = config.progress_callback {
                        let done = pages.iter().filter(|p| p.is_success()).count();
                        cb.on_conversion_complete(total_pages, done);
                    }
                    return Err(Pdf2PngError::PageFailed {
                        page: page_num,
                        source: err.clone(),
                    });
                }
                pages.push(record);
            }
            None => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total_pages, record.png.len());
                }
                pages.push(record);
            }
        }
    }

    let processed = pages.iter().filter(|p| p.is_success()).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_pages, processed);
    }

    let stats = ConversionStats {
        total_pages,
        processed_pages: processed,
        failed_pages: pages.len() - processed,
        written_files: pages.iter().filter(|p| p.png_path.is_some()).count(),
        ocr_pages: pages.iter().filter(|p| p.text.is_some()).count(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms: timings.render_ms,
        ocr_duration_ms: timings.ocr_ms,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        processed, total_pages, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        pages,
        metadata,
        stats,
    })
}

/// Run one page's full pipeline: viewport → surface → render → encode →
/// teardown → optional write → optional OCR.
///
/// Always returns a `PageRecord`; failures are stored in `record.error` and
/// the caller decides (per the error policy) whether they abort the run.
fn process_page(
    page: &PdfPage<'_>,
    page_num: usize,
    total_pages: usize,
    config: &ConversionConfig,
    ocr: Option<&OcrEngine>,
    timings: &mut StageTimings,
) -> PageRecord {
    let page_start = Instant::now();
    let mut record = PageRecord {
        page_num,
        width: 0,
        height: 0,
        png: Vec::new(),
        png_path: None,
        text: None,
        duration_ms: 0,
        error: None,
    };

    // Render + encode. The surface lives only inside this block: created for
    // this page, destroyed before the write/OCR steps, and released by its
    // Drop impl on the error paths.
    let render_start = Instant::now();
    let rendered = (|| -> Result<(u32, u32, Vec<u8>), PageError> {
        let viewport = render::page_viewport(page, config.scale).map_err(|e| {
            PageError::RenderFailure {
                page: page_num,
                detail: e.to_string(),
            }
        })?;
        info!(
            "Page {}/{}: viewport {}x{} (scale {})",
            page_num, total_pages, viewport.width, viewport.height, viewport.scale
        );

        let mut surface = Surface::for_viewport(&viewport).map_err(|e| {
            PageError::RenderFailure {
                page: page_num,
                detail: e.to_string(),
            }
        })?;
        render::render_page_into(page, page_num, &viewport, &mut surface)?;

        let width = surface.width();
        let height = surface.height();
        let png = encode::encode_surface(&surface, page_num)?;

        // Freshly created above, so this cannot fail with a missing surface.
        let _ = surface.destroy();

        Ok((width, height, png))
    })();
    timings.render_ms += render_start.elapsed().as_millis() as u64;

    match rendered {
        Ok((width, height, png)) => {
            record.width = width;
            record.height = height;
            record.png = png;
        }
        Err(err) => {
            record.error = Some(err);
            record.duration_ms = page_start.elapsed().as_millis() as u64;
            return record;
        }
    }

    // Persist. Write failures are logged and recorded but never stop the
    // page — OCR still runs and the loop continues.
    if config.write_pages {
        match encode::write_page(&config.output_dir, page_num, &record.png) {
            Ok(path) => {
                info!(
                    "Finished converting page {} of {} to '{}'",
                    page_num,
                    total_pages,
                    path.display()
                );
                record.png_path = Some(path);
            }
            Err(err) => {
                warn!("{}", err);
                record.error = Some(err);
            }
        }
    }

    // OCR. A recognition failure outranks a recorded write failure: the
    // error policy only inspects the non-recoverable error.
    if let Some(engine) = ocr {
        let ocr_start = Instant::now();
        match engine.recognize(&record.png, page_num) {
            Ok(text) => record.text = Some(text),
            Err(err) => record.error = Some(err),
        }
        timings.ocr_ms += ocr_start.elapsed().as_millis() as u64;
    }

    record.duration_ms = page_start.elapsed().as_millis() as u64;
    record
}
