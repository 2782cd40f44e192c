//! PDF rasterisation: bind pdfium, load the document, render pages into
//! surfaces.
//!
//! ## Why everything here is blocking
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. The driver runs the whole page loop — and therefore every
//! function in this module — inside `tokio::task::spawn_blocking`, so
//! document and page handles never cross an await point.
//!
//! ## Binding resolution
//!
//! `PDFIUM_LIB_PATH` (file or directory) is honoured first, then a copy of
//! the library next to the executable, then the system library.

use crate::error::{PageError, Pdf2PngError};
use crate::output::DocumentMetadata;
use crate::pipeline::surface::{Surface, Viewport};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Bind to a pdfium library.
pub(crate) fn bind_pdfium() -> Result<Pdfium, Pdf2PngError> {
    let bindings = if let Ok(configured) = std::env::var("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(&configured);
        let library = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&configured)
        } else {
            path
        };
        Pdfium::bind_to_library(library)
    } else {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
    }
    .map_err(|e| Pdf2PngError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Parse the in-memory byte buffer into a document handle.
pub(crate) fn load_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&str>,
) -> Result<PdfDocument<'a>, Pdf2PngError> {
    pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2PngError::WrongPassword
            } else {
                Pdf2PngError::PasswordRequired
            }
        } else {
            Pdf2PngError::DocumentLoadFailure { detail: err_str }
        }
    })
}

/// Read document-level metadata. No page is rendered.
pub(crate) fn read_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Fetch the page handle for a 1-based page number.
pub(crate) fn fetch_page<'a>(
    document: &PdfDocument<'a>,
    page_num: usize,
) -> Result<PdfPage<'a>, Pdf2PngError> {
    let total = document.pages().len() as usize;
    if page_num == 0 || page_num > total {
        return Err(Pdf2PngError::PageFetchFailure {
            page: page_num,
            total,
        });
    }
    document
        .pages()
        .get((page_num - 1) as u16)
        .map_err(|_| Pdf2PngError::PageFetchFailure {
            page: page_num,
            total,
        })
}

/// Derive the viewport for a page at the configured scale.
pub(crate) fn page_viewport(page: &PdfPage, scale: f32) -> Result<Viewport, Pdf2PngError> {
    Viewport::for_page(page.width().value, page.height().value, scale)
}

/// Rasterise `page` into `surface`, which must be sized to `viewport`.
///
/// pdfium draws into its own bitmap; the RGBA pixels are then copied into
/// the surface. If pdfium's output dimensions differ from the requested
/// viewport (rounding inside the renderer), the surface is reset to the
/// actual output size so the copy stays exact.
pub(crate) fn render_page_into(
    page: &PdfPage,
    page_num: usize,
    viewport: &Viewport,
    surface: &mut Surface,
) -> Result<(), PageError> {
    let render_config = PdfRenderConfig::new()
        .set_target_width(viewport.width as i32)
        .set_target_height(viewport.height as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PageError::RenderFailure {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image().into_rgba8();
    let (width, height) = image.dimensions();
    debug!("Rendered page {} → {}x{} px", page_num, width, height);

    if (width, height) != (surface.width(), surface.height()) {
        surface
            .reset(width, height)
            .map_err(|e| PageError::RenderFailure {
                page: page_num,
                detail: format!("surface reset to renderer output {width}x{height} failed: {e}"),
            })?;
    }

    surface
        .pixels_mut()
        .map_err(|e| PageError::RenderFailure {
            page: page_num,
            detail: e.to_string(),
        })?
        .copy_from_slice(image.as_raw());

    Ok(())
}
