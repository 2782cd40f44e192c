//! Image persistence: surface pixels → PNG bytes → `output_page_<N>.png`.
//!
//! PNG is lossless — text crispness matters for downstream OCR, and a fixed
//! scale plus deterministic encoding means re-running the same conversion
//! overwrites each file with byte-identical content. File names are derived
//! only from the 1-based page number; existing files are overwritten
//! without warning.

use crate::error::PageError;
use crate::pipeline::surface::Surface;
use image::{ImageBuffer, Rgba};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encode a rendered surface as PNG bytes.
pub(crate) fn encode_surface(surface: &Surface, page_num: usize) -> Result<Vec<u8>, PageError> {
    let pixels = surface.pixels().map_err(|e| PageError::EncodeFailure {
        page: page_num,
        detail: e.to_string(),
    })?;

    let image: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(surface.width(), surface.height(), pixels.to_vec()).ok_or_else(
            || PageError::EncodeFailure {
                page: page_num,
                detail: format!(
                    "pixel buffer does not match dimensions {}x{}",
                    surface.width(),
                    surface.height()
                ),
            },
        )?;

    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PageError::EncodeFailure {
            page: page_num,
            detail: e.to_string(),
        })?;

    debug!("Encoded page {} → {} PNG bytes", page_num, buf.len());
    Ok(buf)
}

/// The deterministic output file name for a 1-based page number.
pub(crate) fn page_file_name(page_num: usize) -> String {
    format!("output_page_{}.png", page_num)
}

/// Persist a page's PNG bytes, overwriting any existing file.
///
/// Runs on the blocking pool alongside the rest of the page loop, so plain
/// `std::fs` is the right tool here.
pub(crate) fn write_page(
    output_dir: &Path,
    page_num: usize,
    png: &[u8],
) -> Result<PathBuf, PageError> {
    let path = output_dir.join(page_file_name(page_num));
    std::fs::write(&path, png).map_err(|e| PageError::IoFailure {
        page: page_num,
        path: path.clone(),
        detail: e.to_string(),
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_one_based_and_deterministic() {
        assert_eq!(page_file_name(1), "output_page_1.png");
        assert_eq!(page_file_name(42), "output_page_42.png");
    }

    #[test]
    fn encode_produces_decodable_png_with_same_dimensions() {
        let mut surface = Surface::create(8, 4).unwrap();
        surface.pixels_mut().unwrap().fill(200);

        let png = encode_surface(&surface, 1).expect("encode should succeed");
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&png).expect("valid PNG");
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 4);
    }

    #[test]
    fn encode_is_deterministic_for_identical_pixels() {
        let mut a = Surface::create(6, 6).unwrap();
        a.pixels_mut().unwrap().fill(17);
        let mut b = Surface::create(6, 6).unwrap();
        b.pixels_mut().unwrap().fill(17);

        assert_eq!(
            encode_surface(&a, 1).unwrap(),
            encode_surface(&b, 2).unwrap()
        );
    }

    #[test]
    fn encode_destroyed_surface_fails() {
        let mut surface = Surface::create(4, 4).unwrap();
        surface.destroy().unwrap();
        let err = encode_surface(&surface, 3).unwrap_err();
        assert!(matches!(err, PageError::EncodeFailure { page: 3, .. }));
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("output_page_1.png"), b"stale").unwrap();

        let path = write_page(dir.path(), 1, b"fresh").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
    }

    #[test]
    fn write_failure_is_io_failure() {
        let err = write_page(Path::new("/nonexistent-dir-for-test"), 2, b"x").unwrap_err();
        assert!(matches!(err, PageError::IoFailure { page: 2, .. }));
        assert!(err.is_always_recoverable());
    }
}
