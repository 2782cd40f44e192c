//! Off-screen drawing surfaces and per-page viewports.
//!
//! A [`Surface`] is the render target for exactly one page: an RGBA8 pixel
//! buffer with explicit dimensions and an explicit destroyed state. The
//! renderer fills it, the encoder reads it, and it is torn down before the
//! next page begins — a surface's lifecycle never spans more than one page.
//!
//! ## Why an explicit `destroy`?
//!
//! A full-page buffer at scale 2.4 is ~12 MB. Dropping it eagerly — instead
//! of letting it live until the end of the iteration — keeps peak memory at
//! one page regardless of document length. `destroy` zeroes the dimensions
//! and releases the allocation; the `Drop` impl performs the same teardown
//! on every exit path, including errors, so no code path can leak a live
//! buffer into the next page.

use crate::error::Pdf2PngError;
use tracing::trace;

/// Bytes per pixel in the surface's RGBA8 buffer.
const BYTES_PER_PIXEL: usize = 4;

/// The pixel-space rectangle a page is rendered into: the page's intrinsic
/// point size multiplied by the configured scale factor.
///
/// Recomputed per page — page sizes within one document can differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// The scale factor the dimensions were derived from.
    pub scale: f32,
}

impl Viewport {
    /// Derive the viewport for a page of `width_pts` × `height_pts` points
    /// rendered at `scale`.
    ///
    /// # Errors
    /// [`Pdf2PngError::InvalidDimension`] when a derived dimension rounds to
    /// zero or below (degenerate page geometry, zero/negative scale).
    pub fn for_page(width_pts: f32, height_pts: f32, scale: f32) -> Result<Self, Pdf2PngError> {
        let width = (width_pts * scale) as i64;
        let height = (height_pts * scale) as i64;
        if width <= 0 || height <= 0 {
            return Err(Pdf2PngError::InvalidDimension { width, height });
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
            scale,
        })
    }
}

/// A mutable off-screen drawing target sized to one page's viewport.
///
/// Created per page via [`Surface::create`]; torn down via
/// [`Surface::destroy`] (or implicitly on drop). After destruction every
/// accessor fails with [`Pdf2PngError::MissingSurface`].
#[derive(Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    /// `None` once the surface has been destroyed.
    pixels: Option<Vec<u8>>,
}

impl Surface {
    /// Create a surface sized exactly to (`width`, `height`), zero-filled.
    ///
    /// # Errors
    /// [`Pdf2PngError::InvalidDimension`] if either dimension is zero.
    pub fn create(width: u32, height: u32) -> Result<Self, Pdf2PngError> {
        if width == 0 || height == 0 {
            return Err(Pdf2PngError::InvalidDimension {
                width: width as i64,
                height: height as i64,
            });
        }
        trace!(width, height, "surface created");
        Ok(Self {
            width,
            height,
            pixels: Some(vec![0; width as usize * height as usize * BYTES_PER_PIXEL]),
        })
    }

    /// Create a surface sized to a viewport.
    pub fn for_viewport(viewport: &Viewport) -> Result<Self, Pdf2PngError> {
        Self::create(viewport.width, viewport.height)
    }

    /// Resize the surface in place, discarding the current pixel content.
    ///
    /// Not part of the default per-page flow (a fresh surface is created for
    /// every page); used when the renderer's actual output dimensions differ
    /// from the requested viewport.
    ///
    /// # Errors
    /// [`Pdf2PngError::MissingSurface`] if the surface was destroyed;
    /// [`Pdf2PngError::InvalidDimension`] if either dimension is zero.
    pub fn reset(&mut self, width: u32, height: u32) -> Result<(), Pdf2PngError> {
        if self.pixels.is_none() {
            return Err(Pdf2PngError::MissingSurface);
        }
        if width == 0 || height == 0 {
            return Err(Pdf2PngError::InvalidDimension {
                width: width as i64,
                height: height as i64,
            });
        }
        self.width = width;
        self.height = height;
        self.pixels = Some(vec![0; width as usize * height as usize * BYTES_PER_PIXEL]);
        Ok(())
    }

    /// Tear the surface down: zero the dimensions and release the buffer.
    ///
    /// # Errors
    /// [`Pdf2PngError::MissingSurface`] if already destroyed.
    pub fn destroy(&mut self) -> Result<(), Pdf2PngError> {
        if self.pixels.is_none() {
            return Err(Pdf2PngError::MissingSurface);
        }
        trace!(width = self.width, height = self.height, "surface destroyed");
        self.width = 0;
        self.height = 0;
        self.pixels = None;
        Ok(())
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.pixels.is_none()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Immutable view of the RGBA8 pixel buffer.
    pub fn pixels(&self) -> Result<&[u8], Pdf2PngError> {
        self.pixels
            .as_deref()
            .ok_or(Pdf2PngError::MissingSurface)
    }

    /// Mutable view of the RGBA8 pixel buffer, for the renderer to fill.
    pub fn pixels_mut(&mut self) -> Result<&mut [u8], Pdf2PngError> {
        self.pixels
            .as_deref_mut()
            .ok_or(Pdf2PngError::MissingSurface)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // Teardown on every exit path; explicit destroy() already did this
        // in the normal flow.
        if self.pixels.is_some() {
            let _ = self.destroy();
        }
    }
}
