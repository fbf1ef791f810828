//! Display surface: turns incoming frame buffers into a displayable RGBA
//! image of fixed resolution.
//!
//! The surface owns exactly one image. A frame either replaces it completely
//! or, if malformed, is rejected and the previous image stays on screen.
//! Painting the image onto a canvas is done by [`crate::engine::Engine`].

#[cfg(test)]
#[path = "display_test.rs"]
mod display_test;

use frames::{FrameBuffer, FrameError, PixelFormat};

/// Width and height in pixels, fixed for the life of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn pixel_count(self) -> usize {
        let w = usize::try_from(self.width).unwrap_or(0);
        let h = usize::try_from(self.height).unwrap_or(0);
        w.saturating_mul(h)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    #[error("frame is {got_w}x{got_h}, surface is {want_w}x{want_h}")]
    ResolutionMismatch { want_w: u32, want_h: u32, got_w: u32, got_h: u32 },
    #[error(transparent)]
    Malformed(#[from] FrameError),
}

/// Fixed-resolution RGBA image target.
#[derive(Debug, Clone)]
pub struct DisplaySurface {
    resolution: Resolution,
    image: Vec<u8>,
    frames_shown: u64,
}

impl DisplaySurface {
    /// A surface showing opaque black.
    #[must_use]
    pub fn new(resolution: Resolution) -> Self {
        let mut image = vec![0; resolution.pixel_count().saturating_mul(4)];
        for px in image.chunks_exact_mut(4) {
            px[3] = u8::MAX;
        }
        Self { resolution, image, frames_shown: 0 }
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Current image as tightly packed RGBA, row-major from the top-left.
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Number of frames successfully presented.
    #[must_use]
    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// Replace the current image with `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] when the frame's resolution differs from the
    /// surface's or its payload is inconsistent; the current image is left
    /// untouched in that case.
    pub fn present(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        if frame.width != self.resolution.width || frame.height != self.resolution.height {
            return Err(DisplayError::ResolutionMismatch {
                want_w: self.resolution.width,
                want_h: self.resolution.height,
                got_w: frame.width,
                got_h: frame.height,
            });
        }
        frame.check()?;
        convert_into(&frame.pixels, frame.format, &mut self.image);
        self.frames_shown += 1;
        Ok(())
    }
}

/// Convert a source payload into opaque RGBA.
///
/// The first three bytes of every source pixel are copied and alpha is forced
/// to 255; any source alpha is discarded.
#[must_use]
pub fn to_opaque_rgba(src: &[u8], format: PixelFormat) -> Vec<u8> {
    let pixels = src.len() / format.bytes_per_pixel();
    let mut out = vec![0; pixels.saturating_mul(4)];
    convert_into(src, format, &mut out);
    out
}

fn convert_into(src: &[u8], format: PixelFormat, dst: &mut [u8]) {
    let source = src.chunks_exact(format.bytes_per_pixel());
    for (out, px) in dst.chunks_exact_mut(4).zip(source) {
        out[..3].copy_from_slice(&px[..3]);
        out[3] = u8::MAX;
    }
}
