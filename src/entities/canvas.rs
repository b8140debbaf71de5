//! Owned RGBA drawing surface
//!
//! The renderer is the only writer. Every draw starts from [`Canvas::clear`]
//! so output never depends on what was drawn before: same frame + same size
//! gives the same bytes.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::fit::Placement;

/// Background behind letterbox bars and before the first frame
pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Resampling filter used when a frame is scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl Sampling {
    pub fn filter(self) -> FilterType {
        match self {
            Sampling::Nearest => FilterType::Nearest,
            Sampling::Triangle => FilterType::Triangle,
            Sampling::CatmullRom => FilterType::CatmullRom,
            Sampling::Gaussian => FilterType::Gaussian,
            Sampling::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// 8-bit RGBA pixel buffer
#[derive(Debug, Clone)]
pub struct Canvas {
    buffer: RgbaImage,
    background: Rgba<u8>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(width, height, BACKGROUND),
            background: BACKGROUND,
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn size(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// A zero-area canvas cannot be drawn into
    pub fn is_drawable(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Reallocate the drawing buffer. Returns `false` when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.size() == (width, height) {
            return false;
        }
        self.buffer = RgbaImage::from_pixel(width, height, self.background);
        true
    }

    /// Overwrite every pixel with the background
    pub fn clear(&mut self) {
        let bg = self.background;
        for px in self.buffer.pixels_mut() {
            *px = bg;
        }
    }

    /// Draw `image` scaled into `placement`, clipped to the canvas
    ///
    /// The whole frame is resized once to the placement's pixel-snapped size
    /// and then copied at its snapped offset, so both axes share one scale.
    /// Pixels are replaced, not blended. Returns `false` if nothing was drawn
    /// (empty canvas, empty image, or placement entirely off-canvas).
    pub fn draw_image(&mut self, image: &RgbaImage, placement: &Placement, sampling: Sampling) -> bool {
        let (iw, ih) = image.dimensions();
        if !self.is_drawable() || iw == 0 || ih == 0 {
            return false;
        }
        let finite = [placement.x, placement.y, placement.width, placement.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || placement.width <= 0.0 || placement.height <= 0.0 {
            return false;
        }

        // Snapped edges, so a cover placement still reaches every canvas edge
        let left = placement.x.round();
        let top = placement.y.round();
        let right = (placement.x + placement.width).round();
        let bottom = (placement.y + placement.height).round();
        let (cw, ch) = (f64::from(self.width()), f64::from(self.height()));
        if right <= 0.0 || bottom <= 0.0 || left >= cw || top >= ch {
            return false;
        }
        let dw = (right - left).max(1.0) as u32;
        let dh = (bottom - top).max(1.0) as u32;
        let (x, y) = (left as i64, top as i64);

        if (dw, dh) == (iw, ih) {
            imageops::replace(&mut self.buffer, image, x, y);
        } else {
            let scaled = imageops::resize(image, dw, dh, sampling.filter());
            imageops::replace(&mut self.buffer, &scaled, x, y);
        }
        true
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Raw RGBA bytes, row-major, tightly packed
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }
}
