//! Letterboxing math: where a frame lands on the canvas
//!
//! Two strategies, picked once per renderer:
//!
//! - `Cover`: canvas buffer = viewport size. The image is scaled uniformly
//!   until it covers the whole canvas, centered, and the overflowing
//!   dimension is clipped.
//! - `Contain`: canvas buffer = the image's native resolution, copied 1:1.
//!   The host shows the canvas letterboxed (`object-fit: contain`);
//!   [`Placement::contain`] gives the on-screen rectangle for that.

use serde::{Deserialize, Serialize};

/// Letterboxing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Cover,
    Contain,
}

impl FitMode {
    /// Canvas buffer size for a frame of `image` size shown in `viewport`
    pub fn canvas_size(self, image: (u32, u32), viewport: (u32, u32)) -> (u32, u32) {
        match self {
            FitMode::Cover => viewport,
            FitMode::Contain => image,
        }
    }

    /// Where the frame is drawn inside a canvas of `canvas` size
    pub fn placement(self, image: (u32, u32), canvas: (u32, u32)) -> Option<Placement> {
        match self {
            FitMode::Cover => Placement::cover(image, canvas),
            FitMode::Contain => Placement::native(image),
        }
    }
}

/// Destination rectangle of the scaled image, canvas coordinates
///
/// May extend past the canvas (cover) or leave bars (contain).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Scale to cover `canvas`, centering the clipped overflow
    pub fn cover(image: (u32, u32), canvas: (u32, u32)) -> Option<Self> {
        let (iw, ih, cw, ch) = dims(image, canvas)?;
        let image_ratio = iw / ih;
        let canvas_ratio = cw / ch;

        let placement = if canvas_ratio > image_ratio {
            // Canvas is wider: match width, crop top and bottom
            let height = cw / image_ratio;
            Self {
                x: 0.0,
                y: (ch - height) / 2.0,
                width: cw,
                height,
            }
        } else {
            // Canvas is taller (or equal): match height, crop the sides
            let width = ch * image_ratio;
            Self {
                x: (cw - width) / 2.0,
                y: 0.0,
                width,
                height: ch,
            }
        };
        Some(placement)
    }

    /// Scale to fit inside `canvas`, centering the empty bars
    pub fn contain(image: (u32, u32), canvas: (u32, u32)) -> Option<Self> {
        let (iw, ih, cw, ch) = dims(image, canvas)?;
        let scale = (cw / iw).min(ch / ih);
        let width = iw * scale;
        let height = ih * scale;
        Some(Self {
            x: (cw - width) / 2.0,
            y: (ch - height) / 2.0,
            width,
            height,
        })
    }

    /// Image at its native size in the top-left corner
    pub fn native(image: (u32, u32)) -> Option<Self> {
        if image.0 == 0 || image.1 == 0 {
            return None;
        }
        Some(Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(image.0),
            height: f64::from(image.1),
        })
    }

    /// Uniform scale factor relative to the source width
    pub fn scale(&self, image_width: u32) -> f64 {
        self.width / f64::from(image_width)
    }
}

fn dims(image: (u32, u32), canvas: (u32, u32)) -> Option<(f64, f64, f64, f64)> {
    if image.0 == 0 || image.1 == 0 || canvas.0 == 0 || canvas.1 == 0 {
        return None;
    }
    Some((
        f64::from(image.0),
        f64::from(image.1),
        f64::from(canvas.0),
        f64::from(canvas.1),
    ))
}
