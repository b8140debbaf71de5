//! Scroll position → frame index mapping
//!
//! The scroll region is the stretch of page height over which the whole
//! sequence plays. Progress runs from 0 when the region's top reaches the top
//! of the viewport to 1 when its bottom reaches the bottom of the viewport:
//!
//! ```text
//! progress   = clamp((scroll - region_top) / (region_height - viewport_height), 0, 1)
//! frame      = min(N - 1, floor(progress * N))
//! ```
//!
//! A region no taller than the viewport has no scrollable span; progress then
//! snaps to 0 at or before the region top and to 1 past it. NaN never escapes.

use serde::{Deserialize, Serialize};

/// Fraction of the viewport height over which the hero overlay fades out
pub const HERO_FADE_FRACTION: f64 = 0.4;

/// Scroll offset below which the scroll cue stays visible
pub const SCROLL_CUE_LIMIT: f64 = 60.0;

/// Host-supplied geometry, in CSS pixels (or any consistent unit)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Current scroll offset of the page
    pub scroll_offset: f64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Offset of the scroll region from the top of the page
    pub region_top: f64,
    pub region_height: f64,
}

impl ScrollMetrics {
    pub fn progress(&self) -> f64 {
        scroll_progress(
            self.scroll_offset,
            self.region_top,
            self.region_height,
            f64::from(self.viewport_height),
        )
    }

    pub fn frame_index(&self, total_frames: usize) -> usize {
        frame_index(self.progress(), total_frames)
    }

    /// Same geometry at a different scroll offset
    pub fn with_scroll(self, scroll_offset: f64) -> Self {
        Self {
            scroll_offset,
            ..self
        }
    }

    /// Scroll offset at which progress reaches 1
    pub fn scroll_end(&self) -> f64 {
        self.region_top + (self.region_height - f64::from(self.viewport_height)).max(0.0)
    }

    /// Hero overlay opacity: 1 at the top of the page, 0 once the page has
    /// scrolled 40% of the viewport height
    pub fn hero_opacity(&self) -> f64 {
        let fade = f64::from(self.viewport_height) * HERO_FADE_FRACTION;
        if self.scroll_offset.is_nan() {
            return 1.0;
        }
        if fade <= 0.0 {
            return if self.scroll_offset > 0.0 { 0.0 } else { 1.0 };
        }
        (1.0 - self.scroll_offset / fade).clamp(0.0, 1.0)
    }

    /// Whether the "scroll down" cue is shown
    pub fn show_scroll_cue(&self) -> bool {
        // NaN compares false and hides the cue
        self.scroll_offset < SCROLL_CUE_LIMIT
    }
}

/// Normalized progress through the scroll region, always in [0, 1]
pub fn scroll_progress(
    scroll_offset: f64,
    region_top: f64,
    region_height: f64,
    viewport_height: f64,
) -> f64 {
    let relative = scroll_offset - region_top;
    if relative.is_nan() {
        return 0.0;
    }

    let span = region_height - viewport_height;
    if span.is_nan() || span <= 0.0 {
        return if relative > 0.0 { 1.0 } else { 0.0 };
    }

    let progress = relative / span;
    if progress.is_nan() {
        // inf / inf
        return if relative > 0.0 { 1.0 } else { 0.0 };
    }
    progress.clamp(0.0, 1.0)
}

/// Frame index for a progress value, in [0, total_frames - 1]
pub fn frame_index(progress: f64, total_frames: usize) -> usize {
    if total_frames == 0 {
        return 0;
    }
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let index = (progress * total_frames as f64).floor() as usize;
    index.min(total_frames - 1)
}

/// HUD label, 1-based: `FRAME 001 / 214`
pub fn frame_label(index: usize, total_frames: usize) -> String {
    format!("FRAME {:03} / {}", index + 1, total_frames)
}
