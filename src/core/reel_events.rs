//! Scroll, resize and loading events.

use crate::entities::ScrollMetrics;

// === Host input ===

/// Page scrolled; carries the geometry at the time of the scroll
#[derive(Clone, Debug)]
pub struct ScrollEvent(pub ScrollMetrics);

/// Viewport resized; carries the new geometry
#[derive(Clone, Debug)]
pub struct ResizeEvent(pub ScrollMetrics);

// === Loading ===

/// One more frame finished (success or failure)
#[derive(Clone, Debug)]
pub struct LoadProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Every frame finished; emitted once per loader
#[derive(Clone, Debug)]
pub struct FramesReadyEvent {
    pub total: usize,
    pub failed: usize,
}
