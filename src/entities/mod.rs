//! Entities - plain data types shared by the loader and the renderer
//!
//! Nothing here touches threads or events; the engine in `core` drives them.

pub mod canvas;
pub mod fit;
pub mod frame;
pub mod scroll;
pub mod sequence;

pub use canvas::{Canvas, Sampling};
pub use fit::{FitMode, Placement};
pub use frame::{Frame, FrameError, FrameStatus};
pub use scroll::{
    frame_index, frame_label, scroll_progress, ScrollMetrics, HERO_FADE_FRACTION, SCROLL_CUE_LIMIT,
};
pub use sequence::{FramePattern, FrameSequence, DEFAULT_PATTERN};
