//! Core engine modules - events, loading, scheduling, rendering
//!
//! These modules drive the entities, independent of any host surface.

pub mod draw_scheduler;
pub mod event_bus;
pub mod frame_loader;
pub mod reel_events;
pub mod renderer;
pub mod workers;

// Re-exports for convenience
pub use draw_scheduler::{DrawReason, DrawSchedule, DrawScheduler};
pub use event_bus::{EventBus, Subscription, SubscriptionId};
pub use frame_loader::{DiskSource, FrameLoader, FrameSource, LoadCompletion, LoadState, LoadTransition};
pub use reel_events::{FramesReadyEvent, LoadProgressEvent, ResizeEvent, ScrollEvent};
pub use renderer::{
    DrawOutcome, InitialFrame, MissingFramePolicy, RendererHandle, RendererOptions,
    ScrollFrameRenderer, SkipReason,
};
pub use workers::Workers;
