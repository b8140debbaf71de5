//! SCROLLREEL - scroll-driven image sequence engine
//!
//! Preloads a numbered still-image sequence, maps a scroll position inside a
//! page region to a frame index and composites that frame into an owned RGBA
//! canvas. Hosts feed scroll/resize events through the event bus.

// Core engine (events, loading, scheduling, rendering)
pub mod core;

// Data types
pub mod entities;

// App modules
pub mod cli;
pub mod config;
pub mod paths;
pub mod reel;
pub mod runner;

// Re-export commonly used types
pub use config::{ConfigError, ReelConfig};
pub use core::{
    DrawOutcome, EventBus, FrameLoader, FrameSource, RendererHandle, RendererOptions,
    ScrollFrameRenderer, Workers,
};
pub use entities::{Canvas, FitMode, Frame, FrameError, FrameSequence, ScrollMetrics};
pub use reel::Reel;
