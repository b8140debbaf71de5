//! ScrollFrameRenderer - scroll position in, letterboxed frame out
//!
//! **Why**: The hero animation is a pure function of scroll position. The
//! renderer owns that mapping plus the canvas, and decides when a draw is due.
//!
//! **Used by**: hosts via `RendererHandle` (event bus) or directly
//!
//! # Draw triggers
//!
//! | Event          | Recomputes index | Draws                          |
//! |----------------|------------------|--------------------------------|
//! | scroll         | yes              | only if the index changed      |
//! | resize         | yes              | always (canvas size may change)|
//! | frames ready   | per InitialFrame | always, once                   |
//!
//! Nothing draws before frames are ready. A skipped draw leaves the canvas
//! exactly as it was: no resize, no clear.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::draw_scheduler::{DrawReason, DrawSchedule, DrawScheduler};
use crate::core::event_bus::{EventBus, Subscription};
use crate::core::reel_events::{FramesReadyEvent, ResizeEvent, ScrollEvent};
use crate::entities::{frame_label, Canvas, FitMode, FrameSequence, Sampling, ScrollMetrics};
use image::RgbaImage;

/// Which frame the first draw after readiness shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialFrame {
    /// Always frame 0
    First,
    /// Frame for the latest scroll metrics, frame 0 if none arrived yet
    #[default]
    ScrollDerived,
}

/// What to show when the target frame failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFramePolicy {
    /// Skip the draw, previous canvas content stays
    #[default]
    Skip,
    /// Draw the nearest earlier frame that loaded
    HoldPrevious,
}

/// Fixed per renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    pub fit: FitMode,
    pub initial_frame: InitialFrame,
    pub missing_frame: MissingFramePolicy,
    pub draw_schedule: DrawSchedule,
    pub sampling: Sampling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotReady,
    /// Zero-area target (viewport unknown or collapsed)
    CanvasUnavailable,
    /// Target frame failed and no fallback applies
    FrameMissing(usize),
}

/// Result of handling one event or tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// `index` is the target frame, `source` the frame actually painted
    Drawn {
        index: usize,
        source: usize,
        width: u32,
        height: u32,
    },
    Skipped(SkipReason),
    /// Queued for the next tick
    Deferred,
    /// Index unchanged, canvas already shows it
    Unchanged,
}

impl DrawOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, DrawOutcome::Drawn { .. })
    }
}

pub struct ScrollFrameRenderer {
    sequence: FrameSequence,
    options: RendererOptions,
    canvas: Canvas,
    scheduler: DrawScheduler,
    metrics: Option<ScrollMetrics>,
    current: usize,
    last_drawn: Option<usize>,
    ready: bool,
    draw_count: u64,
}

impl ScrollFrameRenderer {
    pub fn new(sequence: FrameSequence, options: RendererOptions) -> Self {
        debug!(
            "Renderer: {} frames, fit {:?}, initial {:?}, missing {:?}, schedule {:?}",
            sequence.len(),
            options.fit,
            options.initial_frame,
            options.missing_frame,
            options.draw_schedule
        );
        Self {
            sequence,
            options,
            canvas: Canvas::default(),
            scheduler: DrawScheduler::new(options.draw_schedule),
            metrics: None,
            current: 0,
            last_drawn: None,
            ready: false,
            draw_count: 0,
        }
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> DrawOutcome {
        self.update_metrics(metrics);
        self.request(DrawReason::Scroll)
    }

    pub fn on_resize(&mut self, metrics: ScrollMetrics) -> DrawOutcome {
        self.update_metrics(metrics);
        self.request(DrawReason::Resize)
    }

    /// Frames finished loading. Only the first call has an effect.
    pub fn on_ready(&mut self) -> DrawOutcome {
        if self.ready {
            return DrawOutcome::Unchanged;
        }
        self.ready = true;
        self.current = match self.options.initial_frame {
            InitialFrame::First => 0,
            InitialFrame::ScrollDerived => self
                .metrics
                .map(|m| m.frame_index(self.sequence.len()))
                .unwrap_or(0),
        };
        debug!("Renderer ready, initial frame {}", self.current);
        self.request(DrawReason::Ready)
    }

    /// Host animation tick: perform the pending draw, if any
    pub fn tick(&mut self) -> Option<DrawOutcome> {
        let reason = self.scheduler.tick()?;
        Some(self.draw(reason))
    }

    fn update_metrics(&mut self, metrics: ScrollMetrics) {
        self.metrics = Some(metrics);
        self.current = metrics.frame_index(self.sequence.len());
        trace!(
            "Scroll {:.1} -> progress {:.4} -> frame {}",
            metrics.scroll_offset,
            metrics.progress(),
            self.current
        );
    }

    fn request(&mut self, reason: DrawReason) -> DrawOutcome {
        if !self.ready {
            return DrawOutcome::Skipped(SkipReason::NotReady);
        }
        if self.scheduler.request(reason) {
            self.draw(reason)
        } else {
            DrawOutcome::Deferred
        }
    }

    /// Paint the current frame. Forced reasons redraw an unchanged index.
    pub fn draw(&mut self, reason: DrawReason) -> DrawOutcome {
        if !self.ready {
            return DrawOutcome::Skipped(SkipReason::NotReady);
        }
        let index = self.current;
        if !reason.is_forced() && self.last_drawn == Some(index) {
            return DrawOutcome::Unchanged;
        }

        let Some((source, image)) = self.resolve(index) else {
            debug!("Frame {} unavailable, keeping previous canvas", index);
            return DrawOutcome::Skipped(SkipReason::FrameMissing(index));
        };

        let fit = self.options.fit;
        let (width, height) = fit.canvas_size(image.dimensions(), self.viewport());
        let Some(placement) = fit.placement(image.dimensions(), (width, height)) else {
            trace!("Canvas target {}x{} not drawable", width, height);
            return DrawOutcome::Skipped(SkipReason::CanvasUnavailable);
        };

        if self.canvas.resize(width, height) {
            debug!("Canvas resized to {}x{}", width, height);
        }
        self.canvas.clear();
        self.canvas.draw_image(&image, &placement, self.options.sampling);

        self.last_drawn = Some(index);
        self.draw_count += 1;
        trace!("Drew frame {} (source {}) at {}x{}", index, source, width, height);

        DrawOutcome::Drawn {
            index,
            source,
            width,
            height,
        }
    }

    /// Bitmap for `index` under the missing-frame policy
    fn resolve(&self, index: usize) -> Option<(usize, Arc<RgbaImage>)> {
        let frame = self.sequence.get(index)?;
        if let Some(image) = frame.image() {
            return Some((index, image));
        }
        match self.options.missing_frame {
            MissingFramePolicy::Skip => None,
            MissingFramePolicy::HoldPrevious => {
                let (source, frame) = self.sequence.nearest_loaded(index)?;
                frame.image().map(|image| (source, image))
            }
        }
    }

    fn viewport(&self) -> (u32, u32) {
        self.metrics
            .map(|m| (m.viewport_width, m.viewport_height))
            .unwrap_or((0, 0))
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// `FRAME 001 / 214` for the current index
    pub fn label(&self) -> String {
        frame_label(self.current, self.sequence.len())
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn last_drawn(&self) -> Option<usize> {
        self.last_drawn
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn metrics(&self) -> Option<ScrollMetrics> {
        self.metrics
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    /// Subscribe to scroll, resize and ready events on `bus`
    ///
    /// Listeners live as long as the returned handle.
    pub fn attach(self, bus: &EventBus) -> RendererHandle {
        let renderer = Arc::new(Mutex::new(self));

        let r = Arc::clone(&renderer);
        let scroll = bus.subscribe_scoped::<ScrollEvent, _>(move |e| {
            lock(&r).on_scroll(e.0);
        });
        let r = Arc::clone(&renderer);
        let resize = bus.subscribe_scoped::<ResizeEvent, _>(move |e| {
            lock(&r).on_resize(e.0);
        });
        let r = Arc::clone(&renderer);
        let ready = bus.subscribe_scoped::<FramesReadyEvent, _>(move |_| {
            lock(&r).on_ready();
        });

        RendererHandle {
            renderer,
            subscriptions: vec![scroll, resize, ready],
        }
    }
}

fn lock(renderer: &Mutex<ScrollFrameRenderer>) -> MutexGuard<'_, ScrollFrameRenderer> {
    renderer.lock().unwrap_or_else(|e| e.into_inner())
}

/// Renderer attached to an event bus
///
/// Dropping the handle unsubscribes every listener.
pub struct RendererHandle {
    renderer: Arc<Mutex<ScrollFrameRenderer>>,
    subscriptions: Vec<Subscription>,
}

impl RendererHandle {
    /// Run `f` with the renderer locked
    ///
    /// Do not emit on the same bus from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut ScrollFrameRenderer) -> R) -> R {
        f(&mut lock(&self.renderer))
    }

    pub fn tick(&self) -> Option<DrawOutcome> {
        lock(&self.renderer).tick()
    }
}

impl std::fmt::Debug for RendererHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererHandle")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
