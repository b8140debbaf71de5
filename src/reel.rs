//! Reel - one frame sequence wired to its loader, renderer and event bus
//!
//! **Why**: Hosts should not have to assemble the worker pool, loader and
//! renderer subscriptions by hand. A `Reel` owns all of them and tears them
//! down together.
//!
//! **Used by**: the CLI runner, embedding hosts
//!
//! Hosts push `scroll` / `resize` as they happen, call `poll` from their event
//! loop (loader completions), and `tick` once per animation frame when the
//! draw schedule is `PerTick`.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReelConfig;
use crate::core::{
    DiskSource, DrawOutcome, EventBus, FrameLoader, FrameSource, RendererHandle, ResizeEvent,
    ScrollEvent, ScrollFrameRenderer, Workers,
};
use crate::entities::ScrollMetrics;
use crate::paths;

pub struct Reel {
    bus: EventBus,
    loader: FrameLoader,
    renderer: RendererHandle,
    workers: Workers,
}

impl Reel {
    /// Start loading frames from disk per `config`
    pub fn open(config: &ReelConfig) -> Result<Self> {
        Self::with_source(config, Arc::new(DiskSource))
    }

    pub fn with_source(config: &ReelConfig, source: Arc<dyn FrameSource>) -> Result<Self> {
        let sequence = config.sequence()?;
        let workers = Workers::new(config.worker_count()).context("Failed to start decode workers")?;
        let bus = EventBus::new();

        // Subscribe first so the ready event cannot be missed
        let renderer = ScrollFrameRenderer::new(sequence.clone(), config.renderer_options()).attach(&bus);
        let loader = FrameLoader::start(sequence, source, &workers, bus.clone());

        Ok(Self {
            bus,
            loader,
            renderer,
            workers,
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn loader(&self) -> &FrameLoader {
        &self.loader
    }

    pub fn renderer(&self) -> &RendererHandle {
        &self.renderer
    }

    pub fn workers(&self) -> &Workers {
        &self.workers
    }

    /// Apply finished loads. Emits ready when the last one lands.
    pub fn poll(&mut self) -> usize {
        self.loader.poll()
    }

    pub fn wait_ready(&mut self, timeout: Duration) -> bool {
        self.loader.wait_ready(timeout)
    }

    pub fn is_ready(&self) -> bool {
        self.loader.is_ready()
    }

    pub fn scroll(&self, metrics: ScrollMetrics) {
        self.bus.emit(ScrollEvent(metrics));
    }

    pub fn resize(&self, metrics: ScrollMetrics) {
        self.bus.emit(ResizeEvent(metrics));
    }

    pub fn tick(&self) -> Option<DrawOutcome> {
        self.renderer.tick()
    }

    pub fn current_frame(&self) -> usize {
        self.renderer.with(|r| r.current_frame())
    }

    pub fn draw_count(&self) -> u64 {
        self.renderer.with(|r| r.draw_count())
    }

    /// Write the canvas as PNG. Fails if nothing was drawn yet.
    pub fn save_canvas(&self, path: &Path) -> Result<()> {
        paths::ensure_parent(path)?;
        self.renderer.with(|r| {
            let canvas = r.canvas();
            anyhow::ensure!(canvas.is_drawable(), "Canvas is empty, nothing was drawn");
            canvas
                .as_image()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))
        })
    }
}
