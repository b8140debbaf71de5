use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::config::ReelConfig;
use crate::core::{DrawSchedule, InitialFrame, MissingFramePolicy};
use crate::entities::{FitMode, Sampling, ScrollMetrics};

/// Scroll-driven image sequence renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Load reel settings from this JSON file instead of scrollreel.json
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable logging to file (default: scrollreel.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the sequence, apply one scroll position, write the canvas as PNG
    Render {
        #[command(flatten)]
        reel: ReelArgs,
        #[command(flatten)]
        view: ViewArgs,
        /// Scroll offset to render
        #[arg(short = 's', long = "scroll", value_name = "PX", default_value_t = 0.0, allow_negative_numbers = true)]
        scroll: f64,
        /// Output PNG
        #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "frame.png")]
        output: PathBuf,
    },
    /// Scroll through the whole region in steps, one PNG per drawn frame
    Sweep {
        #[command(flatten)]
        reel: ReelArgs,
        #[command(flatten)]
        view: ViewArgs,
        /// Number of scroll steps from region start to end
        #[arg(long = "steps", value_name = "K", default_value_t = 10)]
        steps: usize,
        /// Resize the viewport to WxH halfway through
        #[arg(long = "resize", value_name = "WxH", value_parser = parse_size)]
        resize: Option<(u32, u32)>,
        /// Output directory
        #[arg(short = 'o', long = "out-dir", value_name = "DIR", default_value = "sweep")]
        out_dir: PathBuf,
    },
    /// Load the sequence and report per-frame status
    Probe {
        #[command(flatten)]
        reel: ReelArgs,
        /// List every failed frame with its error
        #[arg(long = "failed")]
        list_failed: bool,
    },
}

impl Command {
    pub fn reel(&self) -> &ReelArgs {
        match self {
            Command::Render { reel, .. } | Command::Sweep { reel, .. } | Command::Probe { reel, .. } => reel,
        }
    }
}

/// Overrides for `ReelConfig`; unset flags keep the config value
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ReelArgs {
    /// Folder holding the frames
    #[arg(short = 'f', long = "frames", value_name = "DIR")]
    pub frame_folder: Option<PathBuf>,

    /// Number of frames
    #[arg(short = 'n', long = "count", value_name = "N")]
    pub total_frames: Option<usize>,

    /// File name pattern (frame_%04d.jpg, shot.####.png)
    #[arg(short = 'p', long = "pattern", value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Number of the first file (0 or 1)
    #[arg(long = "first", value_name = "N")]
    pub first_number: Option<usize>,

    /// Letterboxing: cover | contain
    #[arg(long = "fit", value_name = "MODE", value_parser = parse_named::<FitMode>)]
    pub fit: Option<FitMode>,

    /// First frame after loading: first | scroll_derived
    #[arg(long = "initial", value_name = "POLICY", value_parser = parse_named::<InitialFrame>)]
    pub initial_frame: Option<InitialFrame>,

    /// Failed frames: skip | hold_previous
    #[arg(long = "missing", value_name = "POLICY", value_parser = parse_named::<MissingFramePolicy>)]
    pub missing_frame: Option<MissingFramePolicy>,

    /// Draw timing: immediate | per_tick
    #[arg(long = "schedule", value_name = "MODE", value_parser = parse_named::<DrawSchedule>)]
    pub draw_schedule: Option<DrawSchedule>,

    /// Scaling filter: nearest | triangle | catmull_rom | gaussian | lanczos3
    #[arg(long = "sampling", value_name = "FILTER", value_parser = parse_named::<Sampling>)]
    pub sampling: Option<Sampling>,

    /// Decode threads
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Seconds to wait for loading
    #[arg(long = "timeout", value_name = "SECS")]
    pub load_timeout_secs: Option<u64>,
}

impl ReelArgs {
    pub fn apply_to(&self, config: &mut ReelConfig) {
        if let Some(v) = &self.frame_folder {
            config.frame_folder = v.clone();
        }
        if let Some(v) = self.total_frames {
            config.total_frames = v;
        }
        if let Some(v) = &self.pattern {
            config.pattern = v.clone();
        }
        if let Some(v) = self.first_number {
            config.first_number = v;
        }
        if let Some(v) = self.fit {
            config.fit = v;
        }
        if let Some(v) = self.initial_frame {
            config.initial_frame = v;
        }
        if let Some(v) = self.missing_frame {
            config.missing_frame = v;
        }
        if let Some(v) = self.draw_schedule {
            config.draw_schedule = v;
        }
        if let Some(v) = self.sampling {
            config.sampling = v;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if let Some(v) = self.load_timeout_secs {
            config.load_timeout_secs = v;
        }
    }
}

/// Simulated page geometry
#[derive(ClapArgs, Debug, Clone)]
pub struct ViewArgs {
    /// Viewport width
    #[arg(long = "width", value_name = "PX", default_value_t = 1280)]
    pub width: u32,

    /// Viewport height
    #[arg(long = "height", value_name = "PX", default_value_t = 800)]
    pub height: u32,

    /// Scroll region offset from the page top
    #[arg(long = "region-top", value_name = "PX", default_value_t = 0.0)]
    pub region_top: f64,

    /// Scroll region height (default: 4 viewports)
    #[arg(long = "region-height", value_name = "PX")]
    pub region_height: Option<f64>,
}

impl ViewArgs {
    pub fn metrics(&self, scroll_offset: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_offset,
            viewport_width: self.width,
            viewport_height: self.height,
            region_top: self.region_top,
            region_height: self
                .region_height
                .unwrap_or_else(|| f64::from(self.height) * 4.0),
        }
    }
}

/// Parse a policy name using its serde spelling
fn parse_named<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase())).map_err(|e| e.to_string())
}

/// `1920x1080` → (1920, 1080)
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("width: {}", e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("height: {}", e))?;
    Ok((w, h))
}
