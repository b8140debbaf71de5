//! Reel configuration - what to load and how to draw it
//!
//! Stored as JSON (`scrollreel.json`). Every field has a default, so a config
//! file only needs the keys it changes. CLI flags are applied on top by the
//! binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{DrawSchedule, InitialFrame, MissingFramePolicy, RendererOptions};
use crate::entities::{FitMode, FrameError, FramePattern, FrameSequence, Sampling, DEFAULT_PATTERN};

/// Configuration loading/validation failure
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Invalid(String),
    Pattern(FrameError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => write!(f, "{}: {}", path.display(), message),
            ConfigError::Parse { path, message } => {
                write!(f, "Invalid config {}: {}", path.display(), message)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
            ConfigError::Pattern(e) => write!(f, "Invalid frame pattern: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Directory holding the frame files
    pub frame_folder: PathBuf,
    /// Number of frames N
    pub total_frames: usize,
    /// File name pattern, `%04d` or `####`
    pub pattern: String,
    /// Number substituted for frame index 0
    pub first_number: usize,
    pub fit: FitMode,
    pub initial_frame: InitialFrame,
    pub missing_frame: MissingFramePolicy,
    pub draw_schedule: DrawSchedule,
    pub sampling: Sampling,
    /// Decode threads; `None` = 3/4 of the CPU cores
    pub workers: Option<usize>,
    /// How long the CLI waits for loading to finish
    pub load_timeout_secs: u64,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            frame_folder: PathBuf::from("animation"),
            total_frames: 214,
            pattern: DEFAULT_PATTERN.to_string(),
            first_number: 1,
            fit: FitMode::default(),
            initial_frame: InitialFrame::default(),
            missing_frame: MissingFramePolicy::default(),
            draw_schedule: DrawSchedule::default(),
            sampling: Sampling::default(),
            workers: None,
            load_timeout_secs: 60,
        }
    }
}

impl ReelConfig {
    pub fn from_json(json: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&json, path)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Check the config and return the parsed file pattern
    pub fn validate(&self) -> Result<FramePattern, ConfigError> {
        if self.total_frames == 0 {
            return Err(ConfigError::Invalid("total_frames must be at least 1".into()));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        FramePattern::parse(&self.pattern, self.first_number).map_err(ConfigError::Pattern)
    }

    /// Pending frame slots for this config
    pub fn sequence(&self) -> Result<FrameSequence, ConfigError> {
        let pattern = self.validate()?;
        Ok(FrameSequence::new(&self.frame_folder, &pattern, self.total_frames))
    }

    pub fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            fit: self.fit,
            initial_frame: self.initial_frame,
            missing_frame: self.missing_frame,
            draw_schedule: self.draw_schedule,
            sampling: self.sampling,
        }
    }

    /// Decode thread count (75% of CPU cores for workers, rest for the host)
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get() * 3 / 4)
            .max(1)
    }
}
