//! Frame slot: one still image of the sequence plus its loading status
//!
//! **Why**: The loader fills slots from worker threads while the renderer reads
//! them on the event thread, so a slot is a cheap cloneable handle around
//! shared data.
//!
//! **Used by**: FrameLoader (completion bookkeeping), ScrollFrameRenderer (draw)
//!
//! # Status Lifecycle
//!
//! `Pending` → `Loading` → `Loaded` | `Error`
//!
//! Terminal states never revert. A second completion for the same slot is
//! ignored, which keeps load counting idempotent.

use image::{ImageError, RgbaImage};
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Frame loading status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Pending, // Path known, fetch not started
    Loading, // Fetch in flight
    Loaded,  // Decoded bitmap available
    Error,   // Fetch or decode failed (permanent for the session)
}

impl FrameStatus {
    /// Loaded or failed - counts toward readiness either way
    pub fn is_complete(self) -> bool {
        matches!(self, FrameStatus::Loaded | FrameStatus::Error)
    }
}

/// Frame loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    Io(String),
    Image(String),
    UnsupportedFormat(String),
    ZeroSize(PathBuf),
    Pattern(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Io(e) => write!(f, "IO error: {}", e),
            FrameError::Image(e) => write!(f, "Image error: {}", e),
            FrameError::UnsupportedFormat(e) => write!(f, "Unsupported format: {}", e),
            FrameError::ZeroSize(p) => write!(f, "Image has zero size: {}", p.display()),
            FrameError::Pattern(e) => write!(f, "Bad filename pattern: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

#[derive(Debug)]
struct FrameData {
    image: Option<Arc<RgbaImage>>,
    status: FrameStatus,
    error: Option<FrameError>,
}

/// Single frame slot with its source path
#[derive(Debug, Clone)]
pub struct Frame {
    data: Arc<Mutex<FrameData>>, // All mutable data in one mutex
    path: PathBuf,               // Immutable after creation
}

impl Frame {
    /// Create a pending slot for `path`
    pub fn new(path: PathBuf) -> Self {
        let data = FrameData {
            image: None,
            status: FrameStatus::Pending,
            error: None,
        };
        Self {
            data: Arc::new(Mutex::new(data)),
            path,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrameData> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> FrameStatus {
        self.lock().status
    }

    /// Atomically claim the slot for loading (Pending → Loading)
    ///
    /// Returns `false` when the slot was already claimed or completed; the
    /// caller must not start a second fetch.
    pub fn try_claim_for_loading(&self) -> bool {
        let mut data = self.lock();
        if data.status == FrameStatus::Pending {
            data.status = FrameStatus::Loading;
            true
        } else {
            false
        }
    }

    /// Record the result of a fetch
    ///
    /// Returns the new terminal status, or `None` if the slot had already
    /// completed (the result is discarded). A decoded image with zero width or
    /// height is stored as an error.
    pub fn complete(&self, result: Result<RgbaImage, FrameError>) -> Option<FrameStatus> {
        let mut data = self.lock();
        if data.status.is_complete() {
            trace!("Frame {} already complete, ignoring result", self.path.display());
            return None;
        }

        match result {
            Ok(img) if img.width() == 0 || img.height() == 0 => {
                data.status = FrameStatus::Error;
                data.error = Some(FrameError::ZeroSize(self.path.clone()));
            }
            Ok(img) => {
                debug!("Loaded {}: {}x{}", self.path.display(), img.width(), img.height());
                data.image = Some(Arc::new(img));
                data.status = FrameStatus::Loaded;
            }
            Err(e) => {
                data.status = FrameStatus::Error;
                data.error = Some(e);
            }
        }
        Some(data.status)
    }

    /// Decoded bitmap, only when the slot loaded successfully
    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        let data = self.lock();
        match data.status {
            FrameStatus::Loaded => data.image.clone(),
            _ => None,
        }
    }

    /// Natural size of the decoded bitmap
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.lock().image.as_ref().map(|img| img.dimensions())
    }

    /// Error recorded for a failed slot
    pub fn error(&self) -> Option<FrameError> {
        self.lock().error.clone()
    }
}

/// Decode an image file into 8-bit RGBA
///
/// Format is picked by extension; anything the `image` crate cannot decode
/// surfaces as `FrameError::Image`.
pub fn decode(path: &Path) -> Result<RgbaImage, FrameError> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "webp" | "tif" | "tiff" | "tga" | "bmp" => {}
        _ => return Err(FrameError::UnsupportedFormat(format!(".{}", ext))),
    }

    let img = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) => FrameError::Io(format!("{}: {}", path.display(), io)),
        other => FrameError::Image(format!("{}: {}", path.display(), other)),
    })?;

    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(FrameError::ZeroSize(path.to_path_buf()));
    }
    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255]))
    }

    /// Test: New slot is pending with no image
    #[test]
    fn test_frame_creation() {
        let frame = Frame::new(PathBuf::from("frame_0001.jpg"));

        assert_eq!(frame.status(), FrameStatus::Pending);
        assert_eq!(frame.path(), Path::new("frame_0001.jpg"));
        assert!(frame.image().is_none());
        assert!(frame.resolution().is_none());
    }

    /// Test: Claim is granted once
    #[test]
    fn test_claim_once() {
        let frame = Frame::new(PathBuf::from("a.png"));
        assert!(frame.try_claim_for_loading());
        assert!(!frame.try_claim_for_loading());
        assert_eq!(frame.status(), FrameStatus::Loading);
    }

    /// Test: Terminal status never reverts
    /// Validates: A late success after a failure is discarded
    #[test]
    fn test_complete_is_monotonic() {
        let frame = Frame::new(PathBuf::from("a.png"));
        frame.try_claim_for_loading();

        let first = frame.complete(Err(FrameError::Io("gone".into())));
        assert_eq!(first, Some(FrameStatus::Error));

        let second = frame.complete(Ok(solid(4, 4)));
        assert_eq!(second, None);
        assert_eq!(frame.status(), FrameStatus::Error);
        assert!(frame.image().is_none());
    }

    /// Test: Successful completion exposes the bitmap
    #[test]
    fn test_complete_success() {
        let frame = Frame::new(PathBuf::from("a.png"));
        assert_eq!(frame.complete(Ok(solid(8, 6))), Some(FrameStatus::Loaded));
        assert_eq!(frame.resolution(), Some((8, 6)));
        assert!(frame.image().is_some());
        assert!(frame.error().is_none());
    }

    /// Test: Zero-sized bitmap is treated as a failure
    #[test]
    fn test_zero_size_is_error() {
        let frame = Frame::new(PathBuf::from("empty.png"));
        assert_eq!(frame.complete(Ok(RgbaImage::new(0, 0))), Some(FrameStatus::Error));
        assert!(matches!(frame.error(), Some(FrameError::ZeroSize(_))));
        assert!(frame.image().is_none());
    }

    /// Test: Clones share state
    #[test]
    fn test_clone_shares_slot() {
        let frame = Frame::new(PathBuf::from("a.png"));
        let other = frame.clone();
        frame.complete(Ok(solid(2, 2)));
        assert_eq!(other.status(), FrameStatus::Loaded);
    }

    /// Test: Decoding a missing file reports IO error
    #[test]
    fn test_decode_missing_file() {
        let result = decode(Path::new("/nonexistent/path/frame_0001.png"));
        assert!(matches!(result, Err(FrameError::Io(_))));
    }

    /// Test: Unknown extension rejected before touching disk
    #[test]
    fn test_decode_unsupported_extension() {
        let result = decode(Path::new("clip.mov"));
        assert_eq!(result, Err(FrameError::UnsupportedFormat(".mov".into())));
    }

    /// Test: Decode round trip through a real PNG file
    #[test]
    fn test_decode_png() {
        let dir = std::env::temp_dir().join(format!("scrollreel_frame_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame_0001.png");
        solid(5, 3).save(&path).unwrap();

        let img = decode(&path).unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(img.get_pixel(0, 0), &Rgba([200, 10, 10, 255]));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
