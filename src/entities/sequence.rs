//! Frame sequence naming and the ordered set of frame slots
//!
//! **Why**: Frames live in one folder as numbered stills (`frame_0001.jpg`,
//! `frame_0002.jpg`...). The count and folder are configuration, never
//! discovered from disk, so the path of every slot is known up front.
//!
//! **Used by**: FrameLoader (fetch paths), ScrollFrameRenderer (per-index lookup)
//!
//! # Pattern Syntax
//!
//! - printf-style: `frame_%04d.jpg` (padding = 4)
//! - hash-style: `frame_####.jpg` (padding = number of `#`)
//! - unpadded: `frame_%d.jpg`
//!
//! Slot `i` maps to frame number `i + first_number`, so `first_number = 1`
//! gives 1-based file names.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::frame::{Frame, FrameError, FrameStatus};

static PRINTF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(0(\d+))?d").expect("static regex is valid"));
static HASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#+").expect("static regex is valid"));

/// Default file name convention: 1-based, 4-digit, `frame_0001.jpg`
pub const DEFAULT_PATTERN: &str = "frame_%04d.jpg";

/// Parsed file name pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    prefix: String,
    suffix: String,
    padding: usize,
    first_number: usize,
}

impl FramePattern {
    /// Parse a pattern with exactly one frame-number placeholder
    pub fn parse(pattern: &str, first_number: usize) -> Result<Self, FrameError> {
        let printf: Vec<_> = PRINTF_RE.captures_iter(pattern).collect();
        let hashes: Vec<_> = HASH_RE.find_iter(pattern).collect();

        match (printf.len(), hashes.len()) {
            (1, 0) => {
                let caps = &printf[0];
                let whole = caps.get(0).ok_or_else(|| FrameError::Pattern(pattern.into()))?;
                let padding = match caps.get(2) {
                    Some(m) => m
                        .as_str()
                        .parse::<usize>()
                        .map_err(|e| FrameError::Pattern(format!("{}: {}", pattern, e)))?,
                    None => 0,
                };
                Ok(Self {
                    prefix: pattern[..whole.start()].to_string(),
                    suffix: pattern[whole.end()..].to_string(),
                    padding,
                    first_number,
                })
            }
            (0, 1) => {
                let m = hashes[0];
                Ok(Self {
                    prefix: pattern[..m.start()].to_string(),
                    suffix: pattern[m.end()..].to_string(),
                    padding: m.len(),
                    first_number,
                })
            }
            (0, 0) => Err(FrameError::Pattern(format!(
                "'{}' has no frame number placeholder (%04d or ####)",
                pattern
            ))),
            _ => Err(FrameError::Pattern(format!(
                "'{}' has more than one frame number placeholder",
                pattern
            ))),
        }
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn first_number(&self) -> usize {
        self.first_number
    }

    /// File name for slot `index`
    pub fn file_name(&self, index: usize) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            index + self.first_number,
            self.suffix,
            width = self.padding
        )
    }
}

/// Ordered, fixed-length set of frame slots
///
/// Cloning shares the slots, so the loader and renderer observe the same
/// status and bitmaps.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Arc<[Frame]>,
    folder: PathBuf,
}

impl FrameSequence {
    /// Build `count` pending slots under `folder`
    pub fn new(folder: impl Into<PathBuf>, pattern: &FramePattern, count: usize) -> Self {
        let folder = folder.into();
        let frames: Vec<Frame> = (0..count)
            .map(|i| Frame::new(folder.join(pattern.file_name(i))))
            .collect();
        Self {
            frames: frames.into(),
            folder,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn status(&self, index: usize) -> Option<FrameStatus> {
        self.get(index).map(Frame::status)
    }

    /// Nearest slot at or before `index` that loaded successfully
    pub fn nearest_loaded(&self, index: usize) -> Option<(usize, &Frame)> {
        let end = index.min(self.len().checked_sub(1)?);
        (0..=end)
            .rev()
            .map(|i| (i, &self.frames[i]))
            .find(|(_, f)| f.status() == FrameStatus::Loaded)
    }

    /// (loaded, failed) slot counts
    pub fn counts(&self) -> (usize, usize) {
        self.frames.iter().fold((0, 0), |(ok, err), f| match f.status() {
            FrameStatus::Loaded => (ok + 1, err),
            FrameStatus::Error => (ok, err + 1),
            _ => (ok, err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_printf_pattern_one_based() {
        let p = FramePattern::parse(DEFAULT_PATTERN, 1).unwrap();
        assert_eq!(p.padding(), 4);
        assert_eq!(p.file_name(0), "frame_0001.jpg");
        assert_eq!(p.file_name(213), "frame_0214.jpg");
    }

    #[test]
    fn test_hash_pattern_zero_based() {
        let p = FramePattern::parse("ezgif-frame-###.jpg", 0).unwrap();
        assert_eq!(p.padding(), 3);
        assert_eq!(p.file_name(0), "ezgif-frame-000.jpg");
        assert_eq!(p.file_name(41), "ezgif-frame-041.jpg");
    }

    #[test]
    fn test_unpadded_pattern() {
        let p = FramePattern::parse("%d.png", 1).unwrap();
        assert_eq!(p.padding(), 0);
        assert_eq!(p.file_name(9), "10.png");
    }

    /// Test: Numbers wider than the padding are not truncated
    #[test]
    fn test_overflowing_padding() {
        let p = FramePattern::parse("f%02d.png", 1).unwrap();
        assert_eq!(p.file_name(199), "f200.png");
    }

    #[test]
    fn test_pattern_without_placeholder() {
        assert!(matches!(
            FramePattern::parse("still.jpg", 1),
            Err(FrameError::Pattern(_))
        ));
    }

    #[test]
    fn test_pattern_with_two_placeholders() {
        assert!(FramePattern::parse("a_%04d_%04d.jpg", 1).is_err());
        assert!(FramePattern::parse("a_%04d_##.jpg", 1).is_err());
    }

    #[test]
    fn test_sequence_paths() {
        let p = FramePattern::parse(DEFAULT_PATTERN, 1).unwrap();
        let seq = FrameSequence::new("/animation", &p, 3);

        assert_eq!(seq.len(), 3);
        assert_eq!(seq.folder(), Path::new("/animation"));
        assert_eq!(
            seq.get(2).unwrap().path(),
            Path::new("/animation/frame_0003.jpg")
        );
        assert!(seq.get(3).is_none());
        assert_eq!(seq.status(0), Some(FrameStatus::Pending));
    }

    #[test]
    fn test_nearest_loaded_and_counts() {
        let p = FramePattern::parse("f_###.png", 0).unwrap();
        let seq = FrameSequence::new("x", &p, 5);

        assert!(seq.nearest_loaded(4).is_none());

        seq.get(1).unwrap().complete(Ok(RgbaImage::new(2, 2)));
        seq.get(3).unwrap().complete(Err(FrameError::Io("missing".into())));

        assert_eq!(seq.nearest_loaded(4).map(|(i, _)| i), Some(1));
        assert_eq!(seq.nearest_loaded(1).map(|(i, _)| i), Some(1));
        assert!(seq.nearest_loaded(0).is_none());
        // Out-of-range index clamps to the last slot
        assert_eq!(seq.nearest_loaded(99).map(|(i, _)| i), Some(1));
        assert_eq!(seq.counts(), (1, 1));
    }

    #[test]
    fn test_clone_shares_slots() {
        let p = FramePattern::parse("f_#.png", 0).unwrap();
        let seq = FrameSequence::new("x", &p, 2);
        let other = seq.clone();
        seq.get(0).unwrap().complete(Ok(RgbaImage::new(1, 1)));
        assert_eq!(other.status(0), Some(FrameStatus::Loaded));
    }
}
