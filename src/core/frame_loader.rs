//! Frame preloading and the readiness barrier
//!
//! **Why**: The animation may only start responding to scroll once every frame
//! has either decoded or failed. Waiting on failures too means one broken file
//! cannot hang the page in its loading state.
//!
//! **Used by**: the host loop (poll / wait_ready), ScrollFrameRenderer (via
//! `FramesReadyEvent`)
//!
//! # Flow
//!
//! 1. `FrameLoader::start` queues one fetch per slot on the worker pool
//! 2. Each fetch sends a `LoadCompletion` over a channel, in any order
//! 3. The event thread calls `poll()`; every completion goes through
//!    `LoadState::record`, which counts a slot at most once
//! 4. The completion that brings the count to N yields `LoadTransition::Ready`
//!    and the loader emits `FramesReadyEvent`, exactly once
//!
//! There is no retry and no cancellation. Dropping the loader drops the
//! receiver, so results still in flight are discarded.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use image::RgbaImage;
use log::{debug, info, trace, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::event_bus::EventBus;
use crate::core::reel_events::{FramesReadyEvent, LoadProgressEvent};
use crate::core::workers::Workers;
use crate::entities::frame::{self, Frame, FrameError, FrameStatus};
use crate::entities::FrameSequence;

/// Where frame bytes come from
///
/// Runs on worker threads. The default reads files from disk; hosts with their
/// own media pipeline implement this or feed a `manual` loader directly.
pub trait FrameSource: Send + Sync + 'static {
    fn fetch(&self, path: &Path) -> Result<RgbaImage, FrameError>;
}

/// Decode frames from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl FrameSource for DiskSource {
    fn fetch(&self, path: &Path) -> Result<RgbaImage, FrameError> {
        frame::decode(path)
    }
}

/// Result of one fetch
#[derive(Debug)]
pub struct LoadCompletion {
    pub index: usize,
    pub result: Result<RgbaImage, FrameError>,
}

/// What recording a completion did to the barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTransition {
    /// Slot already counted, or index out of range
    Ignored,
    /// Counted, still waiting for more
    Counted,
    /// This completion was the last one
    Ready,
}

/// Completion barrier over N slots
///
/// Each slot is counted at most once, in any order. `Ready` is returned by
/// exactly one `record` call; readiness never reverts.
#[derive(Debug, Clone)]
pub struct LoadState {
    done: Vec<bool>,
    completed: usize,
    failed: usize,
    ready: bool,
}

impl LoadState {
    pub fn new(total: usize) -> Self {
        Self {
            done: vec![false; total],
            completed: 0,
            failed: 0,
            ready: total == 0,
        }
    }

    pub fn record(&mut self, index: usize, success: bool) -> LoadTransition {
        match self.done.get_mut(index) {
            Some(done) if !*done => *done = true,
            _ => return LoadTransition::Ignored,
        }

        self.completed += 1;
        if !success {
            self.failed += 1;
        }

        if self.completed == self.done.len() && !self.ready {
            self.ready = true;
            LoadTransition::Ready
        } else {
            LoadTransition::Counted
        }
    }

    pub fn total(&self) -> usize {
        self.done.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Completed share, rounded to whole percent
    pub fn progress_percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 100;
        }
        ((self.completed * 100 + total / 2) / total) as u8
    }
}

/// Preloads a frame sequence and announces readiness once
pub struct FrameLoader {
    sequence: FrameSequence,
    state: LoadState,
    rx: Receiver<LoadCompletion>,
    bus: EventBus,
    announced: bool,
}

impl FrameLoader {
    /// Queue a fetch for every slot on `workers`
    ///
    /// A sequence should be handed to one loader only.
    pub fn start(
        sequence: FrameSequence,
        source: Arc<dyn FrameSource>,
        workers: &Workers,
        bus: EventBus,
    ) -> Self {
        let (loader, tx) = Self::manual(sequence, bus);

        for (index, frame) in loader.sequence.iter().enumerate() {
            let tx = tx.clone();
            let source = Arc::clone(&source);
            let path = frame.path().to_path_buf();
            workers.execute(move || {
                let result = source.fetch(&path);
                // Receiver gone: loader dropped, result abandoned
                let _ = tx.send(LoadCompletion { index, result });
            });
        }

        info!(
            "Loading {} frames from {} on {} workers",
            loader.sequence.len(),
            loader.sequence.folder().display(),
            workers.num_threads()
        );
        loader
    }

    /// Loader fed by the caller through the returned sender
    ///
    /// For hosts that fetch frames themselves. All slots are marked loading.
    pub fn manual(sequence: FrameSequence, bus: EventBus) -> (Self, Sender<LoadCompletion>) {
        for frame in sequence.iter() {
            frame.try_claim_for_loading();
        }
        let (tx, rx) = crossbeam_channel::unbounded();
        let state = LoadState::new(sequence.len());
        let loader = Self {
            sequence,
            state,
            rx,
            bus,
            announced: false,
        };
        (loader, tx)
    }

    /// Apply every completion received so far. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        self.announce_if_ready();
        applied
    }

    /// Block until ready or until `timeout` elapses. Returns readiness.
    pub fn wait_ready(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();

        while !self.state.is_ready() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(completion) => {
                    self.apply(completion);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("All frame sources hung up before readiness");
                    break;
                }
            }
        }

        self.announce_if_ready();
        self.state.is_ready()
    }

    /// Record one completion against its slot and the barrier
    pub fn apply(&mut self, completion: LoadCompletion) -> LoadTransition {
        let LoadCompletion { index, result } = completion;
        let Some(frame) = self.sequence.get(index) else {
            warn!("Completion for unknown frame {} (sequence has {})", index, self.sequence.len());
            return LoadTransition::Ignored;
        };

        let error = result.as_ref().err().map(|e| e.to_string());
        let success = match frame.complete(result) {
            Some(FrameStatus::Error) => {
                match error {
                    Some(e) => warn!("Frame {} failed: {}", index, e),
                    None => warn!("Frame {} decoded to an empty image", index),
                }
                false
            }
            Some(status) => status == FrameStatus::Loaded,
            None => frame.status() == FrameStatus::Loaded,
        };

        let transition = self.state.record(index, success);
        match transition {
            LoadTransition::Ignored => {
                trace!("Duplicate completion for frame {} ignored", index);
            }
            LoadTransition::Counted | LoadTransition::Ready => {
                self.bus.emit(LoadProgressEvent {
                    completed: self.state.completed(),
                    total: self.state.total(),
                    percent: self.state.progress_percent(),
                });
            }
        }

        if transition == LoadTransition::Ready {
            self.announce_if_ready();
        }
        transition
    }

    fn announce_if_ready(&mut self) {
        if self.announced || !self.state.is_ready() {
            return;
        }
        self.announced = true;
        info!(
            "Frames ready: {} total, {} failed",
            self.state.total(),
            self.state.failed()
        );
        self.bus.emit(FramesReadyEvent {
            total: self.state.total(),
            failed: self.state.failed(),
        });
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    /// Per-frame lookup
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.sequence.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FramePattern;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SHUFFLED: [usize; 8] = [5, 0, 7, 2, 6, 1, 4, 3];

    fn sequence(n: usize) -> FrameSequence {
        let pattern = FramePattern::parse("f_###.png", 0).unwrap();
        FrameSequence::new("mem", &pattern, n)
    }

    fn ok_image() -> Result<RgbaImage, FrameError> {
        Ok(RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])))
    }

    fn count_events(bus: &EventBus) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let ready = Arc::new(AtomicUsize::new(0));
        let progress = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ready);
        bus.subscribe::<FramesReadyEvent, _>(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });
        let p = Arc::clone(&progress);
        bus.subscribe::<LoadProgressEvent, _>(move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        });
        (ready, progress)
    }

    /// Test: Ready exactly once after N completions, for several orders
    #[test]
    fn test_load_state_any_order() {
        let forward: Vec<usize> = (0..8).collect();
        let reverse: Vec<usize> = (0..8).rev().collect();
        for order in [forward, reverse, SHUFFLED.to_vec()] {
            let mut state = LoadState::new(8);
            let mut readies = 0;
            for (n, &i) in order.iter().enumerate() {
                assert!(!state.is_ready(), "ready early at completion {}", n);
                if state.record(i, true) == LoadTransition::Ready {
                    readies += 1;
                }
            }
            assert_eq!(readies, 1);
            assert!(state.is_ready());
            assert_eq!(state.completed(), 8);
            assert_eq!(state.failed(), 0);
        }
    }

    /// Test: Failures count toward readiness
    #[test]
    fn test_load_state_with_failures() {
        let mut state = LoadState::new(5);
        state.record(0, false);
        state.record(1, true);
        state.record(2, false);
        state.record(3, true);
        assert!(!state.is_ready());
        assert_eq!(state.record(4, false), LoadTransition::Ready);
        assert_eq!(state.failed(), 3);
    }

    /// Test: Repeated and out-of-range completions are not counted
    #[test]
    fn test_load_state_duplicates() {
        let mut state = LoadState::new(3);
        assert_eq!(state.record(1, true), LoadTransition::Counted);
        assert_eq!(state.record(1, true), LoadTransition::Ignored);
        assert_eq!(state.record(1, false), LoadTransition::Ignored);
        assert_eq!(state.record(9, true), LoadTransition::Ignored);
        assert_eq!(state.completed(), 1);

        state.record(0, true);
        assert_eq!(state.record(2, true), LoadTransition::Ready);
        assert_eq!(state.record(2, true), LoadTransition::Ignored);
        assert!(state.is_ready());
    }

    #[test]
    fn test_progress_percent() {
        let mut state = LoadState::new(3);
        assert_eq!(state.progress_percent(), 0);
        state.record(0, true);
        assert_eq!(state.progress_percent(), 33);
        state.record(1, true);
        assert_eq!(state.progress_percent(), 67);
        state.record(2, true);
        assert_eq!(state.progress_percent(), 100);
        assert_eq!(LoadState::new(0).progress_percent(), 100);
    }

    /// Test: Manual loader emits one ready event for shuffled completions
    #[test]
    fn test_manual_loader_shuffled() {
        let bus = EventBus::new();
        let (ready, progress) = count_events(&bus);
        let (mut loader, tx) = FrameLoader::manual(sequence(8), bus);

        assert_eq!(loader.sequence().status(0), Some(FrameStatus::Loading));

        for &i in &SHUFFLED[..7] {
            tx.send(LoadCompletion { index: i, result: ok_image() }).unwrap();
        }
        assert_eq!(loader.poll(), 7);
        assert!(!loader.is_ready());
        assert_eq!(ready.load(Ordering::SeqCst), 0);

        tx.send(LoadCompletion { index: SHUFFLED[7], result: ok_image() }).unwrap();
        // Late duplicate after readiness
        tx.send(LoadCompletion { index: 0, result: ok_image() }).unwrap();
        loader.poll();
        loader.poll();

        assert!(loader.is_ready());
        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(progress.load(Ordering::SeqCst), 8);
        assert_eq!(loader.sequence().counts(), (8, 0));
    }

    /// Test: Failed slots are distinguishable after readiness
    #[test]
    fn test_manual_loader_failures() {
        let bus = EventBus::new();
        let (ready, _) = count_events(&bus);
        let (mut loader, _tx) = FrameLoader::manual(sequence(4), bus);

        loader.apply(LoadCompletion { index: 3, result: Err(FrameError::Io("404".into())) });
        loader.apply(LoadCompletion { index: 0, result: ok_image() });
        loader.apply(LoadCompletion { index: 2, result: Ok(RgbaImage::new(0, 0)) });
        let last = loader.apply(LoadCompletion { index: 1, result: ok_image() });

        assert_eq!(last, LoadTransition::Ready);
        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(loader.state().failed(), 2);
        assert_eq!(loader.frame(2).unwrap().status(), FrameStatus::Error);
        assert_eq!(loader.frame(3).unwrap().status(), FrameStatus::Error);
        assert!(loader.frame(1).unwrap().image().is_some());
    }

    #[test]
    fn test_unknown_index_ignored() {
        let (mut loader, _tx) = FrameLoader::manual(sequence(2), EventBus::new());
        let t = loader.apply(LoadCompletion { index: 2, result: ok_image() });
        assert_eq!(t, LoadTransition::Ignored);
        assert_eq!(loader.state().completed(), 0);
    }

    struct SyntheticSource {
        fail: Vec<&'static str>,
    }

    impl FrameSource for SyntheticSource {
        fn fetch(&self, path: &Path) -> Result<RgbaImage, FrameError> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if self.fail.contains(&name) {
                Err(FrameError::Io(format!("{} not found", name)))
            } else {
                ok_image()
            }
        }
    }

    /// Test: Worker-driven loading reaches readiness with failures
    #[test]
    fn test_start_with_workers() {
        let workers = Workers::new(3).unwrap();
        let bus = EventBus::new();
        let (ready, _) = count_events(&bus);
        let source = Arc::new(SyntheticSource { fail: vec!["f_002.png", "f_010.png"] });

        let mut loader = FrameLoader::start(sequence(12), source, &workers, bus);
        assert!(loader.wait_ready(Duration::from_secs(10)));

        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(loader.state().completed(), 12);
        assert_eq!(loader.state().failed(), 2);
        assert_eq!(loader.sequence().status(2), Some(FrameStatus::Error));
        assert_eq!(loader.sequence().status(3), Some(FrameStatus::Loaded));
    }

    /// Test: Disk loading with one missing file
    #[test]
    fn test_start_from_disk() {
        let dir = std::env::temp_dir().join(format!("scrollreel_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let pattern = FramePattern::parse("frame_%04d.png", 1).unwrap();
        for i in [0usize, 1, 3] {
            RgbaImage::from_pixel(6, 4, Rgba([i as u8 * 60, 0, 0, 255]))
                .save(dir.join(pattern.file_name(i)))
                .unwrap();
        }

        let workers = Workers::new(2).unwrap();
        let seq = FrameSequence::new(&dir, &pattern, 4);
        let mut loader = FrameLoader::start(seq, Arc::new(DiskSource), &workers, EventBus::new());

        assert!(loader.wait_ready(Duration::from_secs(10)));
        assert_eq!(loader.state().failed(), 1);
        assert_eq!(loader.frame(2).unwrap().status(), FrameStatus::Error);
        assert_eq!(loader.frame(3).unwrap().resolution(), Some((6, 4)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_wait_ready_times_out() {
        let (mut loader, _tx) = FrameLoader::manual(sequence(2), EventBus::new());
        assert!(!loader.wait_ready(Duration::from_millis(20)));
    }
}
