//! Draw scheduler - coalesces scroll/resize bursts into one draw per tick.
//!
//! Scroll events can arrive many times per displayed frame. With
//! `DrawSchedule::PerTick` the renderer only records that a draw is wanted and
//! the host's animation tick performs it:
//! 1. Event arrives: `request()` stores (or merges) the pending reason
//! 2. Host tick: `tick()` hands back the merged reason once, then clears it
//!
//! `DrawSchedule::Immediate` keeps the synchronous behavior: `request()` says
//! "draw now" and nothing is stored.

use serde::{Deserialize, Serialize};

/// When draws happen relative to the events that request them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawSchedule {
    /// Draw inside the event handler
    #[default]
    Immediate,
    /// Draw at most once per host tick
    PerTick,
}

/// Why a draw was requested
///
/// Scroll draws only when the frame index changed. Resize and Ready always
/// draw: the canvas size or the frame store changed underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Scroll,
    Ready,
    Resize,
}

impl DrawReason {
    /// Draw even if the frame index is unchanged
    pub fn is_forced(self) -> bool {
        !matches!(self, DrawReason::Scroll)
    }

    fn rank(self) -> u8 {
        match self {
            DrawReason::Scroll => 0,
            DrawReason::Ready => 1,
            DrawReason::Resize => 2,
        }
    }

    /// Combine two pending reasons; the stronger one wins
    pub fn merge(self, other: Self) -> Self {
        if other.rank() > self.rank() { other } else { self }
    }
}

/// Pending-draw bookkeeping for one renderer.
///
/// # Usage
/// ```ignore
/// // In the scroll handler:
/// if scheduler.request(DrawReason::Scroll) {
///     renderer.draw(...);   // Immediate
/// }
///
/// // In the host's animation tick:
/// if let Some(reason) = scheduler.tick() {
///     renderer.draw(...);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DrawScheduler {
    schedule: DrawSchedule,
    pending: Option<DrawReason>,
    /// Requests folded into an already pending draw
    coalesced: u64,
}

impl DrawScheduler {
    pub fn new(schedule: DrawSchedule) -> Self {
        Self {
            schedule,
            pending: None,
            coalesced: 0,
        }
    }

    pub fn schedule(&self) -> DrawSchedule {
        self.schedule
    }

    /// Register a draw request. Returns true if the caller should draw now.
    pub fn request(&mut self, reason: DrawReason) -> bool {
        match self.schedule {
            DrawSchedule::Immediate => true,
            DrawSchedule::PerTick => {
                self.pending = Some(match self.pending {
                    Some(prev) => {
                        self.coalesced += 1;
                        prev.merge(reason)
                    }
                    None => reason,
                });
                log::trace!("DrawScheduler: {:?} pending", self.pending);
                false
            }
        }
    }

    /// Take the pending draw, if any. Clears it.
    pub fn tick(&mut self) -> Option<DrawReason> {
        self.pending.take()
    }

    /// Drop the pending draw
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::trace!("DrawScheduler: cancelled pending draw");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
