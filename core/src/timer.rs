/// Playback clock for the current item plus the frame task that drives it
use crate::navigation::Cursor;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_ITEM_DURATION: Duration = Duration::from_millis(5000);
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Progress reached 1; equivalent to a tap-right
    Advance,
}

/// Progress clock scoped to one cursor position.
///
/// Elapsed time is banked on pause and the clock resumes from the banked
/// value, so the progress bar never rewinds or jumps.
#[derive(Debug, Clone)]
pub struct PlaybackTimer {
    duration: Duration,
    cursor: Cursor,
    state: PlaybackState,
    /// Elapsed content time accumulated before the current run segment
    banked: Duration,
    /// Start of the current run segment (meaningful while running)
    segment_start: Instant,
    completed: bool,
}

impl PlaybackTimer {
    pub fn new(duration: Duration, cursor: Cursor, now: Instant) -> Self {
        Self {
            duration,
            cursor,
            state: PlaybackState::Running,
            banked: Duration::ZERO,
            segment_start: now,
            completed: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Reset for a new cursor position and start running
    pub fn restart(&mut self, cursor: Cursor, now: Instant) {
        self.cursor = cursor;
        self.state = PlaybackState::Running;
        self.banked = Duration::ZERO;
        self.segment_start = now;
        self.completed = false;
    }

    pub fn pause(&mut self, now: Instant) {
        if self.state == PlaybackState::Paused {
            return;
        }
        self.banked += now.saturating_duration_since(self.segment_start);
        self.state = PlaybackState::Paused;
        debug!("timer: paused at {:?} for {:?}", self.banked, self.cursor);
    }

    pub fn resume(&mut self, now: Instant) {
        if self.state == PlaybackState::Running {
            return;
        }
        self.segment_start = now;
        self.state = PlaybackState::Running;
        debug!("timer: resumed from {:?} for {:?}", self.banked, self.cursor);
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let total = match self.state {
            PlaybackState::Running => self.banked + now.saturating_duration_since(self.segment_start),
            PlaybackState::Paused => self.banked,
        };
        total.min(self.duration)
    }

    /// Elapsed fraction of the item duration in [0, 1]
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    /// Called once per frame. Fires `Advance` exactly once per item.
    pub fn tick(&mut self, now: Instant) -> Option<TimerEvent> {
        if self.completed || self.state != PlaybackState::Running {
            return None;
        }
        if self.progress(now) >= 1.0 {
            self.completed = true;
            return Some(TimerEvent::Advance);
        }
        None
    }
}

/// One frame notification from a `FrameTicker` task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    pub generation: u64,
}

/// Cancellable repeating frame task.
///
/// Owns the handle of at most one spawned task. `start` always aborts the
/// previous task and bumps the generation; ticks from an older generation
/// that are still queued must be ignored by the receiver.
pub struct FrameTicker {
    interval: Duration,
    tx: mpsc::UnboundedSender<FrameTick>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl FrameTicker {
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<FrameTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            interval: interval.max(Duration::from_millis(1)),
            tx,
            handle: None,
            generation: 0,
        };
        (ticker, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Whether a tick belongs to the currently running task
    pub fn is_current(&self, tick: FrameTick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }

    pub fn start(&mut self) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let period = self.interval;
        let tx = self.tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(FrameTick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
