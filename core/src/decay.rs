/// Freshness decay: how far an item has aged through its 24h window
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Lifetime window over which an item fades
pub const DECAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Normalized age of an item in [0, 1].
///
/// 0 means just posted, 1 means the window has fully elapsed. Negative
/// elapsed time (clock skew) counts as fresh.
pub fn freshness(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    freshness_with_window(created_at, now, DECAY_WINDOW)
}

pub fn freshness_with_window(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> f32 {
    let window_ms = window.as_millis() as f64;
    if window_ms <= 0.0 {
        return 1.0;
    }
    let elapsed_ms = (now - created_at).num_milliseconds() as f64;
    (elapsed_ms / window_ms).clamp(0.0, 1.0) as f32
}

/// Affine mapping from freshness to a visual parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub base: f32,
    pub scale: f32,
}

impl Affine {
    pub const fn new(base: f32, scale: f32) -> Self {
        Self { base, scale }
    }

    pub fn apply(&self, freshness: f32) -> f32 {
        self.base + self.scale * freshness.clamp(0.0, 1.0)
    }
}

/// Darkness overlay alpha drawn over item content
pub const CONTENT_OVERLAY: Affine = Affine::new(0.15, 0.55);

/// Brightness multiplier for rail entry points
pub const ENTRY_BRIGHTNESS: Affine = Affine::new(1.0, -0.35);
