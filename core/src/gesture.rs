/// Pointer gesture classification
///
/// A single pointer-down → pointer-up sequence becomes exactly one
/// `Gesture`. `Hold` is reported at pointer-down; the release is then
/// classified as a tap or swipe in element-relative coordinates.
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

pub const SWIPE_DOWN_THRESHOLD_PX: f32 = 60.0;
pub const SWIPE_HORIZONTAL_THRESHOLD_PX: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    TapLeft,
    TapRight,
    SwipeLeft,
    SwipeRight,
    SwipeDown,
    Hold,
}

/// Element-relative pointer position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    pub swipe_down_px: f32,
    pub swipe_horizontal_px: f32,
    /// Small-displacement releases slower than this end a hold without navigating
    pub max_tap_duration: Option<Duration>,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            swipe_down_px: SWIPE_DOWN_THRESHOLD_PX,
            swipe_horizontal_px: SWIPE_HORIZONTAL_THRESHOLD_PX,
            max_tap_duration: None,
        }
    }
}

/// Classify a completed pointer path. Never returns `Hold`.
pub fn classify(start: Point, end: Point, surface_width: f32, th: &GestureThresholds) -> Gesture {
    let dx = end.x - start.x;
    let dy = end.y - start.y;

    if dy.abs() > dx.abs() && dy > th.swipe_down_px {
        return Gesture::SwipeDown;
    }
    if dx.abs() > th.swipe_horizontal_px {
        return if dx < 0.0 {
            Gesture::SwipeLeft
        } else {
            Gesture::SwipeRight
        };
    }
    if end.x < surface_width / 2.0 {
        Gesture::TapLeft
    } else {
        Gesture::TapRight
    }
}

/// Captured at pointer-down, discarded at pointer-up
#[derive(Debug, Clone, Copy)]
pub struct GestureSession {
    pub start: Point,
    pub started_at: Instant,
}

#[derive(Debug, Default)]
pub struct GestureTracker {
    thresholds: GestureThresholds,
    session: Option<GestureSession>,
}

impl GestureTracker {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start a session. A second pointer-down replaces the first.
    pub fn pointer_down(&mut self, pos: Point, at: Instant) -> Gesture {
        self.session = Some(GestureSession {
            start: pos,
            started_at: at,
        });
        Gesture::Hold
    }

    /// End the session and classify it. `None` when there was no session or the
    /// release only ended a long hold.
    pub fn pointer_up(&mut self, pos: Point, at: Instant, surface_width: f32) -> Option<Gesture> {
        let session = self.session.take()?;
        let gesture = classify(session.start, pos, surface_width, &self.thresholds);

        let is_tap = matches!(gesture, Gesture::TapLeft | Gesture::TapRight);
        if let (true, Some(limit)) = (is_tap, self.thresholds.max_tap_duration) {
            let held = at.saturating_duration_since(session.started_at);
            if held > limit {
                debug!("gesture: hold released after {:?}, no navigation", held);
                return None;
            }
        }

        debug!("gesture: classified {:?}", gesture);
        Some(gesture)
    }

    /// Abandon the session without classifying. Returns whether one was active.
    pub fn pointer_cancel(&mut self) -> bool {
        self.session.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn th() -> GestureThresholds {
        GestureThresholds::default()
    }

    #[test]
    fn test_horizontal_swipe_by_sign() {
        let start = Point::new(200.0, 300.0);
        let left = classify(start, Point::new(100.0, 310.0), 400.0, &th());
        let right = classify(start, Point::new(300.0, 290.0), 400.0, &th());
        assert_eq!(left, Gesture::SwipeLeft);
        assert_eq!(right, Gesture::SwipeRight);
    }

    #[test]
    fn test_tap_halves() {
        let g = classify(Point::new(300.0, 100.0), Point::new(305.0, 105.0), 400.0, &th());
        assert_eq!(g, Gesture::TapRight);

        let g = classify(Point::new(50.0, 100.0), Point::new(55.0, 95.0), 400.0, &th());
        assert_eq!(g, Gesture::TapLeft);
    }

    #[test]
    fn test_swipe_down() {
        let g = classify(Point::new(200.0, 100.0), Point::new(210.0, 200.0), 400.0, &th());
        assert_eq!(g, Gesture::SwipeDown);

        // vertical but under the threshold falls through to tap
        let g = classify(Point::new(200.0, 100.0), Point::new(205.0, 150.0), 400.0, &th());
        assert_eq!(g, Gesture::TapRight);

        // upward drag is never a close
        let g = classify(Point::new(200.0, 300.0), Point::new(205.0, 150.0), 400.0, &th());
        assert_eq!(g, Gesture::TapRight);
    }

    #[test]
    fn test_diagonal_prefers_dominant_axis() {
        // |dx| > |dy| even though dy > 60: horizontal swipe
        let g = classify(Point::new(300.0, 100.0), Point::new(200.0, 170.0), 400.0, &th());
        assert_eq!(g, Gesture::SwipeLeft);
    }

    #[test]
    fn test_tracker_session() {
        let mut tracker = GestureTracker::new(th());
        let t0 = Instant::now();
        assert_eq!(tracker.pointer_up(Point::new(1.0, 1.0), t0, 400.0), None);

        assert_eq!(tracker.pointer_down(Point::new(300.0, 50.0), t0), Gesture::Hold);
        assert!(tracker.is_active());
        let g = tracker.pointer_up(Point::new(150.0, 60.0), t0 + Duration::from_millis(120), 400.0);
        assert_eq!(g, Some(Gesture::SwipeLeft));
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_cancel_is_silent() {
        let mut tracker = GestureTracker::new(th());
        let t0 = Instant::now();
        tracker.pointer_down(Point::new(10.0, 10.0), t0);
        assert!(tracker.pointer_cancel());
        assert!(!tracker.pointer_cancel());
        assert_eq!(tracker.pointer_up(Point::new(10.0, 10.0), t0, 400.0), None);
    }

    #[test]
    fn test_long_hold_suppresses_tap_when_configured() {
        let mut tracker = GestureTracker::new(GestureThresholds {
            max_tap_duration: Some(Duration::from_millis(300)),
            ..th()
        });
        let t0 = Instant::now();
        tracker.pointer_down(Point::new(300.0, 50.0), t0);
        assert_eq!(
            tracker.pointer_up(Point::new(300.0, 50.0), t0 + Duration::from_secs(2), 400.0),
            None
        );

        // swipes still count after a long hold
        tracker.pointer_down(Point::new(300.0, 50.0), t0);
        assert_eq!(
            tracker.pointer_up(Point::new(100.0, 50.0), t0 + Duration::from_secs(2), 400.0),
            Some(Gesture::SwipeLeft)
        );
    }
}
