//! Stroke capture
//!
//! Turns raw pointer/touch activity into an ordered, throttled point
//! sequence. The driver feeds begin/sample/finish; a finished stroke goes to
//! the round controller. Only one stroke is live at a time.

use glam::Vec2;

use crate::consts::STROKE_THROTTLE_MS;

/// The ordered point sequence captured during one drag gesture. Immutable
/// once handed to the controller.
pub type Stroke = Vec<Vec2>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SamplerState {
    Idle,
    Dragging,
}

/// Pointer-to-stroke state machine.
///
/// Move events arrive far denser than the hit-test needs; sampling is
/// throttled to one point per [`STROKE_THROTTLE_MS`] to bound geometry cost.
#[derive(Debug)]
pub struct StrokeSampler {
    state: SamplerState,
    points: Vec<Vec2>,
    last_sample_at: f64,
}

impl Default for StrokeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeSampler {
    pub fn new() -> Self {
        Self {
            state: SamplerState::Idle,
            points: Vec::new(),
            last_sample_at: 0.0,
        }
    }

    /// True while a drag is in progress.
    pub fn dragging(&self) -> bool {
        self.state == SamplerState::Dragging
    }

    /// Points captured so far, for trail rendering.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Start a drag. Ignored while one is already in progress: the first
    /// contact wins, later concurrent touches are dropped.
    pub fn begin(&mut self, p: Vec2, now_ms: f64) {
        if self.state == SamplerState::Dragging {
            return;
        }
        self.state = SamplerState::Dragging;
        self.points.clear();
        self.points.push(p);
        self.last_sample_at = now_ms;
    }

    /// Record a move. Throttled; the stroke's first point is always kept.
    pub fn sample(&mut self, p: Vec2, now_ms: f64) {
        if self.state != SamplerState::Dragging {
            return;
        }
        if now_ms - self.last_sample_at < STROKE_THROTTLE_MS && !self.points.is_empty() {
            return;
        }
        self.last_sample_at = now_ms;
        self.points.push(p);
    }

    /// End the drag (up, leave, or cancel all finalize the same way).
    /// Returns the stroke when it has at least two points; a degenerate
    /// stroke is discarded silently.
    pub fn finish(&mut self) -> Option<Stroke> {
        if self.state != SamplerState::Dragging {
            return None;
        }
        self.state = SamplerState::Idle;
        let stroke = std::mem::take(&mut self.points);
        if stroke.len() < 2 { None } else { Some(stroke) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_drops_dense_moves() {
        let mut sampler = StrokeSampler::new();
        sampler.begin(Vec2::new(0.0, 0.0), 1000.0);
        sampler.sample(Vec2::new(1.0, 0.0), 1010.0); // too soon
        sampler.sample(Vec2::new(2.0, 0.0), 1029.9); // still too soon
        sampler.sample(Vec2::new(3.0, 0.0), 1030.0); // exactly at the boundary
        sampler.sample(Vec2::new(4.0, 0.0), 1040.0); // too soon again
        sampler.sample(Vec2::new(5.0, 0.0), 1065.0);
        let stroke = sampler.finish().unwrap();
        assert_eq!(
            stroke,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(3.0, 0.0),
                Vec2::new(5.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_degenerate_finish_is_none() {
        let mut sampler = StrokeSampler::new();
        sampler.begin(Vec2::new(10.0, 10.0), 0.0);
        assert!(sampler.finish().is_none());
        assert!(!sampler.dragging());
        // Finish without a drag is also a no-op
        assert!(sampler.finish().is_none());
    }

    #[test]
    fn test_first_contact_wins() {
        let mut sampler = StrokeSampler::new();
        sampler.begin(Vec2::new(0.0, 0.0), 0.0);
        sampler.sample(Vec2::new(10.0, 0.0), 50.0);
        // A second concurrent down must not restart the stroke
        sampler.begin(Vec2::new(99.0, 99.0), 60.0);
        let stroke = sampler.finish().unwrap();
        assert_eq!(stroke[0], Vec2::new(0.0, 0.0));
        assert_eq!(stroke.len(), 2);
    }

    #[test]
    fn test_moves_outside_drag_ignored() {
        let mut sampler = StrokeSampler::new();
        sampler.sample(Vec2::new(1.0, 1.0), 100.0);
        assert!(sampler.points().is_empty());
        assert!(sampler.finish().is_none());
    }

    #[test]
    fn test_sampler_reusable_after_finish() {
        let mut sampler = StrokeSampler::new();
        sampler.begin(Vec2::new(0.0, 0.0), 0.0);
        sampler.sample(Vec2::new(5.0, 5.0), 100.0);
        assert!(sampler.finish().is_some());

        sampler.begin(Vec2::new(1.0, 1.0), 200.0);
        sampler.sample(Vec2::new(2.0, 2.0), 300.0);
        assert_eq!(sampler.points().len(), 2);
        assert_eq!(sampler.finish().unwrap()[0], Vec2::new(1.0, 1.0));
    }
}
