// Rolling-mean jitter filter for mapped fingertip positions.
// Bigger window = steadier line, more lag behind the finger.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::Point;

pub const SMOOTHING_WINDOW: usize = 5;
/// Largest window a config file may ask for.
pub const MAX_SMOOTHING_WINDOW: usize = 64;

/// When the window is emptied besides losing the hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingReset {
    /// Each stroke starts from its own first point.
    #[default]
    OnStrokeStart,
    /// Keep the previous stroke's tail; the new stroke is pulled toward it for a few frames.
    Never,
}

pub struct PointSmoother {
    window: VecDeque<Point>,
    capacity: usize,
}

impl PointSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { window: VecDeque::with_capacity(capacity), capacity }
    }

    /// Push the newest raw point (evicting the oldest past capacity) and return the mean.
    pub fn push(&mut self, p: Point) -> Point {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(p);
        self.mean()
    }

    fn mean(&self) -> Point {
        // f64 sums keep identical inputs averaging back to exactly themselves.
        let n = self.window.len() as f64;
        let (sx, sy) = self
            .window
            .iter()
            .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        Point::new((sx / n) as f32, (sy / n) as f32)
    }

    pub fn current(&self) -> Option<Point> {
        if self.window.is_empty() { None } else { Some(self.mean()) }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PointSmoother {
    fn default() -> Self {
        Self::new(SMOOTHING_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_input_converges_exactly() {
        let mut s = PointSmoother::default();
        s.push(Point::new(3.0, 900.0));
        s.push(Point::new(-40.0, 12.5));
        let target = Point::new(123.456, 78.9);
        let mut out = Point::default();
        for _ in 0..SMOOTHING_WINDOW {
            out = s.push(target);
        }
        assert_eq!(out, target);
        assert_eq!(s.len(), SMOOTHING_WINDOW);
    }

    #[test]
    fn averages_and_evicts_oldest() {
        let mut s = PointSmoother::new(2);
        assert_eq!(s.push(Point::new(0.0, 0.0)), Point::new(0.0, 0.0));
        assert_eq!(s.push(Point::new(10.0, 20.0)), Point::new(5.0, 10.0));
        // (0,0) falls out
        assert_eq!(s.push(Point::new(20.0, 40.0)), Point::new(15.0, 30.0));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn reset_forgets_history() {
        let mut s = PointSmoother::default();
        s.push(Point::new(100.0, 100.0));
        s.reset();
        assert!(s.current().is_none());
        assert_eq!(s.push(Point::new(1.0, 2.0)), Point::new(1.0, 2.0));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut s = PointSmoother::new(0);
        assert_eq!(s.capacity(), 1);
        s.push(Point::new(1.0, 1.0));
        assert_eq!(s.push(Point::new(2.0, 2.0)), Point::new(2.0, 2.0));
    }
}
