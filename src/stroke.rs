//! Stroke state machine on top of the ink canvas.
//!
//! ```text
//!   Idle --pen down--> Drawing   checkpoint, remember the point
//!   Drawing --move---> Drawing   segment from the last point
//!   Drawing --pen up-> Idle      forget the points, raster untouched
//! ```
//!
//! One checkpoint per pen-down means a whole stroke undoes as one unit, no
//! matter how many segments it drew. Hand tracking and the pointer both feed
//! this same machine.

use crate::canvas::InkCanvas;
use crate::session::Brush;
use crate::types::Point;

/// What a single transition did, for HUD feedback and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrokeEvent {
    None,
    Started(Point),
    Segment { from: Point, to: Point },
    Ended,
}

#[derive(Debug, Default)]
enum StrokeState {
    #[default]
    Idle,
    Drawing { last: Point, points: Vec<Point> },
}

pub struct StrokeRenderer {
    canvas: InkCanvas,
    state: StrokeState,
}

impl StrokeRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { canvas: InkCanvas::new(width, height), state: StrokeState::Idle }
    }

    pub fn canvas(&self) -> &InkCanvas {
        &self.canvas
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Points of the stroke in progress; empty while idle.
    pub fn points(&self) -> &[Point] {
        match &self.state {
            StrokeState::Drawing { points, .. } => points,
            StrokeState::Idle => &[],
        }
    }

    /// Idle -> Drawing. A pen-down while already drawing closes the old stroke first.
    pub fn begin(&mut self, at: Point) -> StrokeEvent {
        if self.is_drawing() {
            self.end();
        }
        self.canvas.checkpoint();
        self.state = StrokeState::Drawing { last: at, points: vec![at] };
        log::debug!("stroke started at ({:.1}, {:.1})", at.x, at.y);
        StrokeEvent::Started(at)
    }

    /// Drawing -> Drawing. Ignored while idle.
    pub fn extend(&mut self, to: Point, brush: &Brush) -> StrokeEvent {
        let StrokeState::Drawing { last, points } = &mut self.state else {
            return StrokeEvent::None;
        };
        let from = *last;
        self.canvas.draw_segment(from, to, brush);
        *last = to;
        points.push(to);
        StrokeEvent::Segment { from, to }
    }

    /// Drawing -> Idle. Leaves the raster as it is.
    pub fn end(&mut self) -> StrokeEvent {
        match std::mem::take(&mut self.state) {
            StrokeState::Drawing { points, .. } => {
                log::debug!("stroke ended after {} points", points.len());
                StrokeEvent::Ended
            }
            StrokeState::Idle => StrokeEvent::None,
        }
    }

    /// Pen state for one frame: start, continue or finish a stroke.
    pub fn step(&mut self, pen_down: bool, at: Point, brush: &Brush) -> StrokeEvent {
        match (pen_down, self.is_drawing()) {
            (true, false) => self.begin(at),
            (true, true) => self.extend(at, brush),
            (false, _) => self.end(),
        }
    }

    /// Undo the most recent stroke. An active stroke is finished first so its
    /// checkpoint is the one that gets popped.
    pub fn undo(&mut self) -> bool {
        self.end();
        let undone = self.canvas.undo();
        if undone {
            log::info!("undo ({} checkpoints left)", self.canvas.undo_depth());
        }
        undone
    }

    pub fn clear(&mut self) {
        self.end();
        self.canvas.clear();
        log::info!("canvas cleared");
    }

    /// Copy-resize the canvas; an active stroke carries on in the new coordinates.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.canvas.resize(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    const BRUSH: Brush = Brush { color: Rgb(0, 0, 255), width: 3.0 };

    #[test]
    fn one_checkpoint_per_stroke() {
        let mut r = StrokeRenderer::new(64, 64);
        let mut segments = 0;
        for (i, x) in [5.0, 10.0, 15.0, 20.0].into_iter().enumerate() {
            match r.step(true, Point::new(x, 30.0), &BRUSH) {
                StrokeEvent::Started(_) => assert_eq!(i, 0),
                StrokeEvent::Segment { .. } => segments += 1,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(segments, 3);
        assert_eq!(r.points().len(), 4);
        assert_eq!(r.canvas().undo_depth(), 1);

        assert_eq!(r.step(false, Point::default(), &BRUSH), StrokeEvent::Ended);
        assert!(r.points().is_empty());
        assert_eq!(r.step(false, Point::default(), &BRUSH), StrokeEvent::None);
    }

    #[test]
    fn extend_while_idle_draws_nothing() {
        let mut r = StrokeRenderer::new(16, 16);
        assert_eq!(r.extend(Point::new(4.0, 4.0), &BRUSH), StrokeEvent::None);
        assert!(r.canvas().raster().pixels.iter().all(|&p| p == 0));
        assert_eq!(r.canvas().undo_depth(), 0);
    }

    #[test]
    fn pen_up_leaves_raster_alone() {
        let mut r = StrokeRenderer::new(32, 32);
        r.begin(Point::new(2.0, 2.0));
        r.extend(Point::new(20.0, 20.0), &BRUSH);
        let drawn = r.canvas().raster().clone();
        r.end();
        assert_eq!(r.canvas().raster(), &drawn);
    }

    #[test]
    fn undo_mid_stroke_ends_it() {
        let mut r = StrokeRenderer::new(32, 32);
        r.begin(Point::new(2.0, 2.0));
        r.extend(Point::new(20.0, 20.0), &BRUSH);
        assert!(r.undo());
        assert!(!r.is_drawing());
        assert!(r.canvas().raster().pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn resize_mid_stroke_keeps_drawing() {
        let mut r = StrokeRenderer::new(32, 32);
        r.begin(Point::new(2.0, 2.0));
        r.extend(Point::new(10.0, 2.0), &BRUSH);
        r.resize(64, 48);
        assert!(r.is_drawing());
        assert!(matches!(r.extend(Point::new(50.0, 40.0), &BRUSH), StrokeEvent::Segment { .. }));
        assert_eq!(r.canvas().raster().get(50, 40), Some(BRUSH.color.to_argb()));
        assert_eq!(r.canvas().raster().get(5, 2), Some(BRUSH.color.to_argb()));
    }
}
