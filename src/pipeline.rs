//! Per-frame hand-to-ink processing.
//!
//! The tracking side hands over one immutable landmark snapshot per camera
//! frame (or nothing when no hand is visible). [`HandPipeline::process`] is the
//! single consumer of those snapshots and runs, in order:
//!
//! 1. pinch classification,
//! 2. index-tip mapping into canvas pixels (mirror aware),
//! 3. rolling-mean smoothing,
//! 4. the stroke state machine.
//!
//! Everything it needs beyond its own smoothing window comes in through the
//! [`Session`] argument, so the same frames always produce the same pixels.

use crate::gesture::{self, Pinch};
use crate::landmarks::HandLandmarks;
use crate::mapper;
use crate::session::Session;
use crate::smoother::{PointSmoother, SmoothingReset};
use crate::stroke::{StrokeEvent, StrokeRenderer};
use crate::types::Point;

/// What one frame did; drives the cursor and HUD.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    /// Smoothed index-tip position, `None` without a hand.
    pub cursor: Option<Point>,
    pub pinch: Option<Pinch>,
    pub event: StrokeEvent,
}

pub struct HandPipeline {
    smoother: PointSmoother,
}

impl HandPipeline {
    pub fn new(session: &Session) -> Self {
        Self { smoother: PointSmoother::new(session.smoothing_window) }
    }

    pub fn process(
        &mut self,
        hand: Option<&HandLandmarks>,
        renderer: &mut StrokeRenderer,
        session: &Session,
    ) -> FrameReport {
        let Some(hand) = hand else {
            return FrameReport { cursor: None, pinch: None, event: self.stop(renderer) };
        };

        let pinch = gesture::classify(hand);
        let canvas = renderer.canvas();
        let raw = mapper::map_landmark(hand.index_tip(), session.mirror, canvas.width(), canvas.height());

        let starting = pinch.active && !renderer.is_drawing();
        if starting && session.smoothing_reset == SmoothingReset::OnStrokeStart {
            self.smoother.reset();
        }
        let point = self.smoother.push(raw);

        let event = renderer.step(pinch.active, point, &session.brush);
        FrameReport { cursor: Some(point), pinch: Some(pinch), event }
    }

    /// Force Drawing -> Idle and drop the smoothing history, e.g. when the hand
    /// is lost or tracking is switched off.
    pub fn stop(&mut self, renderer: &mut StrokeRenderer) -> StrokeEvent {
        self.smoother.reset();
        renderer.end()
    }

    pub fn buffered_points(&self) -> usize {
        self.smoother.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;
    use crate::mapper::MirrorFlags;

    fn hand(tip_x: f32, tip_y: f32, pinching: bool) -> HandLandmarks {
        let mut points = [Landmark::new(0.5, 0.9); 21];
        points[0] = Landmark::new(tip_x, tip_y + 0.4);
        points[8] = Landmark::new(tip_x, tip_y);
        let gap = if pinching { 0.01 } else { 0.2 };
        points[4] = Landmark::new(tip_x + gap, tip_y);
        HandLandmarks::new(points)
    }

    fn session() -> Session {
        let mut s = Session::default();
        s.mirror = MirrorFlags { feed: false, drawing: false };
        s
    }

    #[test]
    fn continuous_pinch_is_one_stroke() {
        let session = session();
        let mut pipeline = HandPipeline::new(&session);
        let mut renderer = StrokeRenderer::new(200, 100);

        let frames = 6;
        let mut segments = 0;
        for i in 0..frames {
            let report =
                pipeline.process(Some(&hand(0.1 + i as f32 * 0.1, 0.5, true)), &mut renderer, &session);
            if matches!(report.event, StrokeEvent::Segment { .. }) {
                segments += 1;
            }
        }
        assert_eq!(segments, frames - 1);
        assert_eq!(renderer.canvas().undo_depth(), 1);
        assert_eq!(renderer.points().len(), frames);
    }

    #[test]
    fn release_and_lost_hand_end_the_stroke() {
        let session = session();
        let mut pipeline = HandPipeline::new(&session);
        let mut renderer = StrokeRenderer::new(100, 100);

        pipeline.process(Some(&hand(0.2, 0.2, true)), &mut renderer, &session);
        let report = pipeline.process(Some(&hand(0.3, 0.2, false)), &mut renderer, &session);
        assert_eq!(report.event, StrokeEvent::Ended);
        assert!(report.cursor.is_some());

        pipeline.process(Some(&hand(0.2, 0.2, true)), &mut renderer, &session);
        let report = pipeline.process(None, &mut renderer, &session);
        assert_eq!(report.event, StrokeEvent::Ended);
        assert_eq!(report.cursor, None);
        assert_eq!(pipeline.buffered_points(), 0);
        assert_eq!(renderer.canvas().undo_depth(), 2);
    }

    #[test]
    fn stroke_start_reset_uses_the_raw_first_point() {
        let session = session();
        let mut pipeline = HandPipeline::new(&session);
        let mut renderer = StrokeRenderer::new(100, 100);

        // hover on the far left, then pinch on the far right
        for _ in 0..4 {
            pipeline.process(Some(&hand(0.1, 0.5, false)), &mut renderer, &session);
        }
        let report = pipeline.process(Some(&hand(0.9, 0.5, true)), &mut renderer, &session);
        assert_eq!(report.event, StrokeEvent::Started(Point::new(90.0, 50.0)));
    }

    #[test]
    fn never_reset_blends_with_the_hover_tail() {
        let mut session = session();
        session.smoothing_reset = SmoothingReset::Never;
        let mut pipeline = HandPipeline::new(&session);
        let mut renderer = StrokeRenderer::new(100, 100);

        for _ in 0..4 {
            pipeline.process(Some(&hand(0.1, 0.5, false)), &mut renderer, &session);
        }
        let report = pipeline.process(Some(&hand(0.9, 0.5, true)), &mut renderer, &session);
        let StrokeEvent::Started(at) = report.event else {
            panic!("expected a stroke start, got {:?}", report.event);
        };
        assert!((at.x - 26.0).abs() < 1e-3, "{at:?}");
    }

    #[test]
    fn mirror_flag_moves_the_ink() {
        let mut session = session();
        session.mirror.feed = true;
        let mut pipeline = HandPipeline::new(&session);
        let mut renderer = StrokeRenderer::new(100, 100);

        let report = pipeline.process(Some(&hand(0.3, 0.5, true)), &mut renderer, &session);
        let cursor = report.cursor.unwrap();
        assert!((cursor.x - 70.0).abs() < 1e-3);
    }
}
