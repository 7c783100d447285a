// Mouse/pen input for camera-less drawing.
// Press/move/release map straight onto the stroke machine, unsmoothed.

use crate::session::Brush;
use crate::stroke::{StrokeEvent, StrokeRenderer};
use crate::types::Point;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Cancel,
    /// Pointer left the drawing surface.
    Leave,
}

#[derive(Default)]
pub struct PointerRouter {
    position: Option<Point>,
    pressed: bool,
}

impl PointerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known hover position, for the cursor overlay.
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Update hover/pressed state without drawing, e.g. while a note is dragged.
    pub fn observe(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(p) => {
                self.position = Some(p);
                self.pressed = true;
            }
            PointerEvent::Move(p) => self.position = Some(p),
            PointerEvent::Up | PointerEvent::Cancel => self.pressed = false,
            PointerEvent::Leave => {
                self.position = None;
                self.pressed = false;
            }
        }
    }

    pub fn route(&mut self, event: PointerEvent, renderer: &mut StrokeRenderer, brush: &Brush) -> StrokeEvent {
        let was_pressed = self.pressed;
        self.observe(event);
        match event {
            PointerEvent::Down(p) => renderer.begin(p),
            PointerEvent::Move(p) if was_pressed => renderer.extend(p, brush),
            PointerEvent::Move(_) => StrokeEvent::None,
            PointerEvent::Up | PointerEvent::Cancel | PointerEvent::Leave => renderer.end(),
        }
    }

    /// Turn raw per-frame button/position polling into events.
    ///
    /// A release that also moved is reported as `Move` first and `Up` on the
    /// next poll, so the stroke reaches the release point.
    pub fn poll(&self, down: bool, at: Option<Point>) -> Option<PointerEvent> {
        match (at, down, self.pressed) {
            (None, _, _) if self.position.is_some() || self.pressed => Some(PointerEvent::Leave),
            (None, _, _) => None,
            (Some(p), true, false) => Some(PointerEvent::Down(p)),
            (Some(p), false, true) if self.position != Some(p) => Some(PointerEvent::Move(p)),
            (Some(_), false, true) => Some(PointerEvent::Up),
            (Some(p), _, _) if self.position != Some(p) => Some(PointerEvent::Move(p)),
            (Some(_), _, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    const BRUSH: Brush = Brush { color: Rgb(10, 20, 30), width: 4.0 };

    #[test]
    fn press_drag_release_is_one_stroke() {
        let mut router = PointerRouter::new();
        let mut renderer = StrokeRenderer::new(50, 50);
        let events = [
            PointerEvent::Down(Point::new(5.0, 5.0)),
            PointerEvent::Move(Point::new(20.0, 5.0)),
            PointerEvent::Move(Point::new(20.0, 30.0)),
            PointerEvent::Up,
        ];
        let segments = events
            .into_iter()
            .map(|e| router.route(e, &mut renderer, &BRUSH))
            .filter(|e| matches!(e, StrokeEvent::Segment { .. }))
            .count();
        assert_eq!(segments, 2);
        assert_eq!(renderer.canvas().undo_depth(), 1);
        assert!(!renderer.is_drawing());
        // unsmoothed: the exact corner point is inked
        assert_eq!(renderer.canvas().raster().get(20, 5), Some(BRUSH.color.to_argb()));
    }

    #[test]
    fn hover_draws_nothing() {
        let mut router = PointerRouter::new();
        let mut renderer = StrokeRenderer::new(50, 50);
        let event = router.route(PointerEvent::Move(Point::new(5.0, 5.0)), &mut renderer, &BRUSH);
        assert_eq!(event, StrokeEvent::None);
        assert_eq!(router.position(), Some(Point::new(5.0, 5.0)));
        assert_eq!(renderer.canvas().undo_depth(), 0);
    }

    #[test]
    fn cancel_and_leave_end_the_stroke() {
        for end in [PointerEvent::Cancel, PointerEvent::Leave] {
            let mut router = PointerRouter::new();
            let mut renderer = StrokeRenderer::new(50, 50);
            router.route(PointerEvent::Down(Point::new(1.0, 1.0)), &mut renderer, &BRUSH);
            assert_eq!(router.route(end, &mut renderer, &BRUSH), StrokeEvent::Ended);
            let after = router.route(PointerEvent::Move(Point::new(9.0, 9.0)), &mut renderer, &BRUSH);
            assert_eq!(after, StrokeEvent::None);
        }
    }

    #[test]
    fn poll_derives_events_from_button_state() {
        let mut router = PointerRouter::new();
        let mut renderer = StrokeRenderer::new(50, 50);
        let p = Point::new(3.0, 4.0);
        let q = Point::new(6.0, 4.0);

        assert_eq!(router.poll(false, Some(p)), Some(PointerEvent::Move(p)));
        router.route(PointerEvent::Move(p), &mut renderer, &BRUSH);
        assert_eq!(router.poll(false, Some(p)), None);
        assert_eq!(router.poll(true, Some(p)), Some(PointerEvent::Down(p)));
        router.route(PointerEvent::Down(p), &mut renderer, &BRUSH);
        assert_eq!(router.poll(true, Some(q)), Some(PointerEvent::Move(q)));
        router.route(PointerEvent::Move(q), &mut renderer, &BRUSH);
        assert_eq!(router.poll(false, Some(q)), Some(PointerEvent::Up));
        assert_eq!(router.poll(true, None), Some(PointerEvent::Leave));
    }

    #[test]
    fn release_after_a_move_still_reaches_the_release_point() {
        let mut router = PointerRouter::new();
        let mut renderer = StrokeRenderer::new(50, 50);
        let start = Point::new(5.0, 5.0);
        let end = Point::new(40.0, 5.0);
        router.route(PointerEvent::Down(start), &mut renderer, &BRUSH);

        // moved and let go between two polls
        let first = router.poll(false, Some(end));
        assert_eq!(first, Some(PointerEvent::Move(end)));
        let drawn = router.route(PointerEvent::Move(end), &mut renderer, &BRUSH);
        assert_eq!(drawn, StrokeEvent::Segment { from: start, to: end });

        assert_eq!(router.poll(false, Some(end)), Some(PointerEvent::Up));
        assert_eq!(router.route(PointerEvent::Up, &mut renderer, &BRUSH), StrokeEvent::Ended);
        assert_eq!(renderer.canvas().raster().get(39, 5), Some(BRUSH.color.to_argb()));
        assert_eq!(router.poll(false, Some(end)), None);
    }
}
