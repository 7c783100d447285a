//! User-adjustable drawing state, passed explicitly into every operation.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::mapper::MirrorFlags;
use crate::smoother::{MAX_SMOOTHING_WINDOW, SmoothingReset};
use crate::types::Rgb;

pub const MIN_BRUSH_WIDTH: f32 = 1.0;
pub const MAX_BRUSH_WIDTH: f32 = 64.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Brush {
    pub color: Rgb,
    /// Stroke width in canvas pixels.
    pub width: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: Rgb(0xE5, 0x39, 0x35), width: 6.0 }
    }
}

/// Which device currently drives the stroke renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Hand,
    Pointer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub brush: Brush,
    pub mirror: MirrorFlags,
    pub smoothing_window: usize,
    pub smoothing_reset: SmoothingReset,
    pub input: InputMode,
    pub palette: Vec<Rgb>,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Session {
    pub fn from_config(config: &Config) -> Self {
        let mut brush = config.brush;
        brush.width = brush.width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
        Self {
            brush,
            mirror: config.mirror,
            smoothing_window: config.smoothing.window.clamp(1, MAX_SMOOTHING_WINDOW),
            smoothing_reset: config.smoothing.reset,
            input: InputMode::Hand,
            palette: config.palette.clone(),
        }
    }

    pub fn toggle_feed_mirror(&mut self) {
        self.mirror.feed = !self.mirror.feed;
    }

    pub fn toggle_drawing_mirror(&mut self) {
        self.mirror.drawing = !self.mirror.drawing;
    }

    pub fn adjust_width(&mut self, delta: f32) {
        self.brush.width = (self.brush.width + delta).clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
    }

    /// Select a palette entry; out-of-range slots are ignored.
    pub fn pick_color(&mut self, slot: usize) -> bool {
        match self.palette.get(slot) {
            Some(&color) => {
                self.brush.color = color;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_is_clamped() {
        let mut session = Session::default();
        session.adjust_width(1000.0);
        assert_eq!(session.brush.width, MAX_BRUSH_WIDTH);
        session.adjust_width(-1000.0);
        assert_eq!(session.brush.width, MIN_BRUSH_WIDTH);
    }

    #[test]
    fn smoothing_window_from_config_is_bounded() {
        let mut config = Config::default();
        config.smoothing.window = 1_000_000_000;
        assert_eq!(Session::from_config(&config).smoothing_window, MAX_SMOOTHING_WINDOW);
        config.smoothing.window = 0;
        assert_eq!(Session::from_config(&config).smoothing_window, 1);
        config.smoothing.window = 5;
        assert_eq!(Session::from_config(&config).smoothing_window, 5);
    }

    #[test]
    fn palette_slots() {
        let mut session = Session::default();
        session.palette = vec![Rgb(1, 2, 3)];
        assert!(session.pick_color(0));
        assert_eq!(session.brush.color, Rgb(1, 2, 3));
        assert!(!session.pick_color(7));
        assert_eq!(session.brush.color, Rgb(1, 2, 3));
    }

    #[test]
    fn mirror_toggles_are_independent() {
        let mut session = Session::default();
        let before = session.mirror;
        session.toggle_drawing_mirror();
        assert_eq!(session.mirror.feed, before.feed);
        assert_ne!(session.mirror.drawing, before.drawing);
        session.toggle_feed_mirror();
        assert_ne!(session.mirror.feed, before.feed);
    }
}
