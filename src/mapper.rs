// Normalized landmark -> canvas pixel mapping.
// Recomputed every frame because the canvas may have been resized since the last one.

use serde::{Deserialize, Serialize};

use crate::landmarks::Landmark;
use crate::types::Point;

/// The two horizontal flips that affect where a fingertip lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorFlags {
    /// The camera feed is displayed flipped (selfie view).
    pub feed: bool,
    /// Explicit override that flips the drawing once more.
    pub drawing: bool,
}

impl Default for MirrorFlags {
    fn default() -> Self {
        Self { feed: true, drawing: false }
    }
}

impl MirrorFlags {
    /// Net effect of both flips: set flips cancel out.
    pub fn flips_x(&self) -> bool {
        self.feed != self.drawing
    }
}

/// Map a normalized x/y into a `width` x `height` canvas.
pub fn map_normalized(x: f32, y: f32, mirror: MirrorFlags, width: usize, height: usize) -> Point {
    let mut x = x;
    if mirror.feed {
        x = 1.0 - x;
    }
    if mirror.drawing {
        x = 1.0 - x;
    }
    Point::new(x * width as f32, y * height as f32)
}

pub fn map_landmark(lm: Landmark, mirror: MirrorFlags, width: usize, height: usize) -> Point {
    map_normalized(lm.x, lm.y, mirror, width, height)
}
