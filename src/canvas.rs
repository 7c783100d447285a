// The persistent ink layer plus its undo history.
// Strokes land here as round-capped segments with soft edges; transparent everywhere else.

use crate::session::Brush;
use crate::types::{FrameBuffer, OPAQUE, Point};
use crate::undo::{Snapshot, UndoStack};

pub struct InkCanvas {
    raster: FrameBuffer,
    history: UndoStack,
}

impl InkCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self { raster: FrameBuffer::new(width, height), history: UndoStack::new() }
    }

    pub fn width(&self) -> usize {
        self.raster.width
    }

    pub fn height(&self) -> usize {
        self.raster.height
    }

    pub fn raster(&self) -> &FrameBuffer {
        &self.raster
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Remember the current raster so the next stroke can be undone as one unit.
    pub fn checkpoint(&mut self) {
        self.history.push(Snapshot::capture(&self.raster));
    }

    /// Restore the most recent checkpoint. Returns false (and does nothing) when there is none.
    ///
    /// A checkpoint taken before a resize is copied in top-left anchored, so the
    /// canvas keeps its current size.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        let restored = snapshot.into_raster();
        if restored.width == self.raster.width && restored.height == self.raster.height {
            self.raster = restored;
        } else {
            self.raster = restored.resized(self.raster.width, self.raster.height);
        }
        true
    }

    /// Erase everything and forget all checkpoints. Not undoable.
    pub fn clear(&mut self) {
        self.raster.fill(0);
        self.history.clear();
    }

    /// Copy-resize: existing ink stays where it was, new area is transparent.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.raster.width && height == self.raster.height {
            return;
        }
        log::debug!(
            "ink canvas resized {}x{} -> {}x{}",
            self.raster.width,
            self.raster.height,
            width,
            height
        );
        self.raster = self.raster.resized(width, height);
    }

    /// Draw a segment with round caps. Pixels whose centre is at least half a
    /// pixel inside `brush.width / 2` are solid; the outermost pixel ring gets
    /// fractional coverage in its alpha byte.
    pub fn draw_segment(&mut self, from: Point, to: Point, brush: &Brush) {
        let radius = (brush.width * 0.5).max(0.5);
        let reach = radius + 0.5;
        let rgb = brush.color.to_argb() & !OPAQUE;

        let min_x = (from.x.min(to.x) - reach).floor().max(0.0);
        let min_y = (from.y.min(to.y) - reach).floor().max(0.0);
        let max_x = (from.x.max(to.x) + reach).ceil().min(self.raster.width as f32 - 1.0);
        let max_y = (from.y.max(to.y) + reach).ceil().min(self.raster.height as f32 - 1.0);
        if max_x < min_x || max_y < min_y {
            return;
        }

        let width = self.raster.width;
        for y in min_y as usize..=max_y as usize {
            for x in min_x as usize..=max_x as usize {
                let c = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (reach - distance_sq_to_segment(c, from, to).sqrt()).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = (coverage * 255.0).round() as u32;
                let px = &mut self.raster.pixels[y * width + x];
                *px = blend_ink(*px, rgb, alpha);
            }
        }
    }
}

/// Lay `rgb` at `alpha` onto an ink pixel.
///
/// Same-colour ink keeps the larger coverage, so the joints between the
/// segments of one stroke don't darken. Different colours stack with
/// straight-alpha "over".
fn blend_ink(dst: u32, rgb: u32, alpha: u32) -> u32 {
    let dst_alpha = dst >> 24;
    if alpha >= 255 {
        return rgb | OPAQUE;
    }
    if dst_alpha == 0 || dst & !OPAQUE == rgb {
        return rgb | (alpha.max(dst_alpha) << 24);
    }

    let a = alpha as f32 / 255.0;
    let d = dst_alpha as f32 / 255.0 * (1.0 - a);
    let out = a + d;
    let mix = |shift: u32| {
        let s = ((rgb >> shift) & 0xFF) as f32;
        let t = ((dst >> shift) & 0xFF) as f32;
        (((s * a + t * d) / out).round() as u32).min(255)
    };
    (((out * 255.0).round() as u32) << 24) | (mix(16) << 16) | (mix(8) << 8) | mix(0)
}

fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (p.x - (a.x + t * abx), p.y - (a.y + t * aby));
    dx * dx + dy * dy
}
