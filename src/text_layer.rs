//! Draggable text notes that sit above the ink.
//!
//! Items are kept in paint order: the last item is drawn on top and wins hit
//! tests. Grabbing an item raises it to the top, the way sticky notes behave
//! on a desk.

use crate::font;
use crate::types::{FrameBuffer, Rgb};

/// Padding between a note's text and the edge of its backing card.
pub const NOTE_PADDING: i32 = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub id: u32,
    pub text: String,
    /// Top-left of the card in canvas pixels.
    pub x: i32,
    pub y: i32,
    pub color: Rgb,
    /// Card fill; `None` draws bare text.
    pub background: Option<Rgb>,
    pub scale: u32,
}

impl TextItem {
    /// (x, y, width, height) of the card, padding included.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        let w = font::text_width(&self.text, self.scale) + 2 * NOTE_PADDING;
        let h = font::text_height(self.scale) + 2 * NOTE_PADDING;
        (self.x, self.y, w, h)
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        let (x, y, w, h) = self.bounds();
        px >= x && py >= y && px < x + w && py < y + h
    }

    fn render(&self, fb: &mut FrameBuffer) {
        let (x, y, w, h) = self.bounds();
        if let Some(bg) = self.background {
            let bg = bg.to_argb();
            for py in y..y + h {
                for px in x..x + w {
                    fb.put(px, py, bg);
                }
            }
        }
        font::draw_text(fb, x + NOTE_PADDING, y + NOTE_PADDING, &self.text, self.scale, self.color.to_argb());
    }
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    id: u32,
    grab_dx: i32,
    grab_dy: i32,
}

#[derive(Default)]
pub struct TextLayer {
    items: Vec<TextItem>,
    next_id: u32,
    drag: Option<Drag>,
}

impl TextLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: impl Into<String>, x: i32, y: i32, color: Rgb, background: Option<Rgb>) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(TextItem { id, text: text.into(), x, y, color, background, scale: 2 });
        log::debug!("text item {id} added at ({x}, {y})");
        id
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.drag.is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        self.items.len() != before
    }

    pub fn item(&self, id: u32) -> Option<&TextItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Topmost item under the point.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<u32> {
        self.items.iter().rev().find(|item| item.contains(x, y)).map(|item| item.id)
    }

    /// Grab the topmost item under the point and raise it.
    pub fn begin_drag(&mut self, x: i32, y: i32) -> Option<u32> {
        let id = self.hit_test(x, y)?;
        let pos = self.items.iter().position(|item| item.id == id)?;
        let item = self.items.remove(pos);
        self.drag = Some(Drag { id, grab_dx: x - item.x, grab_dy: y - item.y });
        self.items.push(item);
        Some(id)
    }

    /// Move the grabbed item so the grab point follows the pointer.
    pub fn drag_to(&mut self, x: i32, y: i32) {
        let Some(drag) = self.drag else { return };
        if let Some(item) = self.items.iter_mut().find(|item| item.id == drag.id) {
            item.x = x - drag.grab_dx;
            item.y = y - drag.grab_dy;
        }
    }

    pub fn end_drag(&mut self) -> Option<u32> {
        self.drag.take().map(|d| d.id)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn render(&self, fb: &mut FrameBuffer) {
        for item in &self.items {
            item.render(fb);
        }
    }
}
