//! The whole drawing surface behind the window: layers, input routing and
//! user commands. `main` only polls devices and forwards to a [`Board`].
//!
//! All mutation happens on the caller's thread, one call at a time, so an
//! undo or clear between two frames can never split a stroke's
//! checkpoint-then-draw sequence.

use std::path::{Path, PathBuf};

use crate::compose::{self, Compositor, Layers};
use crate::draw;
use crate::error::Error;
use crate::font;
use crate::pipeline::{FrameReport, HandPipeline};
use crate::pointer::{PointerEvent, PointerRouter};
use crate::session::{InputMode, Session};
use crate::stroke::{StrokeEvent, StrokeRenderer};
use crate::text_layer::TextLayer;
use crate::tracking::TrackedFrame;
use crate::types::{FrameBuffer, Point, Rgb};

const NOTE_COLOR: Rgb = Rgb(0xFF, 0xF1, 0x76);
const CURSOR_IDLE: u32 = 0xFFFF_CC33;
const CURSOR_PINCH: u32 = 0xFF33_FF66;

/// A user action, usually bound to a key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Undo,
    Clear,
    ToggleFeedMirror,
    ToggleDrawingMirror,
    ToggleInputMode,
    AddNote(Point),
    RemoveNoteAt(Point),
    BrushWider,
    BrushNarrower,
    PickColor(usize),
}

pub struct Board {
    session: Session,
    renderer: StrokeRenderer,
    pipeline: HandPipeline,
    pointer: PointerRouter,
    text: TextLayer,
    compositor: Compositor,
    backdrop: Rgb,
    background: Option<FrameBuffer>,
    last_report: Option<FrameReport>,
    tracking_status: Option<String>,
}

impl Board {
    pub fn new(session: Session, width: usize, height: usize, backdrop: Rgb) -> Self {
        Self {
            pipeline: HandPipeline::new(&session),
            session,
            renderer: StrokeRenderer::new(width, height),
            pointer: PointerRouter::new(),
            text: TextLayer::new(),
            compositor: Compositor::new(),
            backdrop,
            background: None,
            last_report: None,
            tracking_status: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn renderer(&self) -> &StrokeRenderer {
        &self.renderer
    }

    pub fn text(&self) -> &TextLayer {
        &self.text
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    pub fn tracking_status(&self) -> Option<&str> {
        self.tracking_status.as_deref()
    }

    /// Window resized: keep the ink, keep any stroke in progress.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.renderer.resize(width, height);
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Undo => {
                self.pipeline.stop(&mut self.renderer);
                self.renderer.undo();
            }
            Command::Clear => {
                self.pipeline.stop(&mut self.renderer);
                self.renderer.clear();
            }
            Command::ToggleFeedMirror => {
                self.session.toggle_feed_mirror();
                log::info!("feed mirror {}", on_off(self.session.mirror.feed));
            }
            Command::ToggleDrawingMirror => {
                self.session.toggle_drawing_mirror();
                log::info!("drawing mirror {}", on_off(self.session.mirror.drawing));
            }
            Command::ToggleInputMode => {
                let next = match self.session.input {
                    InputMode::Hand => InputMode::Pointer,
                    InputMode::Pointer => InputMode::Hand,
                };
                self.set_input_mode(next);
            }
            Command::AddNote(at) => {
                let label = format!("NOTE {}", self.text.len() + 1);
                self.text.add(label, at.x as i32, at.y as i32, Rgb::BLACK, Some(NOTE_COLOR));
            }
            Command::RemoveNoteAt(at) => {
                if let Some(id) = self.text.hit_test(at.x as i32, at.y as i32) {
                    self.text.remove(id);
                }
            }
            Command::BrushWider => self.session.adjust_width(1.0),
            Command::BrushNarrower => self.session.adjust_width(-1.0),
            Command::PickColor(slot) => {
                self.session.pick_color(slot);
            }
        }
    }

    /// Switching devices always ends the active stroke.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        if self.session.input == mode {
            return;
        }
        self.pipeline.stop(&mut self.renderer);
        self.pointer.route(PointerEvent::Cancel, &mut self.renderer, &self.session.brush);
        self.text.end_drag();
        self.last_report = None;
        self.session.input = mode;
        log::info!("input mode: {mode:?}");
    }

    /// One message from the tracking worker.
    pub fn on_tracked_frame(&mut self, tracked: TrackedFrame) {
        if let Some(frame) = tracked.frame {
            self.background = Some(frame);
        }
        if self.session.input != InputMode::Hand {
            return;
        }
        let report = self.pipeline.process(tracked.hand.as_ref(), &mut self.renderer, &self.session);
        self.last_report = Some(report);
    }

    /// The camera or detector is gone: end any stroke and fall back to the pointer.
    pub fn on_tracking_unavailable(&mut self, reason: &str) {
        log::warn!("hand tracking unavailable: {reason}; pointer drawing still works");
        self.tracking_status = Some(format!("TRACKING OFF: {reason}"));
        self.set_input_mode(InputMode::Pointer);
    }

    /// Feed one poll of the mouse. Notes are dragged in either mode; ink only
    /// comes from the mouse in pointer mode.
    pub fn on_pointer(&mut self, down: bool, at: Option<Point>) -> StrokeEvent {
        let Some(event) = self.pointer.poll(down, at) else {
            return StrokeEvent::None;
        };

        if self.text.is_dragging() {
            match event {
                PointerEvent::Move(p) => self.text.drag_to(p.x as i32, p.y as i32),
                _ => {
                    self.text.end_drag();
                }
            }
            return self.track_pointer_only(event);
        }

        if let PointerEvent::Down(p) = event {
            if self.text.begin_drag(p.x as i32, p.y as i32).is_some() {
                return self.track_pointer_only(event);
            }
        }

        match self.session.input {
            InputMode::Pointer => self.pointer.route(event, &mut self.renderer, &self.session.brush),
            InputMode::Hand => self.track_pointer_only(event),
        }
    }

    fn track_pointer_only(&mut self, event: PointerEvent) -> StrokeEvent {
        self.pointer.observe(event);
        StrokeEvent::None
    }

    /// Background + ink + notes, exactly what gets exported.
    pub fn compose_into(&self, out: &mut FrameBuffer) {
        self.compositor.compose_into(
            out,
            &Layers {
                background: self.background.as_ref(),
                mirror_background: self.session.mirror.feed,
                backdrop: self.backdrop,
                ink: self.renderer.canvas().raster(),
                text: &self.text,
            },
        );
    }

    /// Cursor and status line on top of a composed frame.
    pub fn draw_overlay(&self, out: &mut FrameBuffer, fps: f32) {
        match self.session.input {
            InputMode::Hand => {
                if let Some(report) = &self.last_report {
                    if let (Some(c), Some(pinch)) = (report.cursor, report.pinch) {
                        let color = if pinch.active { CURSOR_PINCH } else { CURSOR_IDLE };
                        // ring shrinks as the fingers close
                        let radius = (pinch.distance * out.width as f32 * 0.5).clamp(4.0, 80.0);
                        draw::draw_ring(out, c.x as i32, c.y as i32, radius as i32, color);
                        draw::draw_crosshair(out, c.x as i32, c.y as i32, 6, color);
                    }
                }
            }
            InputMode::Pointer => {
                if let Some(p) = self.pointer.position() {
                    let r = (self.session.brush.width * 0.5).round() as i32;
                    draw::fill_disc(out, p.x as i32, p.y as i32, r, self.session.brush.color.to_argb());
                    draw::draw_ring(out, p.x as i32, p.y as i32, r + 2, CURSOR_IDLE);
                }
            }
        }

        let mode = match self.session.input {
            InputMode::Hand => "HAND",
            InputMode::Pointer => "MOUSE",
        };
        let hud = format!(
            "{mode} | W {} | UNDO {} | M {} N {} | FPS {fps:.1}",
            self.session.brush.width as u32,
            self.renderer.canvas().undo_depth(),
            on_off(self.session.mirror.feed),
            on_off(self.session.mirror.drawing),
        );
        font::draw_text_shadowed(out, 8, 8, &hud, 0xFFFF_FFFF);
        if let Some(status) = &self.tracking_status {
            font::draw_text_shadowed(out, 8, 20, status, 0xFFFF_6666);
        }
    }

    /// Compose and write the next free `<prefix>-NNNN.png` in `dir`.
    pub fn export(&self, dir: &Path, prefix: &str) -> Result<PathBuf, Error> {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Export { path: dir.to_path_buf(), reason: e.to_string() })?;
        let mut out = FrameBuffer::new(0, 0);
        self.compose_into(&mut out);
        let path = compose::next_export_path(dir, prefix);
        compose::export_png(&out, &path)?;
        Ok(path)
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}
