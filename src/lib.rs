//! Hand-tracked drawing surface.
//!
//! A camera background, a persistent ink layer and a layer of draggable text
//! notes, composited into one image. Ink comes from a pinch gesture seen by a
//! hand landmark detector, or from the mouse when there is no camera.
//!
//! The per-frame core is window- and camera-free:
//! [`pipeline::HandPipeline`] turns landmark snapshots into strokes on a
//! [`stroke::StrokeRenderer`], configured by an explicit [`session::Session`].

pub mod app;
pub mod camera;
pub mod canvas;
pub mod compose;
pub mod config;
pub mod detector;
pub mod draw;
pub mod error;
pub mod font;
pub mod gamma;
pub mod gesture;
pub mod landmarks;
pub mod mapper;
pub mod pipeline;
pub mod pointer;
pub mod session;
pub mod smoother;
pub mod stroke;
pub mod text_layer;
pub mod tracking;
pub mod types;
pub mod undo;

pub use error::Error;
