// Every variant states *where* things went wrong.
// Drawing itself never fails; only the outer collaborators do.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String),
    #[error("window update error: {0}")]
    WindowUpdate(String),
    #[error("camera init error: {0}")]
    CameraInit(String),
    #[error("camera frame error: {0}")]
    CameraFrame(String),
    #[error("hand detector error: {0}")]
    Detector(String),
    #[error("replay {}: line {line}: {reason}", path.display())]
    Replay { path: PathBuf, line: usize, reason: String },
    #[error("expected 21 hand landmarks, got {0}")]
    LandmarkCount(usize),
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
    #[error("config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
    #[error("export {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },
}
