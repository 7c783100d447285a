//! `pinch-ink.toml` settings. Every field has a default, so an empty file
//! (or no file at all) gives a working setup.
//!
//! ```toml
//! palette = ["#e53935", "#1e88e5", "#43a047", "#fdd835", "#212121"]
//!
//! [brush]
//! color = "#e53935"
//! width = 6.0
//!
//! [mirror]
//! feed = true
//! drawing = false
//!
//! [smoothing]
//! window = 5
//! reset = "on-stroke-start"   # or "never"
//!
//! [tracker]
//! command = ["python3", "hand_detect.py"]
//! confidence = 0.5
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::mapper::MirrorFlags;
use crate::session::Brush;
use crate::smoother::{SMOOTHING_WINDOW, SmoothingReset};
use crate::types::Rgb;

pub const DEFAULT_CONFIG_FILE: &str = "pinch-ink.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub palette: Vec<Rgb>,
    pub camera: CameraConfig,
    pub brush: Brush,
    pub mirror: MirrorFlags,
    pub smoothing: SmoothingConfig,
    pub tracker: TrackerConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: vec![
                Rgb(0xE5, 0x39, 0x35),
                Rgb(0x1E, 0x88, 0xE5),
                Rgb(0x43, 0xA0, 0x47),
                Rgb(0xFD, 0xD8, 0x35),
                Rgb(0x21, 0x21, 0x21),
            ],
            camera: CameraConfig::default(),
            brush: Brush::default(),
            mirror: MirrorFlags::default(),
            smoothing: SmoothingConfig::default(),
            tracker: TrackerConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub enabled: bool,
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { enabled: true, index: 0, width: 640, height: 480 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    pub window: usize,
    pub reset: SmoothingReset,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window: SMOOTHING_WINDOW, reset: SmoothingReset::OnStrokeStart }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Detector subprocess argv; first element is the program.
    pub command: Vec<String>,
    /// Minimum detector score for a hand to count.
    pub confidence: f32,
    /// Play landmarks back from a recording instead of running the detector.
    pub replay: Option<PathBuf>,
    pub replay_loop: bool,
    /// Replay pacing when no camera sets the rate.
    pub replay_fps: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".into(), "hand_detect.py".into()],
            confidence: 0.5,
            replay: None,
            replay_loop: true,
            replay_fps: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub dir: PathBuf,
    pub prefix: String,
    /// Backdrop where no camera frame is available.
    pub background: Rgb,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("."), prefix: "ink".into(), background: Rgb::WHITE }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Config { path: origin.to_path_buf(), reason: e.to_string() })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config { path: path.to_path_buf(), reason: e.to_string() })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` if given; otherwise `pinch-ink.toml` when present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    log::info!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}
