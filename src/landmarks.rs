//! Hand landmark types and the sources that produce them.
//!
//! A [`LandmarkSource`] is asked once per camera frame for the hand it sees.
//! Two sources ship with the crate: the MediaPipe subprocess in
//! [`crate::detector`] and [`ReplaySource`], which plays back a recorded
//! JSON-lines file so the pipeline can run without a camera.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::types::FrameBuffer;

/// Number of landmarks in one detected hand.
pub const LANDMARK_COUNT: usize = 21;

/// Hand landmark indices (MediaPipe hand landmark model convention).
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// One landmark, normalized to the camera frame (x, y in 0..1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist; carried through but unused for drawing.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance in normalized space.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// All 21 landmarks of the single tracked hand for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    /// Detector confidence (0.0 to 1.0).
    pub confidence: f32,
    /// "Left" or "Right" as reported by the detector, empty if unknown.
    pub handedness: String,
}

impl HandLandmarks {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks, confidence: 1.0, handedness: String::new() }
    }

    /// Build from a slice, rejecting anything that isn't exactly 21 points.
    pub fn from_slice(points: &[Landmark]) -> Result<Self, Error> {
        let landmarks: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| Error::LandmarkCount(points.len()))?;
        Ok(Self::new(landmarks))
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[index::WRIST]
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.landmarks[index::THUMB_TIP]
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[index::INDEX_FINGER_TIP]
    }
}

/// Anything that can answer "where is the hand in this frame?".
pub trait LandmarkSource: Send {
    /// `Ok(None)` means no hand is visible in `frame`.
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<HandLandmarks>, Error>;

    fn label(&self) -> &'static str;
}

/// One landmark as written in a replay file: `[x, y]`, `[x, y, z]` or `{"x":..,"y":..}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayPoint {
    Pair([f32; 2]),
    Triple([f32; 3]),
    Object(Landmark),
}

impl From<ReplayPoint> for Landmark {
    fn from(p: ReplayPoint) -> Self {
        match p {
            ReplayPoint::Pair([x, y]) => Landmark::new(x, y),
            ReplayPoint::Triple([x, y, z]) => Landmark { x, y, z },
            ReplayPoint::Object(lm) => lm,
        }
    }
}

/// Parse one replay line. `null` is a frame without a hand.
pub fn parse_replay_line(line: &str) -> Result<Option<HandLandmarks>, String> {
    let points: Option<Vec<ReplayPoint>> =
        serde_json::from_str(line).map_err(|e| e.to_string())?;
    match points {
        None => Ok(None),
        Some(points) => {
            let points: Vec<Landmark> = points.into_iter().map(Landmark::from).collect();
            HandLandmarks::from_slice(&points).map(Some).map_err(|e| e.to_string())
        }
    }
}

/// Plays back recorded hand frames, one per `detect` call, ignoring the camera frame.
pub struct ReplaySource {
    frames: Vec<Option<HandLandmarks>>,
    cursor: usize,
    looping: bool,
}

impl ReplaySource {
    pub fn from_frames(frames: Vec<Option<HandLandmarks>>, looping: bool) -> Self {
        Self { frames, cursor: 0, looping }
    }

    /// Load a JSON-lines recording. Blank lines are skipped.
    pub fn open(path: impl AsRef<Path>, looping: bool) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::Replay {
            path: path.to_path_buf(),
            line: 0,
            reason: e.to_string(),
        })?;
        let frames = parse_replay(&text, path)?;
        log::info!("loaded {} replay frames from {}", frames.len(), path.display());
        Ok(Self::from_frames(frames, looping))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn parse_replay(text: &str, path: &Path) -> Result<Vec<Option<HandLandmarks>>, Error> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            parse_replay_line(line).map_err(|reason| Error::Replay {
                path: PathBuf::from(path),
                line: i + 1,
                reason,
            })
        })
        .collect()
}

impl LandmarkSource for ReplaySource {
    fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<HandLandmarks>, Error> {
        if self.cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let hand = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(hand)
    }

    fn label(&self) -> &'static str {
        "replay"
    }
}
