//! Pinch detection.
//!
//! The pen is "down" while the thumb tip and index tip are close together.
//! "Close" is measured against the wrist-to-index-tip length of the same
//! hand, so the threshold scales with the hand's size on screen and works at
//! any distance from the camera.

use crate::landmarks::{HandLandmarks, Landmark};

/// Pinch threshold as a fraction of the wrist-to-index-tip distance.
pub const PINCH_RATIO: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pinch {
    pub active: bool,
    /// Thumb-tip to index-tip distance in normalized space; sizes the cursor ring.
    pub distance: f32,
    pub threshold: f32,
}

/// Strict comparison: a distance exactly at the threshold is not a pinch.
#[inline]
pub fn is_pinch(distance: f32, threshold: f32) -> bool {
    distance < threshold
}

pub fn classify_pinch(thumb_tip: Landmark, index_tip: Landmark, wrist: Landmark) -> Pinch {
    let distance = thumb_tip.distance(&index_tip);
    let threshold = PINCH_RATIO * wrist.distance(&index_tip);
    Pinch { active: is_pinch(distance, threshold), distance, threshold }
}

pub fn classify(hand: &HandLandmarks) -> Pinch {
    classify_pinch(hand.thumb_tip(), hand.index_tip(), hand.wrist())
}
