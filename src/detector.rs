//! MediaPipe hand landmarker running in a helper subprocess.
//!
//! The helper is started once and then fed frames over stdin:
//!
//! ```text
//! -> "READY\n"                                   (helper, once)
//! <- width u32le, height u32le, channels u32le, RGB bytes   (per frame)
//! -> {"hands":[{"handedness":"Right","score":0.97,"landmarks":[{"x":..,"y":..,"z":..}, ...]}]}
//! ```
//!
//! An `"error"` field in the reply is logged and treated as "no hand".

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;

use crate::error::Error;
use crate::landmarks::{HandLandmarks, LANDMARK_COUNT, Landmark, LandmarkSource};
use crate::types::FrameBuffer;

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<Landmark>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HandDetector {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    confidence_threshold: f32,
    scratch: Vec<u8>,
}

impl HandDetector {
    /// Spawn `command[0]` with the remaining arguments and wait for its READY line.
    pub fn spawn(command: &[String], confidence_threshold: f32) -> Result<Self, Error> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Detector("empty detector command".into()))?;

        log::info!("starting hand detector: {}", command.join(" "));
        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Detector(format!("spawn {program}: {e}")))?;

        let (stdin, stdout) = match handshake(&mut process) {
            Ok(pipes) => pipes,
            Err(e) => {
                reap(&mut process);
                return Err(e);
            }
        };
        log::info!("hand detector ready");

        Ok(Self {
            process,
            stdin,
            stdout,
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
            scratch: Vec::new(),
        })
    }

    fn send_frame(&mut self, frame: &FrameBuffer) -> std::io::Result<()> {
        self.scratch.clear();
        for value in [frame.width as u32, frame.height as u32, 3u32] {
            self.scratch.extend_from_slice(&value.to_le_bytes());
        }
        for &px in &frame.pixels {
            self.scratch.extend_from_slice(&[(px >> 16) as u8, (px >> 8) as u8, px as u8]);
        }
        self.stdin.write_all(&self.scratch)?;
        self.stdin.flush()
    }
}

/// Take the child's pipes and wait for its READY line.
fn handshake(process: &mut Child) -> Result<(ChildStdin, BufReader<ChildStdout>), Error> {
    let stdin = process.stdin.take().ok_or_else(|| Error::Detector("no stdin".into()))?;
    let stdout = process.stdout.take().ok_or_else(|| Error::Detector("no stdout".into()))?;
    let mut stdout = BufReader::new(stdout);

    let mut ready = String::new();
    stdout
        .read_line(&mut ready)
        .map_err(|e| Error::Detector(format!("waiting for READY: {e}")))?;
    if ready.trim() != "READY" {
        return Err(Error::Detector(format!("expected READY, got {:?}", ready.trim())));
    }
    Ok((stdin, stdout))
}

/// Kill and wait, so no zombie is left behind.
fn reap(process: &mut Child) {
    let _ = process.kill();
    let _ = process.wait();
}

/// First hand at or above `threshold` with a full set of landmarks.
fn pick_hand(result: DetectionResult, threshold: f32) -> Option<HandLandmarks> {
    if let Some(error) = result.error {
        log::warn!("hand detector reported: {error}");
        return None;
    }
    result.hands.into_iter().filter(|hand| hand.score >= threshold).find_map(|hand| {
        if hand.landmarks.len() != LANDMARK_COUNT {
            log::warn!("expected {LANDMARK_COUNT} landmarks, got {}", hand.landmarks.len());
            return None;
        }
        let mut found = HandLandmarks::from_slice(&hand.landmarks).ok()?;
        found.confidence = hand.score;
        found.handedness = hand.handedness;
        Some(found)
    })
}

fn parse_reply(line: &str, threshold: f32) -> Result<Option<HandLandmarks>, Error> {
    let result: DetectionResult = serde_json::from_str(line)
        .map_err(|e| Error::Detector(format!("bad reply {:?}: {e}", line.trim())))?;
    Ok(pick_hand(result, threshold))
}

impl LandmarkSource for HandDetector {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<HandLandmarks>, Error> {
        if frame.is_empty() {
            return Ok(None);
        }
        self.send_frame(frame)
            .map_err(|e| Error::Detector(format!("write frame: {e}")))?;

        let mut reply = String::new();
        let n = self
            .stdout
            .read_line(&mut reply)
            .map_err(|e| Error::Detector(format!("read reply: {e}")))?;
        if n == 0 {
            return Err(Error::Detector("detector exited".into()));
        }

        let hand = parse_reply(&reply, self.confidence_threshold)?;
        if let Some(hand) = &hand {
            log::trace!(
                "hand {} ({:.2}) index tip ({:.3}, {:.3})",
                hand.handedness,
                hand.confidence,
                hand.index_tip().x,
                hand.index_tip().y
            );
        }
        Ok(hand)
    }

    fn label(&self) -> &'static str {
        "mediapipe"
    }
}

impl Drop for HandDetector {
    fn drop(&mut self) {
        reap(&mut self.process);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(score: f32, count: usize) -> String {
        let pts: Vec<String> = (0..count).map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, i as f32 / 21.0)).collect();
        format!(r#"{{"hands":[{{"handedness":"Left","score":{score},"landmarks":[{}]}}]}}"#, pts.join(","))
    }

    #[test]
    fn picks_confident_full_hands() {
        let hand = parse_reply(&reply(0.9, 21), 0.5).unwrap().unwrap();
        assert_eq!(hand.handedness, "Left");
        assert!((hand.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn skips_weak_or_partial_hands() {
        assert!(parse_reply(&reply(0.3, 21), 0.5).unwrap().is_none());
        assert!(parse_reply(&reply(0.9, 20), 0.5).unwrap().is_none());
        assert!(parse_reply(r#"{"hands":[]}"#, 0.5).unwrap().is_none());
    }

    #[test]
    fn error_field_means_no_hand() {
        assert!(parse_reply(r#"{"hands":[],"error":"model missing"}"#, 0.5).unwrap().is_none());
    }

    #[test]
    fn garbage_is_a_protocol_error() {
        assert!(matches!(parse_reply("not json", 0.5), Err(Error::Detector(_))));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let command = vec!["/nonexistent/pinch-ink-detector".to_string()];
        assert!(matches!(HandDetector::spawn(&command, 0.5), Err(Error::Detector(_))));
        assert!(matches!(HandDetector::spawn(&[], 0.5), Err(Error::Detector(_))));
    }

    #[cfg(unix)]
    #[test]
    fn helper_without_ready_line_is_rejected_and_reaped() {
        let command: Vec<String> = ["sh", "-c", "echo LOADING; sleep 30"].map(String::from).to_vec();
        let started = std::time::Instant::now();
        match HandDetector::spawn(&command, 0.5) {
            Err(Error::Detector(reason)) => assert!(reason.contains("LOADING"), "{reason}"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("helper never sent READY"),
        }
        // the sleeping helper was killed, not waited out
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
    }

    #[cfg(unix)]
    #[test]
    fn helper_that_exits_early_is_rejected() {
        let command = vec!["true".to_string()];
        assert!(matches!(HandDetector::spawn(&command, 0.5), Err(Error::Detector(_))));
    }
}
