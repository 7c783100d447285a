// What you SEE:
// • The camera feed (or a plain backdrop) with your ink on top.
// • Pinch thumb and index together to draw; open the pinch to lift the pen.
// • P switches to mouse drawing; losing the camera does that for you.
// • Z/U undo, C clear, M/N mirror feed/drawing, T note, Del remove note,
//   S export PNG, [ ] brush width, 1-5 colors. ESC quits.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use minifb::Key;

use pinch_ink::app::{Board, Command};
use pinch_ink::camera::{CameraCapture, FrameGrabber};
use pinch_ink::config::{CameraConfig, Config, TrackerConfig};
use pinch_ink::detector::HandDetector;
use pinch_ink::draw::Drawer;
use pinch_ink::landmarks::{LandmarkSource, ReplaySource};
use pinch_ink::session::{InputMode, Session};
use pinch_ink::tracking::{self, TrackingWorker};
use pinch_ink::types::{FrameBuffer, Point};

#[derive(Parser, Debug)]
#[command(name = "pinch-ink", version, about = "Draw in the air with a pinch")]
struct Args {
    /// Config file (defaults to ./pinch-ink.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera index, overrides the config file
    #[arg(long)]
    camera: Option<u32>,

    /// Replay landmarks from a JSONL recording instead of running the detector
    #[arg(long)]
    replay: Option<PathBuf>,

    /// No camera, no detector: mouse drawing only
    #[arg(long)]
    pointer_only: bool,

    /// Where exported PNGs go
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

const KEY_COMMANDS: &[(Key, Command)] = &[
    (Key::Z, Command::Undo),
    (Key::U, Command::Undo),
    (Key::C, Command::Clear),
    (Key::M, Command::ToggleFeedMirror),
    (Key::N, Command::ToggleDrawingMirror),
    (Key::P, Command::ToggleInputMode),
    (Key::Key1, Command::PickColor(0)),
    (Key::Key2, Command::PickColor(1)),
    (Key::Key3, Command::PickColor(2)),
    (Key::Key4, Command::PickColor(3)),
    (Key::Key5, Command::PickColor(4)),
];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load_or_default(args.config.as_deref()).context("loading config")?;
    apply_overrides(&mut config, &args);

    let mut session = Session::from_config(&config);
    let tracking = if args.pointer_only {
        session.input = InputMode::Pointer;
        None
    } else {
        Some(spawn_tracking(&config))
    };

    /* --- Window + board ---
       Visual: window opens at the requested camera size; ink keeps its place on resize. */
    let (w, h) = (config.camera.width as usize, config.camera.height as usize);
    let mut drawer = Drawer::new("Pinch Ink", w, h).context("opening window")?;
    let mut board = Board::new(session, w, h, config.export.background);
    let mut screen = FrameBuffer::new(w, h);

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut fps = 0.0f32;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let (cw, ch) = drawer.size();
        if cw > 0 && ch > 0 && (cw, ch) != (board.renderer().canvas().width(), board.renderer().canvas().height()) {
            board.resize(cw, ch);
        }

        /* 1) Keys */
        for &(key, command) in KEY_COMMANDS {
            if drawer.pressed_once(key) {
                board.apply(command);
            }
        }
        if drawer.pressed_repeat(Key::RightBracket) {
            board.apply(Command::BrushWider);
        }
        if drawer.pressed_repeat(Key::LeftBracket) {
            board.apply(Command::BrushNarrower);
        }
        let cursor = drawer.mouse_pos().unwrap_or(Point::new(w as f32 / 2.0, h as f32 / 2.0));
        if drawer.pressed_once(Key::T) {
            board.apply(Command::AddNote(cursor));
        }
        if drawer.pressed_once(Key::Delete) || drawer.pressed_once(Key::Backspace) {
            board.apply(Command::RemoveNoteAt(cursor));
        }
        if drawer.pressed_once(Key::S) {
            match board.export(&config.export.dir, &config.export.prefix) {
                Ok(path) => log::info!("exported {}", path.display()),
                Err(e) => log::error!("export failed: {e}"),
            }
        }

        /* 2) Newest tracked frame; stale ones were dropped in the channel */
        if let Some(worker) = &tracking {
            let drained = worker.drain();
            for reason in &drained.unavailable {
                board.on_tracking_unavailable(reason);
            }
            if let Some(frame) = drained.frame {
                board.on_tracked_frame(frame);
            }
        }

        /* 3) Mouse: note dragging always, ink in pointer mode */
        board.on_pointer(drawer.left_mouse_down(), drawer.mouse_pos());

        /* 4) Composite, overlay, present */
        board.compose_into(&mut screen);
        board.draw_overlay(&mut screen, fps);
        drawer.present(&screen).context("presenting frame")?;

        /* 5) FPS counter */
        frames_this_second += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(last_fps_time);
        if elapsed >= Duration::from_secs(1) {
            fps = frames_this_second as f32 / elapsed.as_secs_f32();
            log::debug!("fps {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    if let Some(replay) = &args.replay {
        config.tracker.replay = Some(replay.clone());
    }
    if let Some(dir) = &args.export_dir {
        config.export.dir = dir.clone();
    }
}

/// Camera and detector are opened on the worker thread; failures come back
/// as `Unavailable` messages, never as a startup error. A replay keeps
/// playing when the camera can't be opened.
fn spawn_tracking(config: &Config) -> TrackingWorker {
    let camera = config.camera.clone();
    let tracker = config.tracker.clone();
    TrackingWorker::spawn(move || {
        let idle_interval = Duration::from_secs(1) / tracker.replay_fps.max(1);
        tracking::open_inputs(
            camera.enabled.then_some(|| open_camera(&camera)),
            || open_source(&tracker),
            tracker.replay.is_none(),
            idle_interval,
        )
    })
}

fn open_camera(camera: &CameraConfig) -> Result<Box<dyn FrameGrabber>, pinch_ink::Error> {
    let capture = CameraCapture::new(camera.index, camera.width, camera.height)?;
    let (w, h) = capture.resolution();
    if (w, h) != (camera.width, camera.height) {
        log::info!("camera {} gave {w}x{h} instead of {}x{}", camera.index, camera.width, camera.height);
    }
    Ok(Box::new(capture))
}

fn open_source(tracker: &TrackerConfig) -> Result<Box<dyn LandmarkSource>, pinch_ink::Error> {
    let source: Box<dyn LandmarkSource> = match &tracker.replay {
        Some(path) => Box::new(ReplaySource::open(path, tracker.replay_loop)?),
        None => Box::new(HandDetector::spawn(&tracker.command, tracker.confidence)?),
    };
    Ok(source)
}
