// What you SEE:
// • The photo fills a square box (object-fit: cover), or a gray box until one is loaded.
// • E opens the editor; X picks Erase, R picks Restore, N puts the brush down.
// • Hold Left Mouse to paint; erased areas show a checkerboard.
// • [ and ] change the brush; Backspace resets the mask; Enter is Done (writes --output);
//   Escape closes the editor without keeping the session, or quits when not editing.
// • L reloads the image file from disk; S writes the committed result again.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use minifb::Key;

use photo_mask::compositor::{Compositor, PreviewInput, PreviewStyle};
use photo_mask::config::EditorConfig;
use photo_mask::draw::draw_text_5x7;
use photo_mask::error::{Error, Result};
use photo_mask::gamma::GammaLut;
use photo_mask::input::{EventQueue, InputEvent, PointerTracker};
use photo_mask::output;
use photo_mask::tool::{Action, Effect, ToolController};
use photo_mask::types::{FitMode, FrameBuffer, PaintMode};
use photo_mask::window::Drawer;
use photo_mask::worker::{Reply, Worker};

/// Erase or restore parts of a photo with a round brush.
#[derive(Parser, Debug)]
#[command(name = "photo-mask", version)]
struct Args {
    /// Image to open.
    image: Option<PathBuf>,

    /// Where Done writes the result. Formats without alpha are flattened.
    #[arg(short, long, default_value = "masked.png", value_name = "FILE")]
    output: PathBuf,

    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image fit inside the box: cover, contain, fill or none.
    #[arg(long, value_name = "MODE")]
    fit: Option<FitMode>,

    /// Box width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Box height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    /* --- Configuration ---
       Visual: box size, fit and colors come from here. */
    let mut config = EditorConfig::load(args.config.as_deref())?;
    if let Some(fit) = args.fit { config.fit = fit; }
    if let Some(w) = args.width { config.viewport_width = w.max(1); }
    if let Some(h) = args.height { config.viewport_height = h.max(1); }
    let viewport = config.viewport();

    let worker = Worker::spawn()?;
    let mut controller = ToolController::new(config.brush_size());
    let mut compositor = Compositor::new(PreviewStyle::from_config(&config));
    let lut = GammaLut::new();
    let mut queue = EventQueue::new(config.event_queue_capacity);
    let mut tracker = PointerTracker::new();

    let (w, h) = (config.viewport_width as usize, config.viewport_height as usize);
    let mut drawer = Drawer::new("Photo Mask", w, h)?;
    let mut screen = FrameBuffer::new(w, h, 0);
    let mut status = String::new();

    if let Some(path) = &args.image {
        status = upload(&worker, path, &config);
    }

    let started = Instant::now();
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        let now = Instant::now();

        /* 1) Finished background work (decoded uploads, exported results). */
        while let Some(reply) = worker.poll() {
            status = match reply {
                Reply::Decoded(Ok(image)) => {
                    controller.load_image(image);
                    "LOADED".into()
                }
                Reply::Decoded(Err(err)) => {
                    log::warn!("{err}");
                    "LOAD FAILED".into()
                }
                Reply::Exported(Ok(image)) => {
                    match output::write_result(&image, &args.output, config.background, &lut) {
                        Ok(_) => "SAVED".into(),
                        Err(err) => {
                            log::error!("{err}");
                            "SAVE FAILED - S TO RETRY".into()
                        }
                    }
                }
                Reply::Exported(Err(err)) => {
                    log::error!("{err}");
                    "EXPORT FAILED - S TO RETRY".into()
                }
            };
        }

        /* 2) Keys -> actions. */
        let mut actions = Vec::new();
        if drawer.pressed_once(Key::E) { actions.push(Action::OpenEdit); }
        if drawer.pressed_once(Key::X) { actions.push(Action::SelectTool(PaintMode::Erase)); }
        if drawer.pressed_once(Key::R) { actions.push(Action::SelectTool(PaintMode::Restore)); }
        if drawer.pressed_once(Key::N) { actions.push(Action::ClearTool); }
        if drawer.pressed_repeat(Key::LeftBracket) {
            actions.push(Action::SetBrushSize(controller.brush_size().step(-5).get() as i64));
        }
        if drawer.pressed_repeat(Key::RightBracket) {
            actions.push(Action::SetBrushSize(controller.brush_size().step(5).get() as i64));
        }
        if drawer.pressed_once(Key::Backspace) { actions.push(Action::Reset); }
        if drawer.pressed_once(Key::Enter) { actions.push(Action::Done); }
        if drawer.pressed_once(Key::Escape) {
            if controller.phase().is_editing() {
                actions.push(Action::Close);
            } else {
                break;
            }
        }
        if drawer.pressed_once(Key::L) {
            match &args.image {
                Some(path) => status = upload(&worker, path, &config),
                None => log::warn!("no image path given on the command line"),
            }
        }
        if drawer.pressed_once(Key::S) {
            if let Some(job) = controller.export_job() {
                status = export(&worker, job);
            }
        }

        for action in actions {
            if let Effect::Committed(job) = controller.apply(action) {
                status = export(&worker, job);
            }
        }

        /* 3) Pointer: poll -> events -> brush. Geometry is rebuilt per event. */
        let ms = now.duration_since(started).as_millis() as u64;
        tracker.update(drawer.mouse_pos(), drawer.left_mouse_down(), ms, &mut queue);
        for event in queue.drain() {
            match event {
                InputEvent::Pointer(p) => { controller.pointer(p, &viewport); }
                InputEvent::Leave => controller.pointer_leave(),
            }
        }

        /* 4) Preview: image with mask, checkerboard where erased, brush ring on top. */
        let frame = compositor.render_preview(&PreviewInput {
            source: controller.source().map(|s| s.as_ref()),
            mask: controller.mask(),
            cursor: controller.cursor(),
            tool: controller.tool(),
            brush_size: controller.brush_size(),
            viewport,
        });
        screen.resize(frame.width, frame.height);
        screen.pixels.copy_from_slice(&frame.pixels);

        let hud = format!(
            "{} | {} | SIZE {} | {}",
            controller.phase().label(),
            controller.tool().label(),
            controller.brush_size().get(),
            hud_fps_text
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);
        if !status.is_empty() {
            draw_text_5x7(&mut screen, 8, 20, &status, 0x00_FF_CC_33);
        }

        /* 5) Present. */
        drawer.present(&screen)?;

        /* 6) FPS counter (HUD once per second) */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            hud_fps_text = format!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

/// Read the file and hand it to the worker. Session state only changes once
/// the decode succeeds.
fn upload(worker: &Worker, path: &Path, config: &EditorConfig) -> String {
    let queued = std::fs::read(path)
        .map_err(Error::from)
        .and_then(|bytes| worker.decode(bytes, config.max_decoded_pixels));
    match queued {
        Ok(_) => {
            log::info!("loading {}", path.display());
            "LOADING".into()
        }
        Err(err) => {
            log::warn!("{}: {err}", path.display());
            "LOAD FAILED".into()
        }
    }
}

fn export(worker: &Worker, job: photo_mask::worker::ExportJob) -> String {
    match worker.export(job) {
        Ok(_) => "EXPORTING".into(),
        Err(err) => {
            log::error!("{err}");
            "EXPORT FAILED - S TO RETRY".into()
        }
    }
}
