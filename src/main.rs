// What you SEE:
// • A mascot follows the mouse. Hold Left Mouse to paint a smoothed trail
//   from its brush; hold Right Mouse to make it slow down.
// • R clears, Z undoes, Tab switches painter, 1-9 pick colours,
//   Space pauses, G shows the green-screen boxes, L cycles layouts,
//   P saves a picture. ESC quits.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, info};

use tode_paint::commands::KeyMap;
use tode_paint::draw::Drawer;
use tode_paint::scheduler::Scheduler;
use tode_paint::{Config, Error, Flow, Show};

/// Tode Paint - a pointer-chasing mascot that paints
#[derive(Parser, Debug)]
#[command(name = "tode-paint")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "TODE_PAINT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("tode_paint={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = Config::load(args.config.as_deref())?;
    let ratio = config.window.pixel_ratio;

    /* --- Window + show ---
       Visual: window opens; painters show crosshairs until sprites load. */
    let mut drawer = Drawer::new(
        &config.window.title,
        config.window.width,
        config.window.height,
        config.window.target_fps,
    )?;
    let keys = KeyMap::new(&config.keys);
    let mut show = Show::new(&config);
    show.load_sprites();

    // Ready once the window exists and the first resize is in.
    let mut scheduler = Scheduler::new(config.scheduler.speed, ratio);
    let mut window_size = drawer.size();
    scheduler.resize(window_size.0, window_size.1, &mut show);
    scheduler.start();
    info!(painters = show.painters().len(), "tode-paint running");

    /* --- HUD / FPS --- */
    let started = Instant::now();
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut fps = 0.0;

    /* ------------------------------ Main loop ------------------------------ */
    'frames: while drawer.is_open() {
        /* 1) Discrete commands, applied between steps. */
        for command in keys.dispatch(&drawer.keys_pressed()) {
            if show.apply(command, &mut scheduler) == Flow::Quit {
                break 'frames;
            }
        }

        /* 2) Resize: surface follows the window, time keeps running. */
        let size = drawer.size();
        if size != window_size {
            window_size = size;
            scheduler.resize(size.0, size.1, &mut show);
        }

        /* 3) Sprites that finished decoding since last frame. */
        show.poll_sprites();

        /* 4) Pointer in surface pixels, then the logical steps for this frame. */
        let mut input = drawer.pointer_input();
        input.x = input.x.map(|x| x * ratio);
        input.y = input.y.map(|y| y * ratio);
        show.set_input(input);
        show.set_time(started.elapsed().as_secs_f32());
        scheduler.tick(&mut show);

        /* 5) One render after all steps, then present.
           Visual: strokes, painter, overlay, HUD appear together. */
        show.render(scheduler.is_paused(), fps);
        drawer.present(show.frame())?;

        /* 6) FPS counter (log + HUD once per second). */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            fps = frames_this_second as f32 / secs;
            debug!(fps = format!("{fps:.1}"), "frame rate");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    info!(strokes = show.history().len(), "bye");
    Ok(())
}
