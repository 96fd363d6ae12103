//! Driver demo application
//!
//! Opens a window through the desktop driver and switches between windowed
//! and fullscreen on a frame schedule. `F` toggles fullscreen by hand, `V`
//! toggles vsync. Close the window to exit.

use clap::Parser;
use desktop_driver::config::ConfigError;
use desktop_driver::foundation::logging::{self, LoggerConfig};
use desktop_driver::foundation::time::Stopwatch;
use desktop_driver::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// GLFW key codes used by the demo
const KEY_F: i32 = 70;
const KEY_V: i32 = 86;

#[derive(Parser, Debug, Clone)]
#[command(name = "driver_demo")]
#[command(about = "Desktop driver demo", long_about = None)]
struct Cli {
    /// Runtime configuration file (.toml or .ron)
    #[arg(long)]
    config: Option<String>,

    /// Window title
    #[arg(long, default_value = "Desktop Driver Demo")]
    title: String,

    /// Start in fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Switch fullscreen every N frames (0 disables the schedule)
    #[arg(long, default_value_t = 300)]
    toggle_every: u64,

    /// PNG file used as the window icon
    #[arg(long)]
    icon: Option<String>,

    /// Log every frame
    #[arg(long)]
    trace_frames: bool,
}

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load icon: {0}")]
    Icon(#[from] image::ImageError),
}

struct DemoGame {
    driver: Driver,
    toggle_every: u64,
    counters: FrameCounters,
    stopwatch: Stopwatch,
}

/// Frame counts for the fullscreen schedule and the FPS report
#[derive(Debug, Default)]
struct FrameCounters {
    frame: u64,
    since_report: u64,
}

impl FrameCounters {
    /// Count a frame; true when the schedule says to switch
    fn tick(&mut self, toggle_every: u64) -> bool {
        self.frame += 1;
        self.since_report += 1;
        toggle_every > 0 && self.frame % toggle_every == 0
    }

    /// Frames since the last report; the schedule keeps counting
    fn take_report(&mut self) -> u64 {
        std::mem::take(&mut self.since_report)
    }
}

impl DemoGame {
    fn toggle_fullscreen(&self) -> Result<(), UpdateError> {
        let fullscreen = !self.driver.is_fullscreen();
        log::info!("Switching to {}", if fullscreen { "fullscreen" } else { "windowed" });
        self.driver.set_fullscreen(fullscreen)?;
        Ok(())
    }
}

impl GameContext for DemoGame {
    fn layout(&mut self, width: f64, height: f64) {
        log::info!(
            "Layout {}x{} (scale {:.2})",
            width,
            height,
            self.driver.device_scale_factor()
        );
    }

    fn update(&mut self) -> Result<(), UpdateError> {
        if self.counters.tick(self.toggle_every) {
            self.toggle_fullscreen()?;
        }
        if self.stopwatch.elapsed() >= Duration::from_secs(5) {
            let frames = self.counters.take_report();
            let fps = frames as f64 / self.stopwatch.elapsed().as_secs_f64();
            log::info!("{:.1} frames per second", fps);
            self.stopwatch = Stopwatch::start_new();
        }
        Ok(())
    }

    fn handle_input(&mut self, events: &[InputEvent]) {
        for event in events {
            let InputEvent::Key { key, action: ButtonAction::Press, .. } = event else {
                continue;
            };
            let result = match *key {
                KEY_F => self.toggle_fullscreen(),
                KEY_V => {
                    let enabled = !self.driver.is_vsync_enabled();
                    self.driver.set_vsync_enabled(enabled).map_err(UpdateError::from)
                }
                _ => Ok(()),
            };
            if let Err(err) = result {
                log::warn!("Key {} failed: {}", key, err);
            }
        }
    }
}

fn run(cli: Cli) -> Result<(), DemoError> {
    let config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_file(path)?,
        None => RuntimeConfig::new(cli.title.clone()).with_resizable(true),
    }
    .with_fullscreen(cli.fullscreen);

    let mut platform = GlfwPlatform::init()?;
    let driver = DriverBuilder::new(config)
        .graphics(Arc::new(GlPresenter::new()))
        .build(&mut platform)?;

    if let Some(path) = &cli.icon {
        let icon: Arc<dyn IconImage> = Arc::new(image::open(path)?);
        driver.set_icon_images(vec![icon]);
    }

    let (screen_width, screen_height) = driver.screen_size_in_fullscreen();
    log::info!("Primary screen is {}x{} logical pixels", screen_width, screen_height);

    let game = DemoGame {
        driver: driver.clone(),
        toggle_every: cli.toggle_every,
        counters: FrameCounters::default(),
        stopwatch: Stopwatch::start_new(),
    };
    driver.run(platform, game)?;
    log::info!("Window closed");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init_with_config(&LoggerConfig {
        frame_level: if cli.trace_frames {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        },
        ..LoggerConfig::default()
    });

    if let Err(err) = run(cli) {
        log::error!("Demo failed: {}", err);
        std::process::exit(1);
    }
}
