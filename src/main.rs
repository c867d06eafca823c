//! Purrkour entry point
//!
//! Native: a headless runner with the autopilot at the controls, logging
//! progress and optionally printing the final snapshot as JSON.
//! Wasm: installs the console logger and panic hook, then runs a short demo;
//! a real host drives `sim::tick` from its animation callback.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use clap::Parser;
    use purrkour::consts::FRAMES_PER_SECOND;
    use purrkour::sim::{TickInput, Viewport, World, tick};
    use purrkour::{Settings, Tuning};

    /// Run the cat runner headless
    #[derive(Debug, Parser)]
    #[command(name = "purrkour", version, about)]
    struct Args {
        /// Run seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Frames to simulate
        #[arg(long, default_value_t = 60 * 60)]
        frames: u32,
        /// Balance overrides (JSON)
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Player settings (JSON)
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long, default_value_t = 360.0)]
        width: f32,
        #[arg(long, default_value_t = 640.0)]
        height: f32,
        /// Print the final snapshot as JSON
        #[arg(long)]
        snapshot: bool,
    }

    fn read(path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        let args = Args::parse();

        let tuning = match &args.tuning {
            Some(path) => Tuning::from_json_or_default(&read(path)?),
            None => Tuning::default(),
        };
        let settings = match &args.settings {
            Some(path) => Settings::from_json(&read(path)?)
                .with_context(|| format!("parsing settings {}", path.display()))?,
            None => Settings::default(),
        };
        let seed = args.seed.unwrap_or_else(rand::random);
        log::info!("Purrkour (native) starting: seed {seed}, {} frames", args.frames);

        let viewport = Viewport {
            w: args.width,
            h: args.height,
        };
        let mut world = World::new(seed, tuning, settings, viewport);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };

        let report_every = FRAMES_PER_SECOND * 10;
        for frame in 1..=args.frames {
            tick(&mut world, &input);
            if frame % report_every == 0 {
                let s = &world.state;
                log::info!(
                    "{:>4}s  score {:>4}  lives {}  mice {:>3}  {} ({})",
                    frame / FRAMES_PER_SECOND,
                    s.score,
                    s.lives,
                    s.mice,
                    s.theme_label(),
                    s.progression.beat_id.as_str()
                );
            }
            if world.state.finished {
                log::info!("Run finished after {frame} frames");
                break;
            }
        }

        log::info!(
            "Final score {} with {} mice",
            world.state.score,
            world.state.mice
        );
        if args.snapshot {
            println!("{}", serde_json::to_string_pretty(&world.snapshot())?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    use purrkour::sim::{TickInput, Viewport, World, tick};
    use purrkour::{Settings, Tuning};

    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Purrkour (wasm) starting...");

    let mut world = World::new(
        rand::random(),
        Tuning::default(),
        Settings::default(),
        Viewport::default(),
    );
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    for _ in 0..600 {
        tick(&mut world, &input);
    }
    log::info!("Demo score after 10s: {}", world.state.score);
}
