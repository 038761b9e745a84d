use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flurry::{CountingSurface, FixedStepClock, Preset, Scene, SimulationConfig, StartupError, run};

/// Runs a scenario without a window at a fixed virtual frame rate.
#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Preset::Flurry)]
    preset: Preset,

    #[arg(short, long)]
    file: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Frames to simulate
    #[arg(short = 'n', long, default_value_t = 600)]
    frames: u64,

    /// Virtual frames per second
    #[arg(long, default_value_t = 60.0, value_parser = positive_rate)]
    fps: f64,

    /// Print the resolved scenario as YAML and exit
    #[arg(long)]
    dump: bool,
}

fn positive_rate(text: &str) -> Result<f64, String> {
    let rate: f64 = text.parse().map_err(|err| format!("{err}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("frame rate must be a positive number, got {rate}"))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config =
        SimulationConfig::load(args.file.as_deref(), args.preset).map_err(StartupError::from)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if args.dump {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let mut scene = Scene::from_config(&config).map_err(StartupError::from)?;
    let mut clock = FixedStepClock::at_rate(args.fps);
    let mut surface = CountingSurface::default();

    let target = args.frames.max(1);
    let mut remaining = target;
    let started = Instant::now();
    let drawn = run(&mut scene, &mut clock, &mut surface, || {
        remaining -= 1;
        remaining == 0
    });
    let wall = started.elapsed();

    info!(
        frames = drawn,
        live = scene.live(),
        visible = scene.visible(),
        draws = surface.draws,
        wall_ms = wall.as_secs_f64() * 1000.0,
        per_frame_us = wall.as_secs_f64() * 1e6 / drawn as f64,
        "run finished"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_must_be_positive() {
        for bad in ["0", "-30", "inf", "NaN", "fast"] {
            assert!(Args::try_parse_from(["particles", "--fps", bad]).is_err(), "{bad}");
        }
        let args = Args::try_parse_from(["particles", "--fps", "120"]).unwrap();
        assert_eq!(args.fps, 120.0);
    }
}
