//! The simulation state and its per-frame step.
//!
//! A [`Simulation`] owns every attractor, every particle stream and the random
//! source. [`Simulation::advance`] runs the fixed frame order:
//!
//! 1. measure elapsed time since the previous frame
//! 2. move the attractors
//! 3. spawn into each stream
//! 4. integrate every particle
//!
//! after which [`Simulation::snapshot`] computes alpha, color and screen
//! placement for the renderer.

use cgmath::prelude::*;
use cgmath::{Vector2, Vector3};
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::attractor::{Attractor, DepthWave, Lissajous, Motion, Orbit, Wander};
use crate::config::{
    AttractorConfig, ModelConfig, SimulationConfig, SpawnConfig, SpawnRate, StreamLayout,
    VelocitySeed,
};
use crate::error::ConfigError;
use crate::forces::{FieldAttraction, Integrator, Propulsion, SelfPropelled};
use crate::lifetime::{Fade, Palette, Rgba};
use crate::pool::{Particle, ParticlePool};
use crate::projection::Projection;
use crate::random::{jitter, seeded};
use crate::render::{Clock, FrameSnapshot, Sprite, Surface};
use crate::space::{Bounds, Space};

/// What one frame did, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Seconds the integrator advanced, after clamping.
    pub dt: f32,
    pub spawned: usize,
}

pub struct Simulation<V: Space> {
    attractors: Vec<Attractor<V>>,
    streams: Vec<ParticlePool<V>>,
    layout: StreamLayout,
    integrator: Integrator<V>,
    fade: Fade,
    palette: Palette,
    spawn: SpawnConfig,
    bounds: Bounds<V>,
    projection: Projection,
    particle_size: f32,
    marker_radius: f32,
    background: Rgba,
    max_elapsed: f32,
    rng: StdRng,
    now: f32,
    last: Option<f32>,
    spawn_debt: f32,
    frames: u64,
}

fn vector<V: Space>(field: &'static str, values: &[f32]) -> Result<V, ConfigError> {
    V::from_slice(values).ok_or(ConfigError::VectorLength {
        field,
        expected: V::DIMENSION,
        found: values.len(),
    })
}

fn build_attractor<V: Space>(
    config: &AttractorConfig,
    bounds: Bounds<V>,
) -> Result<Attractor<V>, ConfigError> {
    let attractor = match config {
        AttractorConfig::Orbit {
            center,
            radius,
            angular_speed,
            phase,
            depth,
        } => {
            let orbit = Orbit {
                center: *center,
                radius: *radius,
                angular_speed: *angular_speed,
                phase: *phase,
                depth: depth.map(|d| DepthWave {
                    amplitude: d.amplitude,
                    base: d.base,
                }),
            };
            Attractor::new(Motion::Orbit(orbit), V::zero())
        }
        AttractorConfig::Lissajous {
            center,
            amplitude,
            frequency,
            depth,
        } => {
            let path = Lissajous {
                center: *center,
                amplitude: *amplitude,
                frequency: *frequency,
                depth: *depth,
            };
            Attractor::new(Motion::Lissajous(path), V::zero())
        }
        AttractorConfig::Wander {
            start,
            acceleration,
            max_speed,
            turn_chance,
            max_turn,
            reverse_chance,
        } => {
            let wander = Wander {
                acceleration: *acceleration,
                max_speed: *max_speed,
                turn_chance: *turn_chance,
                max_turn: *max_turn,
                reverse_chance: *reverse_chance,
                bounds,
            };
            Attractor::new(Motion::Wander(wander), vector("attractors.start", start)?)
        }
    };
    Ok(attractor)
}

impl<V: Space> Simulation<V> {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if usize::from(config.dimension) != V::DIMENSION {
            return Err(ConfigError::Dimension(config.dimension));
        }
        for warning in config.warnings() {
            warn!("{warning}");
        }

        let bounds = Bounds::new(
            vector("domain.min", &config.domain.min)?,
            vector("domain.max", &config.domain.max)?,
        );
        let attractors = config
            .attractors
            .iter()
            .map(|a| build_attractor(a, bounds))
            .collect::<Result<Vec<_>, _>>()?;

        let model: Box<dyn Propulsion<V>> = match config.integrator.model {
            ModelConfig::Field {
                gravity_constant,
                softening_squared,
            } => Box::new(FieldAttraction {
                gravity_constant,
                softening_squared,
            }),
            ModelConfig::Wander {
                perturbation,
                max_speed,
            } => Box::new(SelfPropelled {
                perturbation,
                max_speed,
                bounds,
            }),
        };

        let stream_count = match config.pool.streams {
            StreamLayout::PerAttractor => attractors.len().max(1),
            StreamLayout::Shared => 1,
        };
        let streams = (0..stream_count)
            .map(|_| ParticlePool::new(config.pool.capacity))
            .collect();

        let [r, g, b] = config.render.background;
        info!(
            dimension = V::DIMENSION,
            attractors = attractors.len(),
            streams = stream_count,
            capacity = config.pool.capacity,
            seed = config.seed,
            "simulation ready"
        );

        Ok(Self {
            attractors,
            streams,
            layout: config.pool.streams,
            integrator: Integrator::from_boxed(config.integrator.drag, model),
            fade: Fade {
                lifetime: config.fade.lifetime,
                scale: config.fade.scale,
            },
            palette: Palette {
                rate: config.palette.rate,
                stream_offset: config.palette.stream_offset,
            },
            spawn: config.spawn,
            bounds,
            projection: Projection {
                width: config.window.width,
                height: config.window.height,
                min_depth: config.render.min_depth,
            },
            particle_size: config.render.particle_size,
            marker_radius: config.render.marker_radius,
            background: Rgba::rgb(r, g, b),
            max_elapsed: config.integrator.max_elapsed,
            rng: seeded(config.seed),
            now: 0.0,
            last: None,
            spawn_debt: 0.0,
            frames: 0,
        })
    }

    pub fn attractors(&self) -> &[Attractor<V>] {
        &self.attractors
    }

    pub fn streams(&self) -> &[ParticlePool<V>] {
        &self.streams
    }

    pub fn bounds(&self) -> Bounds<V> {
        self.bounds
    }

    /// Clock reading of the latest frame.
    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Occupied slots across all streams.
    pub fn live(&self) -> usize {
        self.streams.iter().map(ParticlePool::len).sum()
    }

    /// Particles whose alpha is still positive.
    pub fn visible(&self) -> usize {
        self.streams
            .iter()
            .flat_map(|pool| pool.iter())
            .filter(|p| self.fade.is_visible(*p, self.now))
            .count()
    }

    /// Runs one frame at clock reading `now`. The first frame, and any frame
    /// whose clock has not moved forward, only records the reading.
    pub fn advance(&mut self, now: f32) -> StepReport {
        self.frames += 1;
        let elapsed = self.last.map_or(0.0, |last| now - last);
        if !(elapsed > 0.0) {
            if self.last.is_none() {
                self.last = Some(now);
                self.now = now;
            } else {
                debug!(elapsed, "clock did not advance, skipping step");
            }
            return StepReport::default();
        }
        self.last = Some(now);
        self.now = now;

        let dt = if elapsed > self.max_elapsed {
            debug!(elapsed, max = self.max_elapsed, "clamping long frame");
            self.max_elapsed
        } else {
            elapsed
        };

        for attractor in &mut self.attractors {
            attractor.update(now, dt, &mut self.rng);
        }

        let spawned = self.spawn_all(dt);

        let fields: Vec<V> = self.attractors.iter().map(|a| a.position).collect();
        for pool in &mut self.streams {
            self.integrator.step(pool, &fields, dt, &mut self.rng);
        }

        StepReport { dt, spawned }
    }

    fn spawns_per_source(&mut self, dt: f32) -> usize {
        match self.spawn.rate {
            SpawnRate::PerFrame { burst } => burst as usize,
            SpawnRate::PerSecond { rate } => {
                self.spawn_debt += rate * dt;
                let whole = self.spawn_debt.floor();
                self.spawn_debt -= whole;
                whole as usize
            }
        }
    }

    // (stream, origin, source velocity) for every spawn source this frame.
    fn sources(&self) -> Vec<(usize, V, V)> {
        if self.attractors.is_empty() {
            return vec![(0, self.bounds.center(), V::zero())];
        }
        self.attractors
            .iter()
            .enumerate()
            .map(|(i, a)| (self.stream_of(i), a.position, a.velocity))
            .collect()
    }

    fn stream_of(&self, attractor: usize) -> usize {
        match self.layout {
            StreamLayout::PerAttractor => attractor,
            StreamLayout::Shared => 0,
        }
    }

    fn spawn_all(&mut self, dt: f32) -> usize {
        let count = self.spawns_per_source(dt);
        if count == 0 {
            return 0;
        }
        let mut spawned = 0;
        for (stream, origin, source_velocity) in self.sources() {
            for _ in 0..count {
                let particle = self.seed_particle(origin, source_velocity);
                self.streams[stream].spawn(particle);
                spawned += 1;
            }
        }
        spawned
    }

    fn seed_particle(&mut self, origin: V, source_velocity: V) -> Particle<V> {
        let offset: V = jitter(&mut self.rng, self.spawn.jitter_radius);
        let velocity = match self.spawn.velocity {
            VelocitySeed::Still => V::zero(),
            VelocitySeed::Random { speed } => jitter(&mut self.rng, speed),
            VelocitySeed::Inherit { factor, spread } => {
                let spread: V = jitter(&mut self.rng, spread);
                source_velocity * factor + spread
            }
        };
        Particle {
            position: origin + offset,
            velocity,
            birth_time: self.now,
        }
    }

    pub fn stream_color(&self, stream: usize) -> Rgba {
        self.palette.color(self.now, stream)
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let now = self.now;
        let mut particles = Vec::new();
        for (i, pool) in self.streams.iter().enumerate() {
            let color = self.stream_color(i);
            let sprites: Vec<Sprite> = pool
                .par_oldest_first()
                .filter_map(|p| {
                    let alpha = self.fade.alpha(p, now);
                    (alpha > 0.0).then(|| {
                        let at = p.position.to_screen(&self.projection, self.particle_size);
                        Sprite {
                            x: at.x,
                            y: at.y,
                            size: at.size,
                            color: color.with_alpha(alpha),
                        }
                    })
                })
                .collect();
            particles.extend(sprites);
        }

        let markers = if self.marker_radius > 0.0 {
            self.attractors
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    let at = a.position.to_screen(&self.projection, self.marker_radius);
                    Sprite {
                        x: at.x,
                        y: at.y,
                        size: at.size,
                        color: self.stream_color(self.stream_of(i)),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        FrameSnapshot {
            background: self.background,
            particles,
            markers,
        }
    }
}

/// A simulation of either dimension, chosen by `dimension` in the config.
pub enum Scene {
    Planar(Simulation<Vector2<f32>>),
    Projected(Simulation<Vector3<f32>>),
}

impl Scene {
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        match config.dimension {
            2 => Ok(Scene::Planar(Simulation::from_config(config)?)),
            3 => Ok(Scene::Projected(Simulation::from_config(config)?)),
            other => Err(ConfigError::Dimension(other)),
        }
    }

    pub fn advance(&mut self, now: f64) -> StepReport {
        match self {
            Scene::Planar(sim) => sim.advance(now as f32),
            Scene::Projected(sim) => sim.advance(now as f32),
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        match self {
            Scene::Planar(sim) => sim.snapshot(),
            Scene::Projected(sim) => sim.snapshot(),
        }
    }

    pub fn live(&self) -> usize {
        match self {
            Scene::Planar(sim) => sim.live(),
            Scene::Projected(sim) => sim.live(),
        }
    }

    pub fn visible(&self) -> usize {
        match self {
            Scene::Planar(sim) => sim.visible(),
            Scene::Projected(sim) => sim.visible(),
        }
    }

    pub fn frames(&self) -> u64 {
        match self {
            Scene::Planar(sim) => sim.frames(),
            Scene::Projected(sim) => sim.frames(),
        }
    }

    pub fn attractor_count(&self) -> usize {
        match self {
            Scene::Planar(sim) => sim.attractors().len(),
            Scene::Projected(sim) => sim.attractors().len(),
        }
    }
}

/// Drives `scene` until `quit` reports true, checking once after each frame.
/// Returns the number of frames drawn.
pub fn run<C, S, Q>(scene: &mut Scene, clock: &mut C, surface: &mut S, mut quit: Q) -> u64
where
    C: Clock,
    S: Surface,
    Q: FnMut() -> bool,
{
    let mut drawn = 0;
    loop {
        scene.advance(clock.now_seconds());
        scene.snapshot().draw(surface);
        drawn += 1;
        if quit() {
            return drawn;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, Preset};
    use crate::render::{CountingSurface, FixedStepClock};

    fn planar(config: &SimulationConfig) -> Simulation<Vector2<f32>> {
        Simulation::from_config(config).unwrap()
    }

    #[test]
    fn first_frame_only_records_clock() {
        let mut sim = planar(&SimulationConfig::preset(Preset::Magnets));
        let report = sim.advance(3.0);
        assert_eq!(report, StepReport::default());
        assert_eq!(sim.live(), 0);
        assert_eq!(sim.now(), 3.0);
    }

    #[test]
    fn per_attractor_layout_spawns_burst_into_each_stream() {
        let mut sim = planar(&SimulationConfig::preset(Preset::Magnets));
        sim.advance(0.0);
        let report = sim.advance(1.0 / 60.0);
        assert_eq!(sim.streams().len(), 3);
        assert_eq!(report.spawned, 9);
        assert!(sim.streams().iter().all(|s| s.len() == 3));
    }

    #[test]
    fn backwards_clock_is_a_no_op() {
        let mut sim = planar(&SimulationConfig::preset(Preset::Flurry));
        sim.advance(0.0);
        sim.advance(0.5);
        let before: Vec<_> = sim.streams()[0].iter().copied().collect();
        assert_eq!(sim.advance(0.4), StepReport::default());
        assert_eq!(sim.advance(0.5), StepReport::default());
        let after: Vec<_> = sim.streams()[0].iter().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut sim = planar(&SimulationConfig::preset(Preset::Swarm));
        sim.advance(0.0);
        assert_eq!(sim.advance(5.0).dt, 0.1);
    }

    #[test]
    fn per_second_rate_carries_fractions() {
        let mut config = SimulationConfig::preset(Preset::Swarm);
        config.spawn.rate = SpawnRate::PerSecond { rate: 90.0 };
        let mut sim = planar(&config);
        sim.advance(0.0);
        let total: usize = (1..=60).map(|i| sim.advance(i as f32 / 60.0).spawned).sum();
        assert!((89..=90).contains(&total), "spawned {}", total);
    }

    #[test]
    fn attractor_free_streams_spawn_at_domain_center() {
        let mut config = SimulationConfig::preset(Preset::Swarm);
        config.spawn.jitter_radius = 0.0;
        config.spawn.velocity = VelocitySeed::Still;
        let mut sim = planar(&config);
        sim.advance(0.0);
        sim.advance(1e-6);
        let p = sim.streams()[0].get(0).unwrap();
        assert!((p.position - sim.bounds().center()).magnitude() < 1e-2);
    }

    #[test]
    fn snapshot_skips_retired_particles() {
        let mut config = SimulationConfig::preset(Preset::Flurry);
        config.fade.lifetime = 0.5;
        config.pool = PoolConfig {
            capacity: 1000,
            streams: StreamLayout::Shared,
        };
        let mut sim = planar(&config);
        sim.advance(0.0);
        sim.advance(0.05);
        for i in 1..=10 {
            sim.advance(0.05 + i as f32 * 0.1);
        }
        let frame = sim.snapshot();
        assert_eq!(frame.particles.len(), sim.visible());
        assert!(sim.visible() < sim.live());
        assert!(
            frame
                .particles
                .iter()
                .all(|s| s.color.alpha() > 0.0 && s.color.alpha() <= 0.45)
        );
        assert_eq!(frame.markers.len(), 1);
    }

    #[test]
    fn inherit_seed_scales_attractor_velocity() {
        let mut config = SimulationConfig::preset(Preset::Magnets);
        config.spawn.jitter_radius = 0.0;
        config.spawn.velocity = VelocitySeed::Inherit {
            factor: 0.25,
            spread: 0.0,
        };
        let mut sim = planar(&config);
        sim.advance(0.0);
        sim.advance(0.5);

        let source = sim.attractors()[0];
        assert!(source.velocity.magnitude() > 1.0);
        let p = sim.seed_particle(source.position, source.velocity);
        assert!((p.velocity - source.velocity * 0.25).magnitude() < 1e-4);
        assert_eq!(p.position, source.position);
        assert_eq!(p.birth_time, 0.5);
    }

    #[test]
    fn huge_jitter_radius_spawns_without_panicking() {
        let mut config = SimulationConfig::preset(Preset::Swarm);
        config.spawn.jitter_radius = 3.0e38;
        let mut sim = planar(&config);
        sim.advance(0.0);
        let report = sim.advance(1.0 / 60.0);
        assert_eq!(report.spawned, 5);
        assert!(sim.streams()[0].iter().all(|p| p.position.x.is_finite()));
    }

    #[test]
    fn dimension_must_match() {
        let config = SimulationConfig::preset(Preset::Magnets3d);
        assert!(matches!(
            Simulation::<Vector2<f32>>::from_config(&config),
            Err(ConfigError::Dimension(3))
        ));
        assert!(matches!(Scene::from_config(&config), Ok(Scene::Projected(_))));
    }

    #[test]
    fn run_draws_until_quit() {
        let mut scene = Scene::from_config(&SimulationConfig::preset(Preset::Magnets3d)).unwrap();
        let mut clock = FixedStepClock::at_rate(60.0);
        let mut surface = CountingSurface::default();
        let mut remaining = 30;
        let frames = run(&mut scene, &mut clock, &mut surface, || {
            remaining -= 1;
            remaining == 0
        });
        assert_eq!(frames, 30);
        assert_eq!(surface.clears, 30);
        assert_eq!(surface.presents, 30);
        assert_eq!(scene.frames(), 30);
        assert!(surface.draws > 0);
    }
}
