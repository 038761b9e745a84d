//! Scenario configuration loaded from YAML.
//!
//! A scenario names every constant the engine recognizes. Vectors are plain
//! lists so one file format serves both 2D and 3D runs; their length is
//! checked against `dimension` when the simulation is built.
//!
//! ```yaml
//! dimension: 2
//! seed: 7
//! window: { width: 640, height: 480 }
//! pool: { capacity: 800, streams: shared }
//! spawn:
//!   rate: { mode: per_frame, burst: 4 }
//!   jitter_radius: 8.0
//!   velocity: { kind: random, speed: 60.0 }
//! integrator:
//!   drag: 0.99
//!   max_elapsed: 0.1
//!   model: { kind: field, gravity_constant: 500000.0, softening_squared: 2500.0 }
//! fade: { lifetime: 5.0, scale: 0.45 }
//! domain: { min: [0, 0], max: [640, 480] }
//! attractors:
//!   - kind: lissajous
//!     center: [320, 240]
//!     amplitude: [200, 150]
//!     frequency: [1.0, 0.8]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::projection::Projection;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// 2 for planar runs, 3 for the projected pseudo-3D variant.
    #[serde(default = "default_dimension")]
    pub dimension: u8,
    #[serde(default)]
    pub seed: u64,
    pub window: WindowConfig,
    pub pool: PoolConfig,
    pub spawn: SpawnConfig,
    pub integrator: IntegratorConfig,
    pub fade: FadeConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    pub domain: DomainConfig,
    #[serde(default)]
    pub attractors: Vec<AttractorConfig>,
    #[serde(default)]
    pub render: RenderConfig,
}

fn default_dimension() -> u8 {
    2
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamLayout {
    /// One pool per attractor, fed from that attractor.
    PerAttractor,
    /// A single pool fed from every attractor in turn.
    Shared,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PoolConfig {
    pub capacity: usize,
    pub streams: StreamLayout,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SpawnRate {
    /// `burst` spawns per source every frame. Faster frame rates spawn more
    /// particles per second.
    PerFrame { burst: u32 },
    /// `rate` spawns per source per second of simulated time.
    PerSecond { rate: f32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VelocitySeed {
    Still,
    /// Each component uniform in `[-speed, speed)`.
    Random { speed: f32 },
    /// Source attractor velocity times `factor`, plus jitter of `spread`.
    Inherit { factor: f32, spread: f32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpawnConfig {
    pub rate: SpawnRate,
    pub jitter_radius: f32,
    pub velocity: VelocitySeed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    Field {
        gravity_constant: f32,
        softening_squared: f32,
    },
    Wander {
        perturbation: f32,
        max_speed: f32,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    /// Per-frame velocity retention.
    pub drag: f32,
    /// Longest frame the integrator will take, in seconds.
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed: f32,
    pub model: ModelConfig,
}

fn default_max_elapsed() -> f32 {
    0.1
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FadeConfig {
    pub lifetime: f32,
    pub scale: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PaletteConfig {
    pub rate: f32,
    pub stream_offset: f32,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            stream_offset: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DomainConfig {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DepthConfig {
    pub amplitude: f32,
    pub base: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttractorConfig {
    Orbit {
        center: [f32; 2],
        radius: f32,
        angular_speed: f32,
        #[serde(default)]
        phase: f32,
        #[serde(default)]
        depth: Option<DepthConfig>,
    },
    Lissajous {
        center: [f32; 2],
        amplitude: [f32; 2],
        frequency: [f32; 2],
        #[serde(default)]
        depth: f32,
    },
    Wander {
        start: Vec<f32>,
        acceleration: f32,
        max_speed: f32,
        turn_chance: u32,
        max_turn: f32,
        reverse_chance: u32,
    },
}

impl AttractorConfig {
    fn validate(&self, dim: usize) -> Result<(), ConfigError> {
        match self {
            AttractorConfig::Orbit {
                center,
                radius,
                angular_speed,
                phase,
                depth,
            } => {
                finite("attractors.center", center)?;
                finite("attractors.radius", &[*radius])?;
                finite("attractors.angular_speed", &[*angular_speed])?;
                finite("attractors.phase", &[*phase])?;
                if let Some(wave) = depth {
                    finite("attractors.depth", &[wave.amplitude, wave.base])?;
                }
            }
            AttractorConfig::Lissajous {
                center,
                amplitude,
                frequency,
                depth,
            } => {
                finite("attractors.center", center)?;
                finite("attractors.amplitude", amplitude)?;
                finite("attractors.frequency", frequency)?;
                finite("attractors.depth", &[*depth])?;
            }
            AttractorConfig::Wander {
                start,
                acceleration,
                max_speed,
                max_turn,
                ..
            } => {
                expect_len("attractors.start", start, dim)?;
                finite("attractors.start", start)?;
                non_negative("acceleration", *acceleration)?;
                non_negative("max_speed", *max_speed)?;
                non_negative("max_turn", *max_turn)?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Particle size in pixels (2D) or the size constant divided by depth (3D).
    pub particle_size: f32,
    /// Radius of the disc drawn at each attractor; 0 hides them.
    pub marker_radius: f32,
    pub background: [f32; 3],
    pub min_depth: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            particle_size: 2.0,
            marker_radius: 0.0,
            background: [0.0, 0.0, 0.0],
            min_depth: Projection::DEFAULT_MIN_DEPTH,
        }
    }
}

pub fn resolve_scenario(path: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }
    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(path);
    if bundled.extension().is_none() {
        bundled.with_extension("yaml")
    } else {
        bundled
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn finite(name: &'static str, values: &[f32]) -> Result<(), ConfigError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(ConfigError::NotFinite { name, value }),
        None => Ok(()),
    }
}

fn expect_len(field: &'static str, values: &[f32], expected: usize) -> Result<(), ConfigError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ConfigError::VectorLength {
            field,
            expected,
            found: values.len(),
        })
    }
}

impl SimulationConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Reads `file` when given, otherwise builds `preset`. A file that does not
    /// exist as given is looked up under the crate's `scenarios/` directory.
    pub fn load(file: Option<&Path>, preset: Preset) -> Result<Self, ConfigError> {
        match file {
            Some(path) => Self::from_path(&resolve_scenario(path)),
            None => Ok(Self::preset(preset)),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dim = usize::from(self.dimension);
        if !(2..=3).contains(&dim) {
            return Err(ConfigError::Dimension(self.dimension));
        }
        if self.pool.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        positive("window.width", self.window.width)?;
        positive("window.height", self.window.height)?;

        let drag = self.integrator.drag;
        if !(drag > 0.0 && drag <= 1.0) {
            return Err(ConfigError::Drag(drag));
        }
        positive("max_elapsed", self.integrator.max_elapsed)?;
        match self.integrator.model {
            ModelConfig::Field {
                gravity_constant,
                softening_squared,
            } => {
                if !(softening_squared > 0.0 && softening_squared.is_finite()) {
                    return Err(ConfigError::Softening(softening_squared));
                }
                finite("gravity_constant", &[gravity_constant])?;
            }
            ModelConfig::Wander {
                perturbation,
                max_speed,
            } => {
                non_negative("perturbation", perturbation)?;
                non_negative("max_speed", max_speed)?;
            }
        }

        if !(self.fade.lifetime > 0.0 && self.fade.lifetime.is_finite()) {
            return Err(ConfigError::Lifetime(self.fade.lifetime));
        }
        if !(self.fade.scale > 0.0 && self.fade.scale <= 1.0) {
            return Err(ConfigError::Scale(self.fade.scale));
        }
        finite("palette.rate", &[self.palette.rate])?;
        finite("palette.stream_offset", &[self.palette.stream_offset])?;

        non_negative("jitter_radius", self.spawn.jitter_radius)?;
        match self.spawn.rate {
            SpawnRate::PerFrame { .. } => {}
            SpawnRate::PerSecond { rate } => non_negative("rate", rate)?,
        }
        match self.spawn.velocity {
            VelocitySeed::Still => {}
            VelocitySeed::Random { speed } => non_negative("speed", speed)?,
            VelocitySeed::Inherit { factor, spread } => {
                finite("factor", &[factor])?;
                non_negative("spread", spread)?;
            }
        }

        expect_len("domain.min", &self.domain.min, dim)?;
        expect_len("domain.max", &self.domain.max, dim)?;
        finite("domain.min", &self.domain.min)?;
        finite("domain.max", &self.domain.max)?;
        if !self.domain.min.iter().zip(&self.domain.max).all(|(lo, hi)| lo < hi) {
            return Err(ConfigError::EmptyDomain);
        }

        for attractor in &self.attractors {
            attractor.validate(dim)?;
        }

        non_negative("particle_size", self.render.particle_size)?;
        non_negative("marker_radius", self.render.marker_radius)?;
        finite("background", &self.render.background)?;
        positive("min_depth", self.render.min_depth)?;
        Ok(())
    }

    /// Settings that validate but make the scene degenerate, as log-ready
    /// messages.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let sources = self.attractors.len().max(1);
        let per_stream = match self.pool.streams {
            StreamLayout::PerAttractor => 1,
            StreamLayout::Shared => sources,
        };
        match self.spawn.rate {
            SpawnRate::PerFrame { burst: 0 } => {
                warnings.push("spawn burst is 0, no particles will appear".to_string());
            }
            SpawnRate::PerSecond { rate } if rate == 0.0 => {
                warnings.push("spawn rate is 0, no particles will appear".to_string());
            }
            SpawnRate::PerFrame { burst } => {
                let per_frame = burst as usize * per_stream;
                if per_frame > self.pool.capacity {
                    warnings.push(format!(
                        "{per_frame} spawns per frame exceed capacity {}, \
                         some are overwritten before they move",
                        self.pool.capacity
                    ));
                }
            }
            SpawnRate::PerSecond { .. } => {}
        }
        let near = self.domain.min.get(2).copied();
        if self.dimension == 3 && near.is_some_and(|z| z < self.render.min_depth) {
            warnings.push(format!(
                "domain reaches in front of min_depth {}, nearer particles are drawn at that depth",
                self.render.min_depth
            ));
        }
        warnings
    }

    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Flurry => flurry(),
            Preset::Magnets => magnets(),
            Preset::Magnets3d => magnets_3d(),
            Preset::Trails => trails(),
            Preset::Swarm => swarm(),
        }
    }
}

/// Built-in scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// One center tracing a Lissajous path, pulling a shared stream.
    Flurry,
    /// Three orbiting magnets, each with its own stream.
    Magnets,
    /// Orbiting magnets with a depth wave, drawn through a perspective divide.
    Magnets3d,
    /// A wandering center shedding drifting particles.
    Trails,
    /// Self-propelled random walkers with no attractors.
    Swarm,
}

fn window_domain(width: f32, height: f32) -> DomainConfig {
    DomainConfig {
        min: vec![0.0, 0.0],
        max: vec![width, height],
    }
}

fn flurry() -> SimulationConfig {
    let (width, height) = (640.0, 480.0);
    SimulationConfig {
        dimension: 2,
        seed: 7,
        window: WindowConfig { width, height },
        pool: PoolConfig {
            capacity: 800,
            streams: StreamLayout::Shared,
        },
        spawn: SpawnConfig {
            rate: SpawnRate::PerFrame { burst: 4 },
            jitter_radius: 8.0,
            velocity: VelocitySeed::Random { speed: 60.0 },
        },
        integrator: IntegratorConfig {
            drag: 0.99,
            max_elapsed: default_max_elapsed(),
            model: ModelConfig::Field {
                gravity_constant: 500_000.0,
                softening_squared: 2500.0,
            },
        },
        fade: FadeConfig {
            lifetime: 5.0,
            scale: 0.45,
        },
        palette: PaletteConfig::default(),
        domain: window_domain(width, height),
        attractors: vec![AttractorConfig::Lissajous {
            center: [width / 2.0, height / 2.0],
            amplitude: [200.0, 150.0],
            frequency: [1.0, 0.8],
            depth: 0.0,
        }],
        render: RenderConfig {
            marker_radius: 6.0,
            ..RenderConfig::default()
        },
    }
}

fn magnets() -> SimulationConfig {
    let (width, height) = (800.0, 600.0);
    let center = [width / 2.0, height / 2.0];
    let orbit = |radius: f32, angular_speed: f32, phase: f32| AttractorConfig::Orbit {
        center,
        radius,
        angular_speed,
        phase,
        depth: None,
    };
    SimulationConfig {
        dimension: 2,
        seed: 11,
        window: WindowConfig { width, height },
        pool: PoolConfig {
            capacity: 400,
            streams: StreamLayout::PerAttractor,
        },
        spawn: SpawnConfig {
            rate: SpawnRate::PerFrame { burst: 3 },
            jitter_radius: 5.0,
            velocity: VelocitySeed::Inherit {
                factor: 0.25,
                spread: 30.0,
            },
        },
        integrator: IntegratorConfig {
            drag: 0.99,
            max_elapsed: default_max_elapsed(),
            model: ModelConfig::Field {
                gravity_constant: 400_000.0,
                softening_squared: 2500.0,
            },
        },
        fade: FadeConfig {
            lifetime: 4.0,
            scale: 0.4,
        },
        palette: PaletteConfig {
            rate: 0.7,
            stream_offset: std::f32::consts::TAU / 3.0,
        },
        domain: window_domain(width, height),
        attractors: vec![orbit(120.0, 0.7, 0.0), orbit(200.0, -0.5, 2.1), orbit(60.0, 1.3, 4.2)],
        render: RenderConfig {
            marker_radius: 4.0,
            ..RenderConfig::default()
        },
    }
}

fn magnets_3d() -> SimulationConfig {
    let orbit = |radius: f32, angular_speed: f32, phase: f32| AttractorConfig::Orbit {
        center: [0.0, 0.0],
        radius,
        angular_speed,
        phase,
        depth: Some(DepthConfig {
            amplitude: 1.5,
            base: 4.0,
        }),
    };
    SimulationConfig {
        dimension: 3,
        seed: 13,
        window: WindowConfig {
            width: 800.0,
            height: 600.0,
        },
        pool: PoolConfig {
            capacity: 500,
            streams: StreamLayout::PerAttractor,
        },
        spawn: SpawnConfig {
            rate: SpawnRate::PerFrame { burst: 4 },
            jitter_radius: 0.05,
            velocity: VelocitySeed::Inherit {
                factor: 0.3,
                spread: 0.2,
            },
        },
        integrator: IntegratorConfig {
            drag: 0.985,
            max_elapsed: default_max_elapsed(),
            model: ModelConfig::Field {
                gravity_constant: 2.0,
                softening_squared: 0.04,
            },
        },
        fade: FadeConfig {
            lifetime: 4.0,
            scale: 0.5,
        },
        palette: PaletteConfig {
            rate: 0.5,
            stream_offset: 1.0,
        },
        domain: DomainConfig {
            min: vec![-3.0, -3.0, 0.5],
            max: vec![3.0, 3.0, 8.0],
        },
        attractors: vec![orbit(1.2, 0.6, 0.0), orbit(0.8, -0.9, 3.1)],
        render: RenderConfig {
            particle_size: 12.0,
            marker_radius: 0.0,
            ..RenderConfig::default()
        },
    }
}

fn trails() -> SimulationConfig {
    let (width, height) = (800.0, 600.0);
    SimulationConfig {
        dimension: 2,
        seed: 17,
        window: WindowConfig { width, height },
        pool: PoolConfig {
            capacity: 1200,
            streams: StreamLayout::Shared,
        },
        spawn: SpawnConfig {
            rate: SpawnRate::PerSecond { rate: 240.0 },
            jitter_radius: 3.0,
            velocity: VelocitySeed::Inherit {
                factor: -0.2,
                spread: 15.0,
            },
        },
        integrator: IntegratorConfig {
            drag: 0.98,
            max_elapsed: default_max_elapsed(),
            model: ModelConfig::Wander {
                perturbation: 3.0,
                max_speed: 60.0,
            },
        },
        fade: FadeConfig {
            lifetime: 3.0,
            scale: 0.5,
        },
        palette: PaletteConfig::default(),
        domain: window_domain(width, height),
        attractors: vec![AttractorConfig::Wander {
            start: vec![width / 2.0, height / 2.0],
            acceleration: 25.0,
            max_speed: 220.0,
            turn_chance: 20,
            max_turn: 0.6,
            reverse_chance: 600,
        }],
        render: RenderConfig {
            marker_radius: 5.0,
            ..RenderConfig::default()
        },
    }
}

fn swarm() -> SimulationConfig {
    let (width, height) = (800.0, 600.0);
    SimulationConfig {
        dimension: 2,
        seed: 19,
        window: WindowConfig { width, height },
        pool: PoolConfig {
            capacity: 1500,
            streams: StreamLayout::Shared,
        },
        spawn: SpawnConfig {
            rate: SpawnRate::PerFrame { burst: 5 },
            jitter_radius: 20.0,
            velocity: VelocitySeed::Random { speed: 100.0 },
        },
        integrator: IntegratorConfig {
            drag: 0.995,
            max_elapsed: default_max_elapsed(),
            model: ModelConfig::Wander {
                perturbation: 30.0,
                max_speed: 200.0,
            },
        },
        fade: FadeConfig {
            lifetime: 4.0,
            scale: 0.4,
        },
        palette: PaletteConfig {
            rate: 0.3,
            stream_offset: 0.0,
        },
        domain: window_domain(width, height),
        attractors: Vec::new(),
        render: RenderConfig::default(),
    }
}
