pub mod attractor;
pub mod config;
pub mod engine;
pub mod error;
pub mod forces;
pub mod lifetime;
pub mod pool;
pub mod projection;
pub mod random;
pub mod render;
pub mod space;

pub use attractor::{Attractor, DepthWave, Lissajous, Motion, Orbit, Wander};
pub use config::{Preset, SimulationConfig};
pub use engine::{Scene, Simulation, StepReport, run};
pub use error::{ConfigError, StartupError};
pub use forces::{FieldAttraction, Integrator, Propulsion, SelfPropelled};
pub use lifetime::{Fade, Palette, Rgba};
pub use pool::{Particle, ParticlePool};
pub use projection::{Projection, ScreenPoint};
pub use render::{
    Clock, CountingSurface, FixedStepClock, FrameSnapshot, Shape, Sprite, Surface, SystemClock,
};
pub use space::{Bounds, Space};
