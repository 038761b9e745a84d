//! Error types.
//!
//! Stepping the simulation cannot fail. What can fail is everything before the
//! first frame: reading and validating configuration, and bringing up the
//! drawing surface.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("drag must lie in (0, 1], got {0}")]
    Drag(f32),

    #[error("lifetime must be positive, got {0}")]
    Lifetime(f32),

    #[error("fade scale must lie in (0, 1], got {0}")]
    Scale(f32),

    #[error("{name} must be a finite non-negative number, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("{name} must be a finite positive number, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("softening_squared must be positive, got {0}")]
    Softening(f32),

    #[error("dimension must be 2 or 3, got {0}")]
    Dimension(u8),

    #[error("{field} expects {expected} components, got {found}")]
    VectorLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("domain must have a finite, positive extent on every axis")]
    EmptyDomain,

    #[error("failed to read scenario {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures that keep the simulation from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("could not open the drawing surface: {0}")]
    Surface(String),
}
