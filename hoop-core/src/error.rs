//! Error types for simulation setup and stepping.

use std::fmt;
use thiserror::Error;

/// Kind of arena entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Particle,
    Spring,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Particle => write!(f, "particle"),
            EntityKind::Spring => write!(f, "spring"),
        }
    }
}

/// Errors that can occur while building or stepping a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A particle or spring was stepped before its setter assigned it parameters.
    #[error("{kind} {index} used before it was initialized")]
    Uninitialized { kind: EntityKind, index: usize },

    /// Index past the end of a fixed-size arena.
    #[error("{kind} index {index} out of bounds (count: {count})")]
    OutOfBounds {
        kind: EntityKind,
        index: usize,
        count: usize,
    },

    /// Mass must be positive and finite.
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f64),

    /// Spring coefficients and rest length must be non-negative.
    #[error("invalid spring parameters: ks={ks}, kd={kd}, rest_length={rest_length}")]
    InvalidSpring { ks: f64, kd: f64, rest_length: f64 },

    /// Hoop net lattice is too small to form a closed ring.
    #[error("hoop net needs at least 2 rows and 3 segments, got {rows}x{segments}")]
    InvalidNet { rows: usize, segments: usize },

    /// Named config file, skeleton arc or node does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A configuration value would make stepping ill-defined.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown input: {0}")]
    UnknownInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for simulation operations.
pub type SimResult<T> = std::result::Result<T, SimError>;
