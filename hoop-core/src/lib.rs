//! # Hoop Core
//!
//! Physics engine for an interactive basketball shooting demo.
//!
//! ## Architecture
//!
//! - `types`: Vec3 and physical constants
//! - `linalg`: 4x4 transforms and the Jacobian pseudo-inverse (nalgebra)
//! - `integrator`: Symplectic Euler over explicit point state
//! - `collision`: Court planes and penalty contact
//! - `forces`: Ground penalty for particles, kinetic friction for the ball
//! - `particle`, `spring`, `mass_spring`: Mass-spring-damper engine
//! - `net`: Hoop net lattice built on the mass-spring engine
//! - `ball`: Ball dynamics and trajectory preview
//! - `spline`: Hermite spline for drawing the preview
//! - `skeleton`, `ik`: Articulated figure and its IK solver
//! - `render`: Draw/curve seams to the renderer
//! - `scene`: Fixed-step driver tying it all together
//! - `config`: YAML scene configuration loader

pub mod ball;
pub mod collision;
pub mod config;
pub mod error;
pub mod forces;
pub mod ik;
pub mod integrator;
pub mod linalg;
pub mod mass_spring;
pub mod net;
pub mod particle;
pub mod render;
pub mod scene;
pub mod skeleton;
pub mod spline;
pub mod spring;
pub mod types;

pub use config::{ConfigLoader, SimConfig};
pub use error::{SimError, SimResult};
pub use scene::{BasketballScene, ShotInput};
pub use types::Vec3;
