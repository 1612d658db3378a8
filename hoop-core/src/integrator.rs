//! Numerical integration for point masses.
//!
//! Every dynamic body in the sandbox (the ball, each net particle, the
//! trajectory preview) advances with symplectic (semi-implicit) Euler:
//!
//! ```text
//! 1. a     = F / m
//! 2. v_new = v + a*dt
//! 3. x_new = x + v_new*dt      // uses the *new* velocity
//! ```
//!
//! Updating position with the already-updated velocity keeps the stiff
//! penalty springs of the contacts and the net from gaining energy, which
//! explicit Euler does at the same step size.
//!
//! The integrator is a pure function of explicit state: callers pass the
//! current [`PointState`] and net force in and receive the next state back.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Kinematic state of a point mass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointState {
    pub pos: Vec3,
    pub vel: Vec3,
}

impl PointState {
    pub fn new(pos: Vec3, vel: Vec3) -> Self {
        Self { pos, vel }
    }
}

/// Result of an integration step, containing the new state and the
/// acceleration that produced it.
#[derive(Debug, Clone, Copy)]
pub struct IntegrationResult {
    pub state: PointState,
    pub acceleration: Vec3,
}

/// Symplectic Euler integrator.
pub struct SymplecticEuler;

impl SymplecticEuler {
    /// Advance a point mass by one time step under a constant net force.
    ///
    /// # Arguments
    /// * `state` - Current position and velocity
    /// * `force` - Net force accumulated for this step
    /// * `mass` - Mass in kg, must be positive
    /// * `dt` - Time step in seconds
    pub fn step(state: &PointState, force: Vec3, mass: f64, dt: f64) -> IntegrationResult {
        let acceleration = force / mass;
        let vel = state.vel + acceleration * dt;
        let pos = state.pos + vel * dt;

        IntegrationResult {
            state: PointState { pos, vel },
            acceleration,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
