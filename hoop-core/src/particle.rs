//! Point masses for the mass-spring-damper engine.

use crate::error::{EntityKind, SimError, SimResult};
use crate::integrator::{PointState, SymplecticEuler};
use crate::types::Vec3;

/// A point mass owned by a [`Simulation`](crate::mass_spring::Simulation).
///
/// Particles start uninitialized and must be given a mass and state through
/// [`Particle::set`] before they can be stepped.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub mass: f64,
    pub pos: Vec3,
    pub vel: Vec3,
    pub acc: Vec3,
    pub ext_force: Vec3,
    valid: bool,
    index: usize,
}

impl Particle {
    /// Uninitialized particle occupying arena slot `index`.
    pub fn new(index: usize) -> Self {
        Self {
            mass: 0.0,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            acc: Vec3::ZERO,
            ext_force: Vec3::ZERO,
            valid: false,
            index,
        }
    }

    /// Assign mass and initial state, marking the particle valid.
    pub fn set(&mut self, mass: f64, pos: Vec3, vel: Vec3) -> SimResult<()> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(SimError::InvalidMass(mass));
        }
        self.mass = mass;
        self.pos = pos;
        self.vel = vel;
        self.acc = Vec3::ZERO;
        self.ext_force = Vec3::ZERO;
        self.valid = true;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> PointState {
        PointState::new(self.pos, self.vel)
    }

    /// Fails with [`SimError::Uninitialized`] unless [`Particle::set`] has run.
    pub fn ensure_valid(&self) -> SimResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(SimError::Uninitialized {
                kind: EntityKind::Particle,
                index: self.index,
            })
        }
    }

    /// One symplectic Euler sub-step under the accumulated `ext_force`.
    pub fn update(&mut self, dt: f64) -> SimResult<()> {
        self.ensure_valid()?;
        let result = SymplecticEuler::step(&self.state(), self.ext_force, self.mass, dt);
        self.acc = result.acceleration;
        self.pos = result.state.pos;
        self.vel = result.state.vel;
        Ok(())
    }
}
