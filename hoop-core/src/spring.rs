//! Viscoelastic connectors between two particles.

use crate::error::{EntityKind, SimError, SimResult};
use crate::particle::Particle;
use crate::types::Vec3;

/// A spring-damper joining two particles of the same simulation.
///
/// Endpoints are arena indices into the owning simulation's particles; the
/// spring never owns or borrows them between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    endpoints: Option<(usize, usize)>,
    pub ks: f64,
    pub kd: f64,
    pub rest_length: f64,
    index: usize,
}

impl Spring {
    /// Uninitialized spring occupying arena slot `index`.
    pub fn new(index: usize) -> Self {
        Self {
            endpoints: None,
            ks: 0.0,
            kd: 0.0,
            rest_length: 0.0,
            index,
        }
    }

    /// Connect particles `p1` and `p2`, marking the spring valid.
    pub fn set(&mut self, p1: usize, p2: usize, ks: f64, kd: f64, rest_length: f64) -> SimResult<()> {
        if !(ks >= 0.0 && kd >= 0.0 && rest_length >= 0.0) {
            return Err(SimError::InvalidSpring { ks, kd, rest_length });
        }
        self.endpoints = Some((p1, p2));
        self.ks = ks;
        self.kd = kd;
        self.rest_length = rest_length;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.endpoints.is_some()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Particle indices `(p1, p2)`.
    pub fn endpoints(&self) -> SimResult<(usize, usize)> {
        self.endpoints.ok_or_else(|| SimError::Uninitialized {
            kind: EntityKind::Spring,
            index: self.index,
        })
    }

    /// Spring plus damper force acting on the first endpoint.
    ///
    /// The second endpoint receives the negation. With `d = x2 - x1` and
    /// `dir = d/|d|`:
    ///
    /// ```text
    /// f = dir*ks*(|d| - rest_length) + dir*kd*((v2 - v1)·dir)
    /// ```
    pub fn viscoelastic_force(&self, particles: &[Particle]) -> SimResult<Vec3> {
        let (i, j) = self.endpoints()?;
        let p1 = lookup(particles, i)?;
        let p2 = lookup(particles, j)?;

        let d = p2.pos - p1.pos;
        let dir = d.normalized();
        let length = d.magnitude();

        let spring = dir * (self.ks * (length - self.rest_length));
        let relative_vel = p2.vel - p1.vel;
        let damper = dir * (self.kd * relative_vel.dot(&dir));

        Ok(spring + damper)
    }
}

fn lookup(particles: &[Particle], index: usize) -> SimResult<&Particle> {
    let p = particles.get(index).ok_or_else(|| SimError::OutOfBounds {
        kind: EntityKind::Particle,
        index,
        count: particles.len(),
    })?;
    p.ensure_valid()?;
    Ok(p)
}
