//! Mass-spring-damper simulation.
//!
//! A [`Simulation`] owns a fixed-size arena of [`Particle`]s and [`Spring`]s.
//! It is sized once, populated through indexed setters, then stepped:
//!
//! ```text
//! create_particles(n) / create_springs(m)
//!         │
//! set_particle(i, ..) / set_spring(j, ..)
//!         │
//! step(dt, pinned) ──┐   1. force = m*g + ground penalty (per particle)
//!         ▲          │   2. spring forces, equal and opposite (per spring)
//!         └──────────┘   3. symplectic Euler for every non-pinned particle
//! ```

use tracing::info;

use crate::error::{EntityKind, SimError, SimResult};
use crate::forces::GroundContact;
use crate::particle::Particle;
use crate::spring::Spring;
use crate::types::Vec3;

/// Fixed topology mass-spring-damper system.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    particles: Vec<Particle>,
    springs: Vec<Spring>,
    /// Gravitational acceleration applied to every particle
    pub gravity: Vec3,
    /// One-sided ground penalty below y = 0
    pub ground: GroundContact,
}

impl Simulation {
    /// Empty simulation with the given gravity and ground coefficients.
    pub fn new(gravity: Vec3, ground: GroundContact) -> Self {
        Self {
            particles: Vec::new(),
            springs: Vec::new(),
            gravity,
            ground,
        }
    }

    /// Replace the particle arena with `count` uninitialized particles.
    pub fn create_particles(&mut self, count: usize) {
        self.particles = (0..count).map(Particle::new).collect();
    }

    /// Replace the spring arena with `count` uninitialized springs.
    pub fn create_springs(&mut self, count: usize) {
        self.springs = (0..count).map(Spring::new).collect();
    }

    pub fn set_particle(&mut self, index: usize, mass: f64, pos: Vec3, vel: Vec3) -> SimResult<()> {
        let count = self.particles.len();
        self.particles
            .get_mut(index)
            .ok_or_else(|| SimError::OutOfBounds {
                kind: EntityKind::Particle,
                index,
                count,
            })?
            .set(mass, pos, vel)
    }

    pub fn set_spring(
        &mut self,
        index: usize,
        p1: usize,
        p2: usize,
        ks: f64,
        kd: f64,
        rest_length: f64,
    ) -> SimResult<()> {
        let particle_count = self.particles.len();
        for p in [p1, p2] {
            if p >= particle_count {
                return Err(SimError::OutOfBounds {
                    kind: EntityKind::Particle,
                    index: p,
                    count: particle_count,
                });
            }
        }

        let count = self.springs.len();
        self.springs
            .get_mut(index)
            .ok_or_else(|| SimError::OutOfBounds {
                kind: EntityKind::Spring,
                index,
                count,
            })?
            .set(p1, p2, ks, kd, rest_length)
    }

    pub fn set_all_velocities(&mut self, vel: Vec3) {
        for p in &mut self.particles {
            p.vel = vel;
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn particle(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// Advance one sub-step, holding the particles listed in `pinned` fixed.
    ///
    /// Pinned particles still receive forces but are never integrated, so
    /// their position and velocity are unchanged by any number of steps.
    /// Every particle and spring is checked before anything is touched: a
    /// failed step leaves the arena as it was.
    pub fn step(&mut self, dt: f64, pinned: &[usize]) -> SimResult<()> {
        let count = self.particles.len();
        if let Some(&index) = pinned.iter().find(|&&i| i >= count) {
            return Err(SimError::OutOfBounds {
                kind: EntityKind::Particle,
                index,
                count,
            });
        }

        for p in &self.particles {
            p.ensure_valid()?;
        }
        for spring in &self.springs {
            spring.endpoints()?;
        }

        let gravity = self.gravity;
        let ground = self.ground;
        for p in &mut self.particles {
            p.ext_force = gravity * p.mass + ground.force(p.pos, p.vel);
        }

        for spring in &self.springs {
            let f = spring.viscoelastic_force(&self.particles)?;
            let (i, j) = spring.endpoints()?;
            self.particles[i].ext_force += f;
            self.particles[j].ext_force -= f;
        }

        for p in &mut self.particles {
            if !pinned.contains(&p.index()) {
                p.update(dt)?;
            }
        }

        Ok(())
    }

    /// Advance one sub-step with no pinned particles.
    pub fn update(&mut self, dt: f64) -> SimResult<()> {
        self.step(dt, &[])
    }

    /// Relax the system with `steps` undisturbed sub-steps.
    ///
    /// Run once at setup so a hanging structure reaches its resting shape
    /// before interactive stepping begins.
    pub fn settle(&mut self, steps: usize, dt: f64, pinned: &[usize]) -> SimResult<()> {
        for _ in 0..steps {
            self.step(dt, pinned)?;
        }
        info!(
            steps,
            dt,
            particles = self.particles.len(),
            springs = self.springs.len(),
            "Mass-spring system settled"
        );
        Ok(())
    }
}
