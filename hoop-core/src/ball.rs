//! The basketball: one dynamic sphere with penalty contact, friction and a
//! forward-simulated trajectory preview.
//!
//! ## Tick contract
//!
//! The caller owns the force accumulator. Within one tick:
//!
//! 1. set `ext_force` (gravity plus any launch force)
//! 2. [`Ball::calculate_force`] against each court plane
//! 3. [`Ball::calculate_friction`]
//! 4. [`Ball::update`]
//!
//! ## Preview vs. response
//!
//! [`Ball::did_collide`] runs the same sign test as [`Ball::calculate_force`]
//! but at a hypothetical position and never touches the accumulator. The
//! preview still uses the ball's *live* velocity for the damping term.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::{Boundary, Court, PenaltyContact, Plane};
use crate::forces::KineticFriction;
use crate::integrator::{PointState, SymplecticEuler};
use crate::linalg::{self, Mat4};
use crate::spline::HermiteSpline;
use crate::types::Vec3;

/// Physical ball parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallProperties {
    /// Mass (kg)
    pub mass: f64,
    /// Radius (m)
    pub radius: f64,
    /// Position restored by [`Ball::reset`]
    pub spawn: Vec3,
    pub contact: PenaltyContact,
    pub friction: KineticFriction,
    /// Uniform scale of the drawn model
    pub model_scale: f64,
}

impl Default for BallProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            radius: 0.037,
            spawn: Vec3::new(0.0, 3.5, 0.0),
            contact: PenaltyContact::default(),
            friction: KineticFriction::default(),
            model_scale: 0.5,
        }
    }
}

/// Trajectory preview parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSettings {
    pub dt: f64,
    /// Hard cap on preview sub-steps
    pub max_steps: usize,
    /// Record a waypoint every this many sub-steps
    pub sample_interval: usize,
}

impl Default for ArcSettings {
    fn default() -> Self {
        Self {
            dt: 0.001,
            max_steps: 10_000,
            sample_interval: 100,
        }
    }
}

/// Result of a trajectory preview.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPreview {
    pub spline: HermiteSpline,
    /// Plane that ended the preview, if any
    pub hit: Option<Boundary>,
    /// Sub-steps simulated
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub properties: BallProperties,
    pub pos: Vec3,
    pub vel: Vec3,
    pub acc: Vec3,
    pub ext_force: Vec3,
    arc: Option<HermiteSpline>,
}

impl Default for Ball {
    fn default() -> Self {
        Self::new(BallProperties::default())
    }
}

impl Ball {
    /// Ball at rest at its spawn point.
    pub fn new(properties: BallProperties) -> Self {
        Self {
            pos: properties.spawn,
            vel: Vec3::ZERO,
            acc: Vec3::ZERO,
            ext_force: Vec3::ZERO,
            arc: None,
            properties,
        }
    }

    pub fn mass(&self) -> f64 {
        self.properties.mass
    }

    pub fn state(&self) -> PointState {
        PointState::new(self.pos, self.vel)
    }

    /// Back to the spawn point with zero velocity, acceleration and force.
    pub fn reset(&mut self) {
        self.reset_to(self.properties.spawn);
    }

    pub fn reset_to(&mut self, pos: Vec3) {
        self.pos = pos;
        self.vel = Vec3::ZERO;
        self.acc = Vec3::ZERO;
        self.ext_force = Vec3::ZERO;
    }

    pub fn clear_forces(&mut self) {
        self.ext_force = Vec3::ZERO;
    }

    /// Accumulate the penalty force against `plane`. Returns true if it applied.
    pub fn calculate_force(&mut self, plane: &Plane) -> bool {
        match self.properties.contact.response(plane, self.pos, self.vel) {
            Some(f) => {
                self.ext_force += f;
                true
            }
            None => false,
        }
    }

    /// Penalty forces against every court plane. Returns how many applied.
    pub fn apply_court_forces(&mut self, court: &Court) -> usize {
        court
            .planes()
            .iter()
            .filter(|plane| self.calculate_force(plane))
            .count()
    }

    /// Accumulate kinetic friction while the ball is at ground level.
    pub fn calculate_friction(&mut self, gravity: Vec3) {
        let mass = self.properties.mass;
        self.ext_force += self.properties.friction.force(mass, self.pos.y, self.vel, gravity);
    }

    /// One symplectic Euler sub-step under the accumulated force.
    pub fn update(&mut self, dt: f64) {
        let result = SymplecticEuler::step(&self.state(), self.ext_force, self.properties.mass, dt);
        self.acc = result.acceleration;
        self.pos = result.state.pos;
        self.vel = result.state.vel;
    }

    /// Penalty sign test at a hypothetical `pos`, using the live velocity.
    pub fn did_collide(&self, plane: &Plane, pos: Vec3) -> bool {
        self.properties.contact.is_touching(plane, pos, self.vel)
    }

    /// First court plane [`Ball::did_collide`] reports for `pos`.
    pub fn collides_with_court(&self, court: &Court, pos: Vec3) -> Option<Boundary> {
        court.first_contact(&self.properties.contact, pos, self.vel)
    }

    /// Forward-simulate a shot without touching the ball's state.
    ///
    /// `launch_force` acts on the first sub-step only, gravity on every one.
    /// A waypoint (position, velocity) is recorded every `sample_interval`
    /// steps, plus a final one on the first step a court plane is hit.
    pub fn preview_arc(&self, court: &Court, gravity: Vec3, launch_force: Vec3, settings: &ArcSettings) -> ArcPreview {
        let mass = self.properties.mass;
        let interval = settings.sample_interval.max(1);
        let mut state = self.state();
        let mut force = gravity * mass + launch_force;
        let mut spline = HermiteSpline::new();
        let mut hit = None;
        let mut steps = 0;

        while steps < settings.max_steps {
            if steps % interval == 0 {
                spline.add_point(state.pos, state.vel);
            }
            if let Some(boundary) = self.collides_with_court(court, state.pos) {
                spline.add_point(state.pos, state.vel);
                hit = Some(boundary);
                break;
            }
            state = SymplecticEuler::step(&state, force, mass, settings.dt).state;
            force = gravity * mass;
            steps += 1;
        }

        ArcPreview { spline, hit, steps }
    }

    /// Recompute and store the trajectory preview.
    pub fn update_arc(&mut self, court: &Court, gravity: Vec3, launch_force: Vec3, settings: &ArcSettings) -> &HermiteSpline {
        let preview = self.preview_arc(court, gravity, launch_force, settings);
        debug!(
            waypoints = preview.spline.len(),
            steps = preview.steps,
            hit = ?preview.hit,
            "Trajectory preview updated"
        );
        self.arc.insert(preview.spline)
    }

    /// Most recent trajectory preview.
    pub fn arc(&self) -> Option<&HermiteSpline> {
        self.arc.as_ref()
    }

    /// Draw transform: translation to the ball centre times uniform scale.
    pub fn model_transform(&self) -> Mat4 {
        let s = self.properties.model_scale;
        linalg::translation(self.pos.x, self.pos.y, self.pos.z) * linalg::scale(s, s, s)
    }
}
