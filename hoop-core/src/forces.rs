//! Contact forces that are not plane penalties.
//!
//! - **Ground penalty** for net particles: one-sided spring-damper plus a
//!   viscous friction term, applied only below `y = 0`
//! - **Kinetic friction** for the ball while it rolls along the ground
//!
//! ```text
//! particle below ground (y < 0):
//!
//! ════════╪════════  y = 0
//!         ↓ dir      (ground projection -> particle)
//!         ●
//!
//! F = -(dir*ks*depth + dir*kd*(v·dir) + mu*v)
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// Ground contact coefficients for mass-spring particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundContact {
    pub ks: f64,
    pub kd: f64,
    /// Viscous friction coefficient applied to the full velocity
    pub friction: f64,
}

impl Default for GroundContact {
    fn default() -> Self {
        Self {
            ks: 5000.0,
            kd: 10.0,
            friction: 3.75,
        }
    }
}

impl GroundContact {
    /// Penalty force for a particle at `pos` with `vel`.
    ///
    /// Zero at or above the ground plane. The penalty is one-sided: nothing
    /// holds a particle down or pulls it toward the plane from above.
    pub fn force(&self, pos: Vec3, vel: Vec3) -> Vec3 {
        if pos.y >= 0.0 {
            return Vec3::ZERO;
        }

        let ground = Vec3::new(pos.x, 0.0, pos.z);
        let offset = pos - ground;
        let dir = offset.normalized();
        let depth = offset.magnitude();

        let spring = dir * (self.ks * depth);
        let damper = dir * (self.kd * vel.dot(&dir));
        let friction = vel * self.friction;

        -(spring + damper + friction)
    }
}

/// Kinetic friction on the ball.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticFriction {
    /// Kinetic friction coefficient
    pub mu_k: f64,
    /// Half-height of the band around y = 0 where friction acts
    pub band: f64,
}

impl Default for KineticFriction {
    fn default() -> Self {
        Self {
            mu_k: 0.1,
            band: 0.1,
        }
    }
}

impl KineticFriction {
    /// Friction force opposing `vel` for a body of `mass` at height `y`.
    ///
    /// Magnitude is `mu_k * |m*g|` times the *unnormalized* velocity, so it
    /// grows with speed. Only the horizontal part is kept, and only inside
    /// the band `-band < y < band`.
    pub fn force(&self, mass: f64, y: f64, vel: Vec3, gravity: Vec3) -> Vec3 {
        if !(y > -self.band && y < self.band) {
            return Vec3::ZERO;
        }

        let normal = (gravity * mass).magnitude();
        let mut f = vel * (-self.mu_k * normal);
        f.y = 0.0;
        f
    }
}

// =============================================================================
// Tests
// =============================================================================
