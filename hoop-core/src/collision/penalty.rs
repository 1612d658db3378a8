//! Spring-damper penalty force against a single plane.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// An infinite plane given by a point on it and its outward normal.
///
/// The normal points into the permitted half-space (into the court).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalized(),
        }
    }

    /// Signed distance of `pos` along the normal (positive on the permitted side).
    pub fn signed_distance(&self, pos: Vec3) -> f64 {
        (pos - self.point).dot(&self.normal)
    }
}

/// Penalty contact coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyContact {
    /// Contact stiffness (N/m)
    pub ks: f64,
    /// Contact damping along the normal (N·s/m)
    pub kd: f64,
}

impl Default for PenaltyContact {
    fn default() -> Self {
        Self {
            ks: 5000.0,
            kd: 10.0,
        }
    }
}

impl PenaltyContact {
    pub fn new(ks: f64, kd: f64) -> Self {
        Self { ks, kd }
    }

    /// Raw spring-damper force for a body at `pos` moving with `vel`.
    ///
    /// `f = ks*n*((p - x)·n) - kd*n*(v·n)`. Not gated; see [`Self::response`].
    pub fn force(&self, plane: &Plane, pos: Vec3, vel: Vec3) -> Vec3 {
        let n = plane.normal;
        let depth = (plane.point - pos).dot(&n);
        n * (self.ks * depth) - n * (self.kd * vel.dot(&n))
    }

    /// Force to accumulate, or `None` when the body is clear of the plane.
    ///
    /// The force counts only when it pushes along the normal (`f·n > 0`).
    pub fn response(&self, plane: &Plane, pos: Vec3, vel: Vec3) -> Option<Vec3> {
        let f = self.force(plane, pos, vel);
        if f.dot(&plane.normal) > 0.0 {
            Some(f)
        } else {
            None
        }
    }

    /// Same sign test as [`Self::response`] without producing a force.
    pub fn is_touching(&self, plane: &Plane, pos: Vec3, vel: Vec3) -> bool {
        self.response(plane, pos, vel).is_some()
    }
}
