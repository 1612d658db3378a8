//! Cubic Hermite spline through (position, tangent) waypoints.
//!
//! Used to draw the predicted ball trajectory. Parametrization is uniform
//! over waypoints: `t` in `[0, 1]` maps to the fractional index
//! `u = t*(n - 1)`, and tangents are scaled by `1/n` rather than by the
//! actual segment length.

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// A sampled point on the curve and its tangent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Vec3,
    pub tangent: Vec3,
}

impl Waypoint {
    pub fn new(point: Vec3, tangent: Vec3) -> Self {
        Self { point, tangent }
    }
}

/// Hermite basis `(h00, h10, h01, h11)` at `s` in `[0, 1]`.
pub fn hermite_basis(s: f64) -> (f64, f64, f64, f64) {
    let s2 = s * s;
    let s3 = s2 * s;
    (
        2.0 * s3 - 3.0 * s2 + 1.0,
        s3 - 2.0 * s2 + s,
        -2.0 * s3 + 3.0 * s2,
        s3 - s2,
    )
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HermiteSpline {
    waypoints: Vec<Waypoint>,
}

impl HermiteSpline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Vec3, tangent: Vec3) {
        self.waypoints.push(Waypoint::new(point, tangent));
    }

    /// Move waypoint `index`. Returns false if it does not exist.
    pub fn set_point(&mut self, index: usize, point: Vec3) -> bool {
        match self.waypoints.get_mut(index) {
            Some(w) => {
                w.point = point;
                true
            }
            None => false,
        }
    }

    /// Change the tangent at waypoint `index`. Returns false if it does not exist.
    pub fn set_tangent(&mut self, index: usize, tangent: Vec3) -> bool {
        match self.waypoints.get_mut(index) {
            Some(w) => {
                w.tangent = tangent;
                true
            }
            None => false,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Position at `t`, clamped to `[0, 1]`.
    ///
    /// Fewer than two waypoints gives the origin.
    pub fn get_position(&self, t: f64) -> Vec3 {
        let n = self.waypoints.len();
        if n < 2 {
            return Vec3::ZERO;
        }

        let u = t.clamp(0.0, 1.0) * (n - 1) as f64;
        let a = u.floor() as usize;
        let b = (u.ceil() as usize).min(n - 1);
        let s = u % 1.0;

        let (h00, h10, h01, h11) = hermite_basis(s);
        let scale = 1.0 / n as f64;
        let wa = &self.waypoints[a];
        let wb = &self.waypoints[b];

        wa.point * h00 + wa.tangent * (scale * h10) + wb.point * h01 + wb.tangent * (scale * h11)
    }

    /// `samples + 1` evenly spaced positions from `t = 0` to `t = 1`.
    pub fn sample(&self, samples: usize) -> Vec<Vec3> {
        if samples == 0 {
            return vec![self.get_position(0.0)];
        }
        (0..=samples)
            .map(|i| self.get_position(i as f64 / samples as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_segment() -> HermiteSpline {
        let mut spline = HermiteSpline::new();
        spline.add_point(Vec3::ZERO, Vec3::ZERO);
        spline.add_point(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        spline
    }

    #[test]
    fn test_degenerate_spline_returns_origin() {
        let mut spline = HermiteSpline::new();
        assert_eq!(spline.get_position(0.3), Vec3::ZERO);
        spline.add_point(Vec3::new(4.0, 5.0, 6.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(spline.get_position(0.3), Vec3::ZERO);
    }

    #[test]
    fn test_boundary_exactness() {
        let spline = unit_segment();
        assert_eq!(spline.get_position(0.0), Vec3::ZERO);
        assert_eq!(spline.get_position(1.0), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_midpoint_uses_position_basis_only() {
        let spline = unit_segment();
        let (h00, _, h01, _) = hermite_basis(0.5);
        let expected = Vec3::ZERO * h00 + Vec3::new(1.0, 0.0, 0.0) * h01;

        let mid = spline.get_position(0.5);
        assert_relative_eq!(mid.x, expected.x, epsilon = 1e-12);
        assert_relative_eq!(mid.x, 0.5, epsilon = 1e-12);
        assert_eq!(mid.y, 0.0);
    }

    #[test]
    fn test_tangents_scaled_by_waypoint_count() {
        let mut spline = HermiteSpline::new();
        spline.add_point(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0));
        spline.add_point(Vec3::ZERO, Vec3::ZERO);

        // Only h10 contributes: h10(0.5) = 0.125, tangent scaled by 1/2
        let p = spline.get_position(0.5);
        assert_relative_eq!(p.y, 4.0 * 0.5 * 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_interior_waypoints_are_interpolated() {
        let mut spline = HermiteSpline::new();
        for i in 0..5 {
            spline.add_point(Vec3::new(i as f64, (i * i) as f64, 0.0), Vec3::new(1.0, 1.0, 0.0));
        }
        for i in 0..5 {
            let p = spline.get_position(i as f64 / 4.0);
            assert_relative_eq!(p.x, i as f64, epsilon = 1e-12);
            assert_relative_eq!(p.y, (i * i) as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parameter_is_clamped() {
        let spline = unit_segment();
        assert_eq!(spline.get_position(-2.0), spline.get_position(0.0));
        assert_eq!(spline.get_position(7.5), spline.get_position(1.0));
    }

    #[test]
    fn test_edit_and_sample() {
        let mut spline = unit_segment();
        assert!(spline.set_point(1, Vec3::new(2.0, 0.0, 0.0)));
        assert!(spline.set_tangent(0, Vec3::new(1.0, 0.0, 0.0)));
        assert!(!spline.set_point(9, Vec3::ZERO));

        let samples = spline.sample(4);
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], Vec3::ZERO);
        assert_eq!(samples[4], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(spline.len(), 2);
        assert!(!spline.is_empty());
    }
}
