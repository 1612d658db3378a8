//! Seams to the rendering collaborator.
//!
//! The engine never owns GPU resources. It hands out world transforms and
//! curve functions; whatever implements these traits turns them into pixels.

use crate::linalg::Mat4;
use crate::types::Vec3;

/// Shape handle understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Skeleton body segment
    Sphere,
    Ball,
    /// One particle of the hoop net
    NetParticle,
}

/// Receives one draw call per shape instance.
pub trait DrawSink {
    fn draw(&mut self, shape: ShapeKind, transform: &Mat4);
}

/// Receives a parametrized curve to sample over `t` in `[0, 1]`.
pub trait CurveSink {
    fn update_curve(&mut self, curve: &dyn Fn(f64) -> Vec3, samples: usize);
}

/// Evaluate `curve` at `samples + 1` evenly spaced parameters.
pub fn sample_curve(curve: &dyn Fn(f64) -> Vec3, samples: usize) -> Vec<Vec3> {
    let n = samples.max(1);
    (0..=n).map(|i| curve(i as f64 / n as f64)).collect()
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub shape: ShapeKind,
    pub transform: Mat4,
}

/// Collects draw calls in order.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub calls: Vec<DrawCall>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, shape: ShapeKind) -> usize {
        self.calls.iter().filter(|c| c.shape == shape).count()
    }
}

impl DrawSink for DrawList {
    fn draw(&mut self, shape: ShapeKind, transform: &Mat4) {
        self.calls.push(DrawCall {
            shape,
            transform: *transform,
        });
    }
}

/// Stores the most recent sampled curve.
#[derive(Debug, Clone, Default)]
pub struct Polyline {
    pub points: Vec<Vec3>,
}

impl CurveSink for Polyline {
    fn update_curve(&mut self, curve: &dyn Fn(f64) -> Vec3, samples: usize) {
        self.points = sample_curve(curve, samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg;

    #[test]
    fn test_sample_curve_endpoints() {
        let line = |t: f64| Vec3::new(2.0 * t, 0.0, 0.0);
        let points = sample_curve(&line, 4);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], Vec3::ZERO);
        assert_eq!(points[2], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(points[4], Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_draw_list_records_in_order() {
        let mut list = DrawList::new();
        list.draw(ShapeKind::Ball, &linalg::translation(1.0, 0.0, 0.0));
        list.draw(ShapeKind::Sphere, &Mat4::identity());
        list.draw(ShapeKind::Sphere, &Mat4::identity());

        assert_eq!(list.calls.len(), 3);
        assert_eq!(list.calls[0].shape, ShapeKind::Ball);
        assert_eq!(list.count(ShapeKind::Sphere), 2);
        assert_eq!(list.count(ShapeKind::NetParticle), 0);
    }

    #[test]
    fn test_polyline_replaces_points() {
        let mut poly = Polyline::default();
        poly.update_curve(&|t| Vec3::new(t, t, t), 10);
        assert_eq!(poly.points.len(), 11);
        poly.update_curve(&|_| Vec3::ZERO, 2);
        assert_eq!(poly.points, vec![Vec3::ZERO; 3]);
    }
}
