//! Matrix helpers on top of `nalgebra`.
//!
//! Two roles share these types:
//! - 4x4 homogeneous transforms for the skeleton (`Mat4`), always rigid or
//!   scale-and-translate and therefore invertible
//! - 3xN Jacobians for the IK solver, which may be rank deficient
//!
//! The pseudo-inverse here is the damped right inverse `Jᵀ(JJᵀ + λ²I)⁻¹`.
//! When the damped `JJᵀ` is numerically singular the plain transpose is
//! returned instead.

use nalgebra::{Matrix3, Matrix4, Rotation3, SMatrix, Unit, Vector3, Vector4};

use crate::types::Vec3;

/// Homogeneous 4x4 transform.
pub type Mat4 = Matrix4<f64>;

impl From<Vec3> for Vector3<f64> {
    fn from(v: Vec3) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vector3<f64>> for Vec3 {
    fn from(v: Vector3<f64>) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Translation by `(x, y, z)`.
pub fn translation(x: f64, y: f64, z: f64) -> Mat4 {
    Mat4::new_translation(&Vector3::new(x, y, z))
}

/// Non-uniform scale.
pub fn scale(x: f64, y: f64, z: f64) -> Mat4 {
    Mat4::new_nonuniform_scaling(&Vector3::new(x, y, z))
}

/// Rotation of `angle` radians about an arbitrary axis.
///
/// A zero axis yields the identity.
pub fn rotation(angle: f64, axis: Vec3) -> Mat4 {
    let axis: Vector3<f64> = axis.into();
    match Unit::try_new(axis, 1e-12) {
        Some(unit) => Rotation3::from_axis_angle(&unit, angle).to_homogeneous(),
        None => Mat4::identity(),
    }
}

pub fn rotation_x(angle: f64) -> Mat4 {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle).to_homogeneous()
}

pub fn rotation_y(angle: f64) -> Mat4 {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle).to_homogeneous()
}

pub fn rotation_z(angle: f64) -> Mat4 {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle).to_homogeneous()
}

/// Apply a homogeneous transform to a point (w = 1).
pub fn transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    let h = m * Vector4::new(p.x, p.y, p.z, 1.0);
    Vec3::new(h.x, h.y, h.z)
}

/// Translation column of a transform, i.e. where it sends the origin.
pub fn origin_of(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// `|det(A)|` below this fraction of `‖A‖³` counts as singular.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Damped right pseudo-inverse `Jᵀ(JJᵀ + λ²I)⁻¹` of a 3xN matrix.
///
/// With `damping = 0` this is the exact right inverse. Falls back to `Jᵀ`
/// when the damped `JJᵀ` is singular relative to its own scale, which
/// catches nearly dependent rows as well as exactly dependent ones.
pub fn pseudo_inverse<const N: usize>(j: &SMatrix<f64, 3, N>, damping: f64) -> SMatrix<f64, N, 3> {
    let jt = j.transpose();
    let jjt: Matrix3<f64> = j * jt + Matrix3::identity() * (damping * damping);

    let scale = jjt.norm();
    if !(scale > 0.0) || jjt.determinant().abs() <= SINGULAR_TOLERANCE * scale.powi(3) {
        return jt;
    }

    match jjt.try_inverse() {
        Some(inv) => jt * inv,
        None => jt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translation_moves_origin() {
        let m = translation(1.0, 2.0, 3.0);
        assert_eq!(origin_of(&m), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform_point(&m, Vec3::new(1.0, 0.0, 0.0)), Vec3::new(2.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let p = transform_point(&rotation_z(FRAC_PI_2), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_rotation_matches_named_rotation() {
        let a = rotation(0.7, Vec3::new(0.0, 2.0, 0.0));
        let b = rotation_y(0.7);
        assert_relative_eq!(a, b, epsilon = 1e-12);
        assert_eq!(rotation(0.7, Vec3::ZERO), Mat4::identity());
    }

    #[test]
    fn test_transforms_are_invertible() {
        let m = translation(0.0, 3.5, 2.0) * rotation_x(0.3) * scale(0.8, 1.5, 0.7);
        let inv = m.try_inverse().expect("rigid/scale transform should invert");
        assert_relative_eq!(m * inv, Mat4::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_pseudo_inverse_full_rank() {
        let j = SMatrix::<f64, 3, 4>::new(
            1.0, 0.0, 0.0, 1.0, //
            0.0, 2.0, 0.0, 0.0, //
            0.0, 0.0, 3.0, 1.0,
        );
        let pinv = pseudo_inverse(&j, 0.0);
        // Right inverse: J * J⁺ = I
        assert_relative_eq!(j * pinv, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_pseudo_inverse_singular_falls_back_to_transpose() {
        // Zero bottom row makes JJᵀ exactly singular
        let j = SMatrix::<f64, 3, 4>::new(
            1.0, 2.0, 0.0, 0.0, //
            0.0, 1.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 0.0,
        );
        assert_eq!(pseudo_inverse(&j, 0.0), j.transpose());

        let zero = SMatrix::<f64, 3, 10>::zeros();
        assert_eq!(pseudo_inverse(&zero, 0.0), SMatrix::<f64, 10, 3>::zeros());
        assert_eq!(pseudo_inverse(&zero, 0.1), SMatrix::<f64, 10, 3>::zeros());
    }

    #[test]
    fn test_pseudo_inverse_nearly_dependent_rows_fall_back() {
        // Top row is a tiny multiple of (row1 - row2) plus rounding-sized noise,
        // the shape a straight arm gives its finite-difference Jacobian
        let a = SMatrix::<f64, 3, 4>::new(
            0.0, 0.0, 0.0, 0.0, //
            0.0, 4.8, 0.0, 1.0, //
            -4.8, 0.0, -2.6, 0.0,
        );
        let mut j = a;
        for c in 0..4 {
            j[(0, c)] = -0.0005 * (a[(1, c)] - a[(2, c)]) + 1e-13 * c as f64;
        }

        let pinv = pseudo_inverse(&j, 0.0);
        assert_eq!(pinv, j.transpose());
        assert!(pinv.norm() < 10.0);
    }

    #[test]
    fn test_damping_bounds_the_gain() {
        let j = SMatrix::<f64, 3, 4>::new(
            1e-6, 0.0, 0.0, 0.0, //
            0.0, 2.0, 0.0, 0.0, //
            0.0, 0.0, 3.0, 0.0,
        );
        let pinv = pseudo_inverse(&j, 0.1);
        // Gain along each direction is σ/(σ² + λ²), at most 1/(2λ)
        assert!(pinv.norm() <= 5.0 + 1e-9, "gain {}", pinv.norm());
        assert_relative_eq!(pinv[(1, 1)], 2.0 / 4.01, epsilon = 1e-12);
        assert!(pinv[(0, 0)].abs() < 1e-3);
    }
}
