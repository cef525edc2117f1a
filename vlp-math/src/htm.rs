//! Homogeneous transformation matrices (HTMs) for rigid-body poses.
//!
//! An HTM packs a 3x3 rotation and a translation into a single 4x4 matrix:
//!
//! ```text
//! | x_x  y_x  z_x  t_x |
//! | x_y  y_y  z_y  t_y |
//! | x_z  y_z  z_z  t_z |
//! |  0    0    0    1  |
//! ```
//!
//! The rotation columns are the local x/y/z axes expressed in the world frame.
//! Composition follows matrix multiplication: in `a * b` the transform `b` is
//! applied first in the base frame and `a` is applied on top of it. Scene
//! layouts are authored as "base pose, then offset", e.g.
//! `translation(0.0, 0.0, 2.0) * rotate_x(PI)` places a downward-facing
//! emitter two meters above the origin.

use std::fmt;
use std::ops::Mul;

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::GeometryError;

/// Default tolerance used when validating rigid transforms
pub const RIGID_TOLERANCE: f64 = 1e-9;

/// A rigid-body pose stored as a 4x4 homogeneous transformation matrix.
///
/// Only constructible from primitive transforms, by composing existing
/// poses, or through [`Htm::try_from_matrix`], so the rotation block stays
/// orthonormal and the bottom row stays `[0, 0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Htm(Matrix4<f64>);

impl Htm {
    /// The identity pose (world origin, world axes)
    pub fn identity() -> Self {
        Htm(Matrix4::identity())
    }

    /// Wrap an arbitrary 4x4 matrix after checking it is a rigid transform.
    ///
    /// # Errors
    /// * `GeometryError::InvalidArgument` - if the bottom row is not `[0, 0, 0, 1]`,
    ///   an entry is not finite, or the rotation block is not orthonormal
    pub fn try_from_matrix(matrix: Matrix4<f64>) -> Result<Self, GeometryError> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::InvalidArgument(
                "transform contains non-finite entries".to_string(),
            ));
        }

        let bottom = matrix.row(3);
        if bottom[0] != 0.0 || bottom[1] != 0.0 || bottom[2] != 0.0 || bottom[3] != 1.0 {
            return Err(GeometryError::InvalidArgument(format!(
                "bottom row must be [0, 0, 0, 1], got [{}, {}, {}, {}]",
                bottom[0], bottom[1], bottom[2], bottom[3]
            )));
        }

        let htm = Htm(matrix);
        if !htm.is_rigid(RIGID_TOLERANCE) {
            return Err(GeometryError::InvalidArgument(
                "rotation block is not orthonormal".to_string(),
            ));
        }

        Ok(htm)
    }

    /// The underlying 4x4 matrix
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// The 3x3 rotation block
    pub fn rotation(&self) -> Matrix3<f64> {
        self.0.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Position of the frame origin in world coordinates
    pub fn position(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Local x axis in world coordinates
    pub fn x_axis(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 0).into_owned()
    }

    /// Local y axis in world coordinates
    pub fn y_axis(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 1).into_owned()
    }

    /// Local z axis in world coordinates. For emitters and receivers this is
    /// the principal (optical) axis.
    pub fn z_axis(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 2).into_owned()
    }

    /// Check that the rotation columns are unit length and pairwise orthogonal
    /// and that the rotation is proper (determinant +1).
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        let r = self.rotation();
        let gram = r.transpose() * r;
        let orthonormal = (gram - Matrix3::identity()).iter().all(|v| v.abs() <= tolerance);
        orthonormal && (r.determinant() - 1.0).abs() <= tolerance
    }

    /// Inverse rigid transform, computed as `[Rᵀ, -Rᵀt]` rather than a
    /// general matrix inverse.
    pub fn inverse(&self) -> Self {
        let r_t = self.rotation().transpose();
        let t = -(r_t * self.position());

        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r_t);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
        Htm(m)
    }

    /// Map a point expressed in this frame into the parent (world) frame
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let p = self.0 * point.to_homogeneous();
        Point3::new(p.x, p.y, p.z)
    }

    /// Rotate a direction vector from this frame into the parent frame
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * vector
    }

    /// Same orientation, origin moved to `position`
    pub fn with_position(&self, position: Vector3<f64>) -> Self {
        let mut m = self.0;
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&position);
        Htm(m)
    }
}

impl Default for Htm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Htm {
    type Output = Htm;

    fn mul(self, rhs: Htm) -> Htm {
        Htm(self.0 * rhs.0)
    }
}

impl Mul<&Htm> for &Htm {
    type Output = Htm;

    fn mul(self, rhs: &Htm) -> Htm {
        Htm(self.0 * rhs.0)
    }
}

impl fmt::Display for Htm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position();
        let z = self.z_axis();
        write!(
            f,
            "pos=({:.3}, {:.3}, {:.3}) z=({:.3}, {:.3}, {:.3})",
            p.x, p.y, p.z, z.x, z.y, z.z
        )
    }
}

/// Pure translation by `(x, y, z)`
pub fn translation(x: f64, y: f64, z: f64) -> Htm {
    Htm(Matrix4::new_translation(&Vector3::new(x, y, z)))
}

/// Pure translation from a slice of exactly three finite components.
///
/// # Errors
/// * `GeometryError::InvalidArgument` - if the slice does not hold exactly
///   3 values or any value is not finite
pub fn translation_from_slice(components: &[f64]) -> Result<Htm, GeometryError> {
    match components {
        [x, y, z] if components.iter().all(|v| v.is_finite()) => Ok(translation(*x, *y, *z)),
        [_, _, _] => Err(GeometryError::InvalidArgument(format!(
            "translation components must be finite, got {components:?}"
        ))),
        _ => Err(GeometryError::InvalidArgument(format!(
            "translation requires exactly 3 components, got {}",
            components.len()
        ))),
    }
}

/// Rotation by `angle` radians about the x axis
pub fn rotate_x(angle: f64) -> Htm {
    let (s, c) = angle.sin_cos();
    Htm(Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, c, -s, 0.0, //
        0.0, s, c, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ))
}

/// Rotation by `angle` radians about the y axis
pub fn rotate_y(angle: f64) -> Htm {
    let (s, c) = angle.sin_cos();
    Htm(Matrix4::new(
        c, 0.0, s, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        -s, 0.0, c, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ))
}

/// Rotation by `angle` radians about the z axis
pub fn rotate_z(angle: f64) -> Htm {
    let (s, c) = angle.sin_cos();
    Htm(Matrix4::new(
        c, -s, 0.0, 0.0, //
        s, c, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_rotation_inverse_is_identity() {
        for &theta in &[0.0, 0.3, FRAC_PI_2, PI, -2.1, 7.5] {
            for rot in [rotate_x, rotate_y, rotate_z] {
                let product = rot(theta) * rot(-theta);
                assert_relative_eq!(*product.matrix(), Matrix4::identity(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_random_compositions_stay_orthonormal() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pose = Htm::identity();

        for _ in 0..200 {
            let step = match rng.random_range(0..4) {
                0 => rotate_x(rng.random_range(-PI..PI)),
                1 => rotate_y(rng.random_range(-PI..PI)),
                2 => rotate_z(rng.random_range(-PI..PI)),
                _ => translation(
                    rng.random_range(-5.0..5.0),
                    rng.random_range(-5.0..5.0),
                    rng.random_range(-5.0..5.0),
                ),
            };
            pose = pose * step;
            assert!(pose.is_rigid(1e-9), "lost orthonormality: {pose}");
            let bottom: Vector4<f64> = pose.matrix().row(3).transpose();
            assert_eq!(bottom, Vector4::new(0.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_composition_order_base_then_offset() {
        // Emitter two meters up, flipped to face the floor
        let pose = translation(0.0, 0.0, 2.0) * rotate_x(PI);
        assert_relative_eq!(pose.position(), Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(pose.z_axis(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);

        // Reversed order rotates the translated origin as well
        let reversed = rotate_x(PI) * translation(0.0, 0.0, 2.0);
        assert_relative_eq!(reversed.position(), Vector3::new(0.0, 0.0, -2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotate_z_maps_x_to_y() {
        let pose = rotate_z(FRAC_PI_2);
        assert_relative_eq!(pose.x_axis(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(pose.y_axis(), Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_transform_vector_ignores_translation() {
        let pose = translation(5.0, -1.0, 2.0) * rotate_x(FRAC_PI_2);
        let v = pose.transform_vector(&Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(v, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);

        let p = pose.transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p, Point3::new(5.0, -1.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let pose = translation(1.0, -2.0, 0.5) * rotate_z(0.7) * rotate_y(-0.3);
        let product = pose * pose.inverse();
        assert_relative_eq!(*product.matrix(), Matrix4::identity(), epsilon = 1e-12);

        let p = Point3::new(0.2, 0.4, -1.0);
        let back = pose.inverse().transform_point(&pose.transform_point(&p));
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_translation_from_slice() {
        let t = translation_from_slice(&[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(t.position(), Vector3::new(1.0, 2.0, 3.0));

        assert!(matches!(
            translation_from_slice(&[1.0, 2.0]),
            Err(GeometryError::InvalidArgument(_))
        ));
        assert!(matches!(
            translation_from_slice(&[1.0, 2.0, 3.0, 4.0]),
            Err(GeometryError::InvalidArgument(_))
        ));
        assert!(matches!(
            translation_from_slice(&[1.0, f64::NAN, 3.0]),
            Err(GeometryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_try_from_matrix_rejects_non_rigid() {
        let mut scaled = Matrix4::identity();
        scaled[(0, 0)] = 2.0;
        assert!(Htm::try_from_matrix(scaled).is_err());

        let mut projective = Matrix4::identity();
        projective[(3, 0)] = 0.1;
        assert!(Htm::try_from_matrix(projective).is_err());

        let ok = Htm::try_from_matrix(*rotate_y(0.4).matrix()).unwrap();
        assert_relative_eq!(*ok.matrix(), *rotate_y(0.4).matrix());
    }

    #[test]
    fn test_with_position_keeps_orientation() {
        let pose = rotate_x(0.5) * rotate_z(1.0);
        let moved = pose.with_position(Vector3::new(3.0, 4.0, 5.0));
        assert_relative_eq!(moved.rotation(), pose.rotation());
        assert_relative_eq!(moved.position(), Vector3::new(3.0, 4.0, 5.0));
    }
}
