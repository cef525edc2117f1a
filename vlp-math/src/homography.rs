//! Projective transform (homography) estimation from four point pairs.
//!
//! With `H[2,2]` fixed to 1 the remaining eight entries are determined by
//! exactly four correspondences. Each pair `(x, y) -> (u, v)` contributes two
//! rows to an 8x8 linear system:
//!
//! ```text
//! [ x  y  1  0  0  0  -u·x  -u·y ] · h = u
//! [ 0  0  0  x  y  1  -v·x  -v·y ] · h = v
//! ```
//!
//! where `h = [h00, h01, h02, h10, h11, h12, h20, h21]`.

use nalgebra::{DMatrix, Matrix3, SMatrix, SVector};

use crate::projective::normalize_homogeneous;
use crate::GeometryError;

/// Ratio of smallest to largest singular value below which the system is
/// treated as singular.
const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;

/// Number of correspondences the estimator needs
pub const CORRESPONDENCES: usize = 4;

/// Estimate the 3x3 projective transform `H` with `image ≈ H · domain`.
///
/// # Arguments
/// * `domain` - 3x4 matrix of homogeneous 2D points (one per column)
/// * `image` - 3x4 matrix of the matching homogeneous 2D points
///
/// # Returns
/// `H` with `H[(2, 2)] == 1`.
///
/// # Errors
/// * `GeometryError::DimensionMismatch` - inputs differ in shape or are not 3x4
/// * `GeometryError::DivisionByZero` - a point is at infinity
/// * `GeometryError::SingularSystem` - points are not in general position
///   (collinear or repeated)
pub fn estimate_projective_transform(
    domain: &DMatrix<f64>,
    image: &DMatrix<f64>,
) -> Result<Matrix3<f64>, GeometryError> {
    if domain.shape() != image.shape() {
        return Err(GeometryError::DimensionMismatch {
            expected: format!("{}x{} (domain shape)", domain.nrows(), domain.ncols()),
            actual: format!("{}x{}", image.nrows(), image.ncols()),
        });
    }
    if domain.shape() != (3, CORRESPONDENCES) {
        return Err(GeometryError::shape_mismatch("3x4", domain.shape()));
    }

    let src = normalize_homogeneous(domain)?;
    let dst = normalize_homogeneous(image)?;

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..CORRESPONDENCES {
        let (x, y) = (src[(0, k)], src[(1, k)]);
        let (u, v) = (dst[(0, k)], dst[(1, k)]);

        let r = 2 * k;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -u * x;
        a[(r, 7)] = -u * y;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -v * x;
        a[(r + 1, 7)] = -v * y;
        b[r + 1] = v;
    }

    let singular_values = a.singular_values();
    let s_max = singular_values.max();
    let s_min = singular_values.min();
    if !(s_max > 0.0) || s_min / s_max < MIN_RECIPROCAL_CONDITION {
        let condition = if s_min > 0.0 { s_max / s_min } else { f64::INFINITY };
        log::debug!("Rejecting projective system with condition {condition:e}");
        return Err(GeometryError::SingularSystem { condition });
    }

    let h = a
        .lu()
        .solve(&b)
        .ok_or(GeometryError::SingularSystem {
            condition: f64::INFINITY,
        })?;

    Ok(Matrix3::new(
        h[0], h[1], h[2], //
        h[3], h[4], h[5], //
        h[6], h[7], 1.0,
    ))
}

/// Map homogeneous 2D points (3 rows) through `h` and normalise the result.
///
/// # Errors
/// * `GeometryError::DimensionMismatch` - points do not have 3 rows
/// * `GeometryError::DivisionByZero` - a point maps to infinity
pub fn apply_projective_transform(
    h: &Matrix3<f64>,
    points: &DMatrix<f64>,
) -> Result<DMatrix<f64>, GeometryError> {
    if points.nrows() != 3 {
        return Err(GeometryError::shape_mismatch("3 rows", points.shape()));
    }

    let h_dyn = DMatrix::from_column_slice(3, 3, h.as_slice());
    normalize_homogeneous(&(h_dyn * points))
}
