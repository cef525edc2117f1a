//! Geometry primitives for visible-light positioning simulation.
//!
//! * [`htm`] - 4x4 homogeneous transformation matrices for rigid poses
//! * [`projective`] - homogeneous point normalisation and point/link sets
//! * [`homography`] - 3x3 projective transform estimation from 4 correspondences

pub mod homography;
pub mod htm;
pub mod projective;

pub use homography::{apply_projective_transform, estimate_projective_transform};
pub use htm::{rotate_x, rotate_y, rotate_z, translation, translation_from_slice, Htm};
pub use projective::{normalize_homogeneous, PointLinks};

use thiserror::Error;

/// Errors raised by the geometry primitives
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Linear system is singular or ill-conditioned (condition estimate {condition:e})")]
    SingularSystem { condition: f64 },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Homogeneous point {column} has zero scale (point at infinity)")]
    DivisionByZero { column: usize },
}

impl GeometryError {
    pub(crate) fn shape_mismatch(expected: impl Into<String>, actual: (usize, usize)) -> Self {
        GeometryError::DimensionMismatch {
            expected: expected.into(),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}
