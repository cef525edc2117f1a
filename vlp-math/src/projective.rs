//! Homogeneous point sets.
//!
//! Points are stored column-wise in a `DMatrix<f64>`: a 2D point occupies a
//! 3-row column `[x, y, w]ᵀ`, a 3D point a 4-row column `[x, y, z, w]ᵀ`.
//! The last row is the homogeneous scale.

use nalgebra::DMatrix;

use crate::GeometryError;

/// Divide every column by its own last-row entry so each point has scale 1.
///
/// Normalising an already normalised set returns it unchanged.
///
/// # Errors
/// * `GeometryError::DimensionMismatch` - fewer than two rows (no scale row)
/// * `GeometryError::DivisionByZero` - a column has zero scale (point at infinity)
pub fn normalize_homogeneous(points: &DMatrix<f64>) -> Result<DMatrix<f64>, GeometryError> {
    if points.nrows() < 2 {
        return Err(GeometryError::shape_mismatch("at least 2 rows", points.shape()));
    }

    let scale_row = points.nrows() - 1;
    let mut normalized = points.clone();

    for (col_idx, mut column) in normalized.column_iter_mut().enumerate() {
        let w = column[scale_row];
        if w == 0.0 {
            return Err(GeometryError::DivisionByZero { column: col_idx });
        }
        column /= w;
    }

    Ok(normalized)
}

/// Points plus the index pairs that should be joined when drawn.
///
/// Display-only data: a presentation layer iterates [`PointLinks::segments`]
/// to draw edges, nothing here depends on how they are rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLinks {
    points: DMatrix<f64>,
    links: Vec<(usize, usize)>,
}

impl PointLinks {
    /// Build a point/link set from homogeneous 2D (3 rows) or 3D (4 rows) points.
    ///
    /// Points are normalised on construction.
    ///
    /// # Errors
    /// * `GeometryError::DimensionMismatch` - points are neither 3 nor 4 rows
    /// * `GeometryError::DivisionByZero` - a point is at infinity
    /// * `GeometryError::IndexOutOfRange` - a link references a missing column
    pub fn new(points: DMatrix<f64>, links: Vec<(usize, usize)>) -> Result<Self, GeometryError> {
        if points.nrows() != 3 && points.nrows() != 4 {
            return Err(GeometryError::shape_mismatch("3 (2D) or 4 (3D) rows", points.shape()));
        }

        let len = points.ncols();
        for &(i, j) in &links {
            for index in [i, j] {
                if index >= len {
                    return Err(GeometryError::IndexOutOfRange { index, len });
                }
            }
        }

        Ok(Self {
            points: normalize_homogeneous(&points)?,
            links,
        })
    }

    /// Euclidean dimension of the points (2 or 3)
    pub fn dimension(&self) -> usize {
        self.points.nrows() - 1
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.points.ncols() == 0
    }

    /// Normalised homogeneous points, one per column
    pub fn points(&self) -> &DMatrix<f64> {
        &self.points
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    /// Euclidean coordinates of point `index`
    pub fn point(&self, index: usize) -> Result<Vec<f64>, GeometryError> {
        if index >= self.len() {
            return Err(GeometryError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        let dim = self.dimension();
        Ok(self.points.column(index).rows(0, dim).iter().copied().collect())
    }

    /// Endpoint coordinates for each link, in link order
    pub fn segments(&self) -> impl Iterator<Item = (Vec<f64>, Vec<f64>)> + '_ {
        let dim = self.dimension();
        self.links.iter().map(move |&(i, j)| {
            let a = self.points.column(i).rows(0, dim).iter().copied().collect();
            let b = self.points.column(j).rows(0, dim).iter().copied().collect();
            (a, b)
        })
    }
}
