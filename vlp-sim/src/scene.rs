//! Scene model: emitters, a sensor, and the `Pr = A·F·B·Pt` system.
//!
//! `A`, `B` and `Pt` depend only on the static physical parameters and are
//! built once per scene. `F` depends on every pose and is rebuilt at each
//! evaluation.

use nalgebra::{DMatrix, DVector, Vector3};
use vlp_math::{GeometryError, Htm};

use crate::hardware::{Emitter, Receiver, Sensor};
use crate::radiometry::{coupling_factor, irradiance_incidence, lambertian_normalization};
use crate::SimulationError;

/// Receiver matrix `A`: diagonal `n_r x n_r`, one gain per receiver
pub fn receiver_matrix(receivers: &[Receiver]) -> DMatrix<f64> {
    let gains = DVector::from_iterator(
        receivers.len(),
        receivers.iter().map(|r| r.params().gain()),
    );
    DMatrix::from_diagonal(&gains)
}

/// Emitter matrix `B`: diagonal `n_e x n_e` of Lambertian normalisations `(m + 1) / 2π`
pub fn emitter_matrix(emitters: &[Emitter]) -> DMatrix<f64> {
    let norms = DVector::from_iterator(
        emitters.len(),
        emitters.iter().map(|e| lambertian_normalization(e.lambertian_order())),
    );
    DMatrix::from_diagonal(&norms)
}

/// Transmit power vector `Pt`
pub fn transmit_vector(emitters: &[Emitter]) -> DVector<f64> {
    DVector::from_iterator(emitters.len(), emitters.iter().map(|e| e.power_w()))
}

/// Single coupling entry between one emitter and one receiver
pub fn coupling_term(emitter: &Emitter, receiver: &Receiver) -> Result<f64, GeometryError> {
    let link = irradiance_incidence(emitter.pose(), receiver.pose())?;
    Ok(coupling_factor(
        &link,
        emitter.lambertian_order(),
        receiver.params().half_fov_rad,
    ))
}

/// Coupling matrix `F` (`n_r x n_e`), entry `(i, j)` couples emitter `j` to receiver `i`.
///
/// # Errors
/// * `SimulationError::Geometry` - an emitter and receiver are collocated
pub fn coupling_matrix(
    receivers: &[Receiver],
    emitters: &[Emitter],
) -> Result<DMatrix<f64>, SimulationError> {
    let mut f = DMatrix::zeros(receivers.len(), emitters.len());
    for (i, receiver) in receivers.iter().enumerate() {
        for (j, emitter) in emitters.iter().enumerate() {
            f[(i, j)] = coupling_term(emitter, receiver).map_err(|e| match e {
                GeometryError::DegenerateGeometry(msg) => GeometryError::DegenerateGeometry(
                    format!("receiver {} / emitter {}: {msg}", receiver.id, emitter.id),
                ),
                other => other,
            })?;
        }
    }
    Ok(f)
}

/// Received power `Pr = A·F·B·Pt`.
///
/// # Errors
/// * `SimulationError::DimensionMismatch` - the four operands do not chain
pub fn received_power(
    a: &DMatrix<f64>,
    f: &DMatrix<f64>,
    b: &DMatrix<f64>,
    pt: &DVector<f64>,
) -> Result<DVector<f64>, SimulationError> {
    if !a.is_square() || !b.is_square() {
        return Err(SimulationError::DimensionMismatch(format!(
            "A ({}x{}) and B ({}x{}) must be square",
            a.nrows(),
            a.ncols(),
            b.nrows(),
            b.ncols()
        )));
    }
    if a.ncols() != f.nrows() || f.ncols() != b.nrows() || b.ncols() != pt.len() {
        return Err(SimulationError::DimensionMismatch(format!(
            "cannot chain A ({}x{}) · F ({}x{}) · B ({}x{}) · Pt ({})",
            a.nrows(),
            a.ncols(),
            f.nrows(),
            f.ncols(),
            b.nrows(),
            b.ncols(),
            pt.len()
        )));
    }

    Ok(a * (f * (b * pt)))
}

/// Emitters plus a sensor, with the static matrices cached.
#[derive(Debug, Clone)]
pub struct Scene {
    emitters: Vec<Emitter>,
    sensor: Sensor,
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    pt: DVector<f64>,
}

impl Scene {
    /// Build a scene and compute the static matrices `A`, `B` and `Pt`.
    ///
    /// # Errors
    /// * `SimulationError::EmptyScene` - no emitters or no receivers
    pub fn new(emitters: Vec<Emitter>, sensor: Sensor) -> Result<Self, SimulationError> {
        if emitters.is_empty() || sensor.is_empty() {
            return Err(SimulationError::EmptyScene {
                emitters: emitters.len(),
                receivers: sensor.len(),
            });
        }

        let a = receiver_matrix(sensor.receivers());
        let b = emitter_matrix(&emitters);
        let pt = transmit_vector(&emitters);

        log::debug!(
            "Scene configured with {} emitters and {} receivers",
            emitters.len(),
            sensor.len()
        );

        Ok(Self {
            emitters,
            sensor,
            a,
            b,
            pt,
        })
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    pub fn receivers(&self) -> &[Receiver] {
        self.sensor.receivers()
    }

    /// Receiver matrix `A`
    pub fn receiver_matrix(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// Emitter matrix `B`
    pub fn emitter_matrix(&self) -> &DMatrix<f64> {
        &self.b
    }

    /// Transmit power vector `Pt`
    pub fn transmit_vector(&self) -> &DVector<f64> {
        &self.pt
    }

    /// Translate the sensor, keeping its orientation
    pub fn move_sensor(&mut self, position: Vector3<f64>) {
        self.sensor.move_to(position);
    }

    /// Replace the sensor pose
    pub fn set_sensor_pose(&mut self, pose: Htm) {
        self.sensor.set_pose(pose);
    }

    /// Replace one emitter's pose. `B` and `Pt` are unaffected.
    pub fn set_emitter_pose(&mut self, index: usize, pose: Htm) -> Result<(), SimulationError> {
        let len = self.emitters.len();
        let emitter = self
            .emitters
            .get_mut(index)
            .ok_or(GeometryError::IndexOutOfRange { index, len })?;
        emitter.set_pose(pose);
        Ok(())
    }

    /// Coupling matrix `F` for the current poses
    pub fn coupling(&self) -> Result<DMatrix<f64>, SimulationError> {
        coupling_matrix(self.sensor.receivers(), &self.emitters)
    }

    /// Recompute `F` and `Pr` for the current poses and store `Pr` on each receiver.
    pub fn evaluate(&mut self) -> Result<DVector<f64>, SimulationError> {
        let f = self.coupling()?;
        let pr = received_power(&self.a, &f, &self.b, &self.pt)?;

        for (receiver, &power) in self.sensor.receivers_mut().iter_mut().zip(pr.iter()) {
            receiver.set_received_power(power);
        }

        Ok(pr)
    }
}
