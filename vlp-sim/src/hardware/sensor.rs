//! Receiver arrays moved as a rigid unit

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use vlp_math::{rotate_y, rotate_z, translation, Htm};

use super::receiver::{Receiver, ReceiverParams};
use crate::SimulationError;

/// Parallel x Meridian arrangement of receivers on a spherical cap.
///
/// Receiver `(i, j)` sits on parallel `i` (tilted `(i + 1) · max_tilt / P` from
/// the sensor z axis) and meridian `j` (azimuth `2πj / M`), at `radius_m` from
/// the sensor origin, facing outwards:
///
/// ```text
/// local = rotate_z(2πj/M) · rotate_y(tilt_i) · translation(0, 0, radius)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorLayout {
    /// Number of parallels (tilt rings)
    pub parallels: usize,
    /// Number of meridians (azimuth positions per ring)
    pub meridians: usize,
    /// Radius of the sphere the receivers are mounted on
    pub radius_m: f64,
    /// Tilt of the outermost parallel from the sensor z axis
    pub max_tilt_rad: f64,
}

impl Default for SensorLayout {
    fn default() -> Self {
        Self {
            parallels: 3,
            meridians: 6,
            radius_m: 0.02,
            max_tilt_rad: PI / 4.0,
        }
    }
}

impl SensorLayout {
    /// Total number of receivers
    pub fn receiver_count(&self) -> usize {
        self.parallels * self.meridians
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.parallels == 0 || self.meridians == 0 {
            return Err(SimulationError::InvalidConfig(format!(
                "sensor layout needs at least one parallel and one meridian, got {}x{}",
                self.parallels, self.meridians
            )));
        }
        if !(self.radius_m.is_finite() && self.radius_m >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "sensor radius must be finite and non-negative, got {}",
                self.radius_m
            )));
        }
        if !(self.max_tilt_rad >= 0.0 && self.max_tilt_rad <= FRAC_PI_2) {
            return Err(SimulationError::InvalidConfig(format!(
                "sensor max tilt must be in [0, π/2] rad, got {}",
                self.max_tilt_rad
            )));
        }
        Ok(())
    }

    /// Receiver poses in the sensor frame, parallel-major order
    pub fn local_poses(&self) -> Result<Vec<Htm>, SimulationError> {
        self.validate()?;

        let mut poses = Vec::with_capacity(self.receiver_count());
        for i in 0..self.parallels {
            let tilt = (i + 1) as f64 * self.max_tilt_rad / self.parallels as f64;
            for j in 0..self.meridians {
                let azimuth = 2.0 * PI * j as f64 / self.meridians as f64;
                let offset = translation(0.0, 0.0, self.radius_m);
                poses.push(rotate_z(azimuth) * rotate_y(tilt) * offset);
            }
        }
        Ok(poses)
    }
}

/// A group of receivers sharing a reference pose.
///
/// Each receiver keeps its pose within the sensor frame; moving the sensor
/// only replaces the sensor pose, so relative geometry is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pose: Htm,
    receivers: Vec<Receiver>,
}

impl Sensor {
    /// Group receivers under a sensor pose.
    ///
    /// The receivers' current poses are interpreted as sensor-frame poses.
    pub fn new(pose: Htm, receivers: Vec<Receiver>) -> Self {
        let mut sensor = Self { pose, receivers };
        sensor.set_pose(pose);
        sensor
    }

    /// Build a sensor from a Parallel x Meridian layout with identical receivers
    pub fn from_layout(
        layout: &SensorLayout,
        params: ReceiverParams,
        pose: Htm,
    ) -> Result<Self, SimulationError> {
        let receivers = layout
            .local_poses()?
            .into_iter()
            .enumerate()
            .map(|(id, local)| Receiver::new(id, local, params))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(pose, receivers))
    }

    pub fn pose(&self) -> &Htm {
        &self.pose
    }

    /// Replace the sensor pose and re-pose every receiver
    pub fn set_pose(&mut self, pose: Htm) {
        self.pose = pose;
        for receiver in &mut self.receivers {
            receiver.attach_to(&pose);
        }
    }

    /// Translate the sensor to `position`, keeping its orientation
    pub fn move_to(&mut self, position: Vector3<f64>) {
        let pose = self.pose.with_position(position);
        self.set_pose(pose);
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    pub(crate) fn receivers_mut(&mut self) -> &mut [Receiver] {
        &mut self.receivers
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}
