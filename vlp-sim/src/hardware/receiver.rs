//! Photodiode receiver model

use serde::{Deserialize, Serialize};
use vlp_math::Htm;

use crate::SimulationError;

/// Physical parameters of a photodiode receiver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReceiverParams {
    /// Detector active area `Ar` in square meters
    pub active_area_m2: f64,
    /// Optical filter transmission `Ts`
    pub filter_gain: f64,
    /// Refractive index `n` of the concentrator
    pub refractive_index: f64,
    /// Responsivity `R` (A/W, or 1.0 to report optical power)
    pub responsivity: f64,
    /// Half field of view `Psi` in radians
    pub half_fov_rad: f64,
}

impl ReceiverParams {
    /// Check the parameters describe a physical receiver
    pub fn validate(&self) -> Result<(), SimulationError> {
        let positive = [
            ("active_area_m2", self.active_area_m2),
            ("filter_gain", self.filter_gain),
            ("refractive_index", self.refractive_index),
            ("responsivity", self.responsivity),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulationError::InvalidConfig(format!(
                    "receiver {name} must be finite and positive, got {value}"
                )));
            }
        }

        if !(self.half_fov_rad > 0.0 && self.half_fov_rad <= std::f64::consts::FRAC_PI_2) {
            return Err(SimulationError::InvalidConfig(format!(
                "receiver half field of view must be in (0, π/2] rad, got {}",
                self.half_fov_rad
            )));
        }

        Ok(())
    }

    /// Ideal non-imaging concentrator gain `n² / sin²(Psi)`
    pub fn concentrator_gain(&self) -> f64 {
        let s = self.half_fov_rad.sin();
        self.refractive_index * self.refractive_index / (s * s)
    }

    /// Scalar receiver gain `Ar · Ts · n²/sin²(Psi) · R` (one diagonal entry of `A`)
    pub fn gain(&self) -> f64 {
        self.active_area_m2 * self.filter_gain * self.concentrator_gain() * self.responsivity
    }
}

impl Default for ReceiverParams {
    /// 1 cm² photodiode, no filter loss, no concentrator, 70° half field of view
    fn default() -> Self {
        Self {
            active_area_m2: 1e-4,
            filter_gain: 1.0,
            refractive_index: 1.0,
            responsivity: 1.0,
            half_fov_rad: 70.0_f64.to_radians(),
        }
    }
}

/// A photodiode placed in the world.
///
/// `local_pose` is the pose inside the owning sensor frame and never changes;
/// `pose` is the world pose and is replaced whenever the sensor moves.
/// `received_power_w` is recomputed at every simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    /// Index of the receiver within its sensor
    pub id: usize,
    local_pose: Htm,
    pose: Htm,
    params: ReceiverParams,
    received_power_w: f64,
}

impl Receiver {
    /// Create a stand-alone receiver at a world pose
    pub fn new(id: usize, pose: Htm, params: ReceiverParams) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self {
            id,
            local_pose: pose,
            pose,
            params,
            received_power_w: 0.0,
        })
    }

    /// World pose
    pub fn pose(&self) -> &Htm {
        &self.pose
    }

    /// Pose relative to the owning sensor frame
    pub fn local_pose(&self) -> &Htm {
        &self.local_pose
    }

    pub fn params(&self) -> &ReceiverParams {
        &self.params
    }

    /// Received power `Pr` from the most recent evaluation
    pub fn received_power_w(&self) -> f64 {
        self.received_power_w
    }

    pub(crate) fn set_received_power(&mut self, power_w: f64) {
        self.received_power_w = power_w;
    }

    /// Re-derive the world pose from a new sensor pose
    pub(crate) fn attach_to(&mut self, sensor_pose: &Htm) {
        self.pose = sensor_pose * &self.local_pose;
    }
}
