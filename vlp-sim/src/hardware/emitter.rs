//! LED emitter model

use vlp_math::Htm;

use crate::radiometry::lambertian_order_from_half_angle;
use crate::SimulationError;

/// A Lambertian optical emitter.
///
/// Power and mode number are fixed at construction. The pose can be
/// reassigned (replaced wholesale) to try different luminaire layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    /// Index of the emitter within its scene
    pub id: usize,
    pose: Htm,
    power_w: f64,
    lambertian_order: f64,
}

impl Emitter {
    /// Create an emitter
    ///
    /// # Arguments
    /// * `id` - Index of the emitter within its scene
    /// * `pose` - World pose; the local z axis is the optical axis
    /// * `power_w` - Transmitted optical power `Pb` in watts
    /// * `lambertian_order` - Lambertian mode number `m`
    ///
    /// # Errors
    /// * `SimulationError::InvalidConfig` - negative or non-finite power or mode number
    pub fn new(
        id: usize,
        pose: Htm,
        power_w: f64,
        lambertian_order: f64,
    ) -> Result<Self, SimulationError> {
        if !(power_w.is_finite() && power_w >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "emitter {id}: transmit power must be finite and non-negative, got {power_w}"
            )));
        }
        if !(lambertian_order.is_finite() && lambertian_order >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "emitter {id}: Lambertian order must be finite and >= 0, got {lambertian_order}"
            )));
        }

        Ok(Self {
            id,
            pose,
            power_w,
            lambertian_order,
        })
    }

    /// Create an emitter whose mode number is derived from its half-power semi-angle
    pub fn with_half_power_angle(
        id: usize,
        pose: Htm,
        power_w: f64,
        half_power_semi_angle_rad: f64,
    ) -> Result<Self, SimulationError> {
        let m = lambertian_order_from_half_angle(half_power_semi_angle_rad)?;
        Self::new(id, pose, power_w, m)
    }

    pub fn pose(&self) -> &Htm {
        &self.pose
    }

    /// Replace the emitter pose
    pub fn set_pose(&mut self, pose: Htm) {
        self.pose = pose;
    }

    /// Transmitted optical power `Pb` in watts
    pub fn power_w(&self) -> f64 {
        self.power_w
    }

    /// Lambertian mode number `m`
    pub fn lambertian_order(&self) -> f64 {
        self.lambertian_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;
    use vlp_math::{rotate_x, translation};

    #[test]
    fn test_emitter_creation() {
        let pose = translation(1.0, 2.0, 3.0) * rotate_x(PI);
        let emitter = Emitter::new(3, pose, 2.5, 1.0).unwrap();
        assert_eq!(emitter.id, 3);
        assert_eq!(emitter.power_w(), 2.5);
        assert_eq!(emitter.lambertian_order(), 1.0);
        assert_eq!(emitter.pose(), &pose);
    }

    #[test]
    fn test_emitter_rejects_bad_parameters() {
        assert!(Emitter::new(0, Htm::identity(), -1.0, 1.0).is_err());
        assert!(Emitter::new(0, Htm::identity(), 1.0, f64::NAN).is_err());
        assert!(Emitter::new(0, Htm::identity(), 1.0, -0.5).is_err());
    }

    #[test]
    fn test_emitter_from_half_power_angle() {
        let emitter = Emitter::with_half_power_angle(0, Htm::identity(), 1.0, PI / 3.0).unwrap();
        assert_relative_eq!(emitter.lambertian_order(), 1.0, epsilon = 1e-12);

        let err = Emitter::with_half_power_angle(0, Htm::identity(), 1.0, 2.0).unwrap_err();
        assert!(matches!(err, SimulationError::Geometry(_)));
    }

    #[test]
    fn test_set_pose_replaces_pose() {
        let mut emitter = Emitter::new(0, Htm::identity(), 1.0, 1.0).unwrap();
        let moved = translation(0.0, 0.0, 3.0);
        emitter.set_pose(moved);
        assert_eq!(emitter.pose(), &moved);
    }
}
