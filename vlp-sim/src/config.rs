//! Scene and sweep configuration, stored as JSON.

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use vlp_math::Htm;

use crate::dataset::DatasetLayout;
use crate::hardware::{Emitter, ReceiverParams, Sensor, SensorLayout};
use crate::layout::{EmitterLayout, Room};
use crate::plan::SweepPlan;
use crate::scene::Scene;
use crate::SimulationError;

/// Luminaire settings shared by every emitter in the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub layout: EmitterLayout,
    /// Transmitted optical power per emitter
    pub power_w: f64,
    /// Lambertian mode number `m`
    pub lambertian_order: f64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            layout: EmitterLayout::default(),
            power_w: 1.0,
            lambertian_order: 1.0,
        }
    }
}

/// Everything needed to build a scene and sweep it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub room: Room,
    pub emitters: EmitterConfig,
    /// Parameters applied to every receiver of the sensor
    pub receivers: ReceiverParams,
    pub sensor: SensorLayout,
    pub sweep: SweepPlan,
    pub dataset: DatasetLayout,
}

impl SimulationConfig {
    /// Check every section, reporting the first problem found
    pub fn validate(&self) -> Result<(), SimulationError> {
        self.room.validate()?;
        self.sensor.validate()?;
        self.receivers.validate()?;

        if !(self.emitters.power_w.is_finite() && self.emitters.power_w >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "emitter power must be finite and non-negative, got {}",
                self.emitters.power_w
            )));
        }
        if !(self.emitters.lambertian_order.is_finite() && self.emitters.lambertian_order >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "Lambertian order must be finite and non-negative, got {}",
                self.emitters.lambertian_order
            )));
        }

        for pose in self.emitters.layout.poses(&self.room)? {
            let p = pose.position();
            if !self.room.contains(p.x, p.y, p.z) {
                log::warn!(
                    "Emitter at ({:.2}, {:.2}, {:.2}) lies outside the room",
                    p.x,
                    p.y,
                    p.z
                );
            }
        }

        self.sweep.positions(&self.room)?;
        Ok(())
    }

    /// Build the scene with the sensor at the first sweep position
    pub fn build_scene(&self) -> Result<Scene, SimulationError> {
        self.validate()?;

        let emitters = self
            .emitters
            .layout
            .poses(&self.room)?
            .into_iter()
            .enumerate()
            .map(|(id, pose)| {
                Emitter::new(
                    id,
                    pose,
                    self.emitters.power_w,
                    self.emitters.lambertian_order,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let start = self
            .sweep
            .positions(&self.room)?
            .first()
            .copied()
            .unwrap_or_else(Vector3::zeros);
        let sensor = Sensor::from_layout(
            &self.sensor,
            self.receivers,
            Htm::identity().with_position(start),
        )?;

        log::info!(
            "Built scene: {} emitters, {} receivers in a {}x{}x{} m room",
            emitters.len(),
            sensor.len(),
            self.room.width_m,
            self.room.depth_m,
            self.room.height_m
        );
        Scene::new(emitters, sensor)
    }

    /// Sensor positions of the configured sweep
    pub fn sweep_positions(&self) -> Result<Vec<Vector3<f64>>, SimulationError> {
        self.sweep.positions(&self.room)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SimulationError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file. Missing sections fall back to their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, SimulationError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
