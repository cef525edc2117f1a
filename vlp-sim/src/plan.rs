//! Sensor sweep plans: the ordered positions the sensor visits

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::layout::Room;
use crate::SimulationError;

/// Sequence of sensor positions to sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepPlan {
    /// Regular `nx x ny` grid over the room floor at a fixed height,
    /// inset from the walls by `margin_m`. Row-major in y, then x.
    Grid {
        nx: usize,
        ny: usize,
        height_m: f64,
        margin_m: f64,
    },
    /// `steps` evenly spaced positions from `start` to `end` inclusive
    Line {
        start: [f64; 3],
        end: [f64; 3],
        steps: usize,
    },
    /// Explicit positions
    Positions { positions: Vec<[f64; 3]> },
}

impl Default for SweepPlan {
    fn default() -> Self {
        SweepPlan::Grid {
            nx: 20,
            ny: 20,
            height_m: 0.85,
            margin_m: 0.1,
        }
    }
}

fn evenly_spaced(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![(lo + hi) / 2.0],
        _ => (0..n)
            .map(|k| lo + (hi - lo) * k as f64 / (n - 1) as f64)
            .collect(),
    }
}

impl SweepPlan {
    /// Expand the plan into concrete positions
    ///
    /// # Errors
    /// * `SimulationError::InvalidConfig` - empty plan, margins wider than the
    ///   room, or non-finite coordinates
    pub fn positions(&self, room: &Room) -> Result<Vec<Vector3<f64>>, SimulationError> {
        let positions = match self {
            SweepPlan::Grid {
                nx,
                ny,
                height_m,
                margin_m,
            } => {
                if *nx == 0 || *ny == 0 {
                    return Err(SimulationError::InvalidConfig(format!(
                        "sweep grid needs at least one point per axis, got {nx}x{ny}"
                    )));
                }
                if !(*margin_m >= 0.0
                    && 2.0 * margin_m < room.width_m
                    && 2.0 * margin_m < room.depth_m)
                {
                    return Err(SimulationError::InvalidConfig(format!(
                        "sweep margin {margin_m} m does not fit a {}x{} m room",
                        room.width_m, room.depth_m
                    )));
                }

                let xs = evenly_spaced(*margin_m, room.width_m - margin_m, *nx);
                let ys = evenly_spaced(*margin_m, room.depth_m - margin_m, *ny);
                ys.iter()
                    .flat_map(|&y| xs.iter().map(move |&x| Vector3::new(x, y, *height_m)))
                    .collect::<Vec<_>>()
            }
            SweepPlan::Line { start, end, steps } => {
                if *steps == 0 {
                    return Err(SimulationError::InvalidConfig(
                        "sweep line needs at least one step".to_string(),
                    ));
                }
                let a = Vector3::from(*start);
                let b = Vector3::from(*end);
                if *steps == 1 {
                    vec![a]
                } else {
                    (0..*steps)
                        .map(|k| a + (b - a) * (k as f64 / (*steps - 1) as f64))
                        .collect()
                }
            }
            SweepPlan::Positions { positions } => {
                if positions.is_empty() {
                    return Err(SimulationError::InvalidConfig(
                        "sweep position list is empty".to_string(),
                    ));
                }
                positions.iter().map(|&p| Vector3::from(p)).collect()
            }
        };

        if let Some(bad) = positions.iter().find(|p| p.iter().any(|v| !v.is_finite())) {
            return Err(SimulationError::InvalidConfig(format!(
                "sweep position ({}, {}, {}) is not finite",
                bad.x, bad.y, bad.z
            )));
        }

        Ok(positions)
    }
}
