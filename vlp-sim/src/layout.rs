//! Room geometry and luminaire placement

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use vlp_math::{rotate_x, translation, Htm};

use crate::SimulationError;

/// Axis-aligned room with its floor corner at the world origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Extent along x
    pub width_m: f64,
    /// Extent along y
    pub depth_m: f64,
    /// Ceiling height
    pub height_m: f64,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            width_m: 5.0,
            depth_m: 5.0,
            height_m: 3.0,
        }
    }
}

impl Room {
    pub fn validate(&self) -> Result<(), SimulationError> {
        for (name, value) in [
            ("width_m", self.width_m),
            ("depth_m", self.depth_m),
            ("height_m", self.height_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulationError::InvalidConfig(format!(
                    "room {name} must be finite and positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a point lies inside the room (boundaries included)
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        (0.0..=self.width_m).contains(&x)
            && (0.0..=self.depth_m).contains(&y)
            && (0.0..=self.height_m).contains(&z)
    }
}

/// Where the emitters go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmitterLayout {
    /// `rows x cols` ceiling grid, each cell centred, all facing straight down
    Grid { rows: usize, cols: usize },
    /// Ceiling-mounted, downward facing emitters at explicit positions
    Positions { positions: Vec<[f64; 3]> },
}

impl Default for EmitterLayout {
    fn default() -> Self {
        EmitterLayout::Grid { rows: 2, cols: 2 }
    }
}

/// Downward-facing pose at `(x, y, z)`
pub fn ceiling_pose(x: f64, y: f64, z: f64) -> Htm {
    translation(x, y, z) * rotate_x(PI)
}

impl EmitterLayout {
    /// Emitter poses for this layout inside `room`
    pub fn poses(&self, room: &Room) -> Result<Vec<Htm>, SimulationError> {
        match self {
            EmitterLayout::Grid { rows, cols } => {
                if *rows == 0 || *cols == 0 {
                    return Err(SimulationError::InvalidConfig(format!(
                        "emitter grid needs at least one row and column, got {rows}x{cols}"
                    )));
                }
                let dx = room.width_m / *cols as f64;
                let dy = room.depth_m / *rows as f64;

                let mut poses = Vec::with_capacity(rows * cols);
                for r in 0..*rows {
                    for c in 0..*cols {
                        let x = (c as f64 + 0.5) * dx;
                        let y = (r as f64 + 0.5) * dy;
                        poses.push(ceiling_pose(x, y, room.height_m));
                    }
                }
                Ok(poses)
            }
            EmitterLayout::Positions { positions } => {
                if positions.is_empty() {
                    return Err(SimulationError::InvalidConfig(
                        "emitter position list is empty".to_string(),
                    ));
                }
                Ok(positions
                    .iter()
                    .map(|&[x, y, z]| ceiling_pose(x, y, z))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_grid_layout_centres_cells() {
        let room = Room {
            width_m: 4.0,
            depth_m: 2.0,
            height_m: 3.0,
        };
        let poses = EmitterLayout::Grid { rows: 1, cols: 2 }.poses(&room).unwrap();

        assert_eq!(poses.len(), 2);
        assert_relative_eq!(poses[0].position(), Vector3::new(1.0, 1.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(poses[1].position(), Vector3::new(3.0, 1.0, 3.0), epsilon = 1e-12);
        for pose in &poses {
            assert_relative_eq!(pose.z_axis(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_explicit_positions() {
        let layout = EmitterLayout::Positions {
            positions: vec![[0.5, 0.5, 2.5]],
        };
        let poses = layout.poses(&Room::default()).unwrap();
        assert_relative_eq!(poses[0].position(), Vector3::new(0.5, 0.5, 2.5), epsilon = 1e-12);

        let empty = EmitterLayout::Positions { positions: vec![] };
        assert!(empty.poses(&Room::default()).is_err());
    }

    #[test]
    fn test_empty_grid_rejected() {
        let layout = EmitterLayout::Grid { rows: 0, cols: 3 };
        assert!(layout.poses(&Room::default()).is_err());
    }

    #[test]
    fn test_room_contains() {
        let room = Room::default();
        assert!(room.contains(0.0, 2.5, 1.0));
        assert!(!room.contains(5.1, 2.5, 1.0));
        assert!(room.validate().is_ok());
        assert!(Room {
            height_m: 0.0,
            ..room
        }
        .validate()
        .is_err());
    }
}
