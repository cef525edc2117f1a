use std::path::PathBuf;

use clap::Parser;
use nalgebra::Vector3;

use crate::config::SimulationConfig;
use crate::SimulationError;

/// Parse a position string in format "x,y,z" (meters)
pub fn parse_position(s: &str) -> Result<Vector3<f64>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("Position must be in format 'x,y,z'".to_string());
    }

    let mut coords = [0.0; 3];
    for (coord, (part, axis)) in coords.iter_mut().zip(parts.iter().zip(["x", "y", "z"])) {
        *coord = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid {axis} value: {}", part.trim()))?;
        if !coord.is_finite() {
            return Err(format!("{axis} must be finite"));
        }
    }

    Ok(Vector3::from(coords))
}

/// Wrapper for a sensor position with a compact Display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionArg(pub Vector3<f64>);

impl std::str::FromStr for PositionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_position(s).map(PositionArg)
    }
}

impl std::fmt::Display for PositionArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.0.x, self.0.y, self.0.z)
    }
}

/// Common arguments shared across simulation subcommands
#[derive(Parser, Debug, Clone)]
pub struct SharedSimulationArgs {
    /// Scene configuration file (JSON). Built-in defaults when omitted.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl SharedSimulationArgs {
    /// Load the configuration named on the command line, or the defaults
    pub fn load_config(&self) -> Result<SimulationConfig, SimulationError> {
        match &self.config {
            Some(path) => {
                if self.debug {
                    println!("Loading configuration from: {}", path.display());
                }
                SimulationConfig::load_from_file(path)
            }
            None => {
                log::info!("No configuration file given, using defaults");
                Ok(SimulationConfig::default())
            }
        }
    }
}
