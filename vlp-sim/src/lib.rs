//! Visible-light positioning (VLP) simulator.
//!
//! Models LED emitters and photodiode receivers posed with homogeneous
//! transformation matrices, computes line-of-sight Lambertian received power
//! and sweeps a receiver array (the sensor) through a room to produce labelled
//! datasets for position estimation.
//!
//! The received power per receiver is the matrix product
//!
//! ```text
//! Pr = A · F · B · Pt
//! ```
//!
//! * `A` - diagonal receiver gains `Ar·Ts·n²/sin²(Psi)·R`
//! * `F` - geometric coupling `cos(φ)^m · cos(ψ) / r²`, zero outside the field of view
//! * `B` - diagonal Lambertian normalisation `(m + 1) / 2π`
//! * `Pt` - emitter transmit powers

pub mod config;
pub mod dataset;
pub mod driver;
pub mod hardware;
pub mod layout;
pub mod plan;
pub mod plot;
pub mod radiometry;
pub mod scene;
pub mod shared_args;

pub use config::SimulationConfig;
pub use driver::{Sample, SampleFailure, SimulationDriver, SweepReport, SweepState};
pub use hardware::{Emitter, Receiver, ReceiverParams, Sensor, SensorLayout};
pub use radiometry::{irradiance_incidence, LinkGeometry};
pub use scene::Scene;

use thiserror::Error;
use vlp_math::GeometryError;

/// Errors raised while building or evaluating a simulation
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Scene needs emitters and receivers (got {emitters} emitters, {receivers} receivers)")]
    EmptyScene { emitters: usize, receivers: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

impl SimulationError {
    /// Geometry failures are local to one sensor placement; everything else
    /// means the scene itself is broken.
    pub fn is_sample_level(&self) -> bool {
        matches!(self, SimulationError::Geometry(_))
    }
}
