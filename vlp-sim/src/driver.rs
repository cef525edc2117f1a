//! Sweep driver state machine.
//!
//! Moves the sensor through a list of positions and records the received
//! power vector at each one:
//! Configured -> Posed -> Sampled -> Posed -> ... -> Finished
//!
//! A geometric failure at one position (a receiver collocated with an emitter)
//! moves the driver to `Aborted` for that step. The failure is recorded in the
//! report so the dataset never silently loses a row.

use nalgebra::{DVector, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scene::Scene;
use crate::SimulationError;

/// Driver states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepState {
    /// Scene built, static matrices computed, no position applied yet
    Configured,
    /// Sensor placed at position `step`, coupling and received power computed
    Posed { step: usize },
    /// Received power for `step` recorded as a dataset row
    Sampled { step: usize },
    /// Position `step` failed and was recorded as a failure
    Aborted { step: usize },
    /// All positions visited
    Finished,
}

/// One dataset row: where the sensor was and what every receiver saw
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Index of the originating position in the sweep
    pub index: usize,
    /// Sensor position (ground-truth label)
    pub position: Vector3<f64>,
    /// Received power per receiver, in sensor receiver order
    pub received_power: DVector<f64>,
}

/// A position that could not be evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFailure {
    pub index: usize,
    pub position: Vector3<f64>,
    pub reason: String,
}

/// Everything a sweep produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Receivers per sample, fixed by the scene even when every position fails
    pub receivers: usize,
    pub samples: Vec<Sample>,
    pub failures: Vec<SampleFailure>,
}

impl SweepReport {
    /// Number of positions visited
    pub fn attempted(&self) -> usize {
        self.samples.len() + self.failures.len()
    }
}

/// Evaluate the scene with the sensor at `position`.
///
/// The outer error is reserved for scene-level problems; a sample-level
/// geometric failure comes back as `Ok(Err(SampleFailure))`.
fn evaluate_at(
    scene: &mut Scene,
    index: usize,
    position: Vector3<f64>,
) -> Result<Result<Sample, SampleFailure>, SimulationError> {
    scene.move_sensor(position);
    match scene.evaluate() {
        Ok(received_power) => Ok(Ok(Sample {
            index,
            position,
            received_power,
        })),
        Err(e) if e.is_sample_level() => Ok(Err(SampleFailure {
            index,
            position,
            reason: e.to_string(),
        })),
        Err(e) => Err(e),
    }
}

/// Sequential sweep over sensor positions
pub struct SimulationDriver {
    scene: Scene,
    positions: Vec<Vector3<f64>>,
    state: SweepState,
    pending: Option<Sample>,
    report: SweepReport,
}

impl SimulationDriver {
    /// Create a driver in the `Configured` state
    ///
    /// # Errors
    /// * `SimulationError::EmptyScene` - the scene has no emitters or no receivers
    pub fn new(scene: Scene, positions: Vec<Vector3<f64>>) -> Result<Self, SimulationError> {
        if scene.emitters().is_empty() || scene.receivers().is_empty() {
            return Err(SimulationError::EmptyScene {
                emitters: scene.emitters().len(),
                receivers: scene.receivers().len(),
            });
        }

        let report = SweepReport {
            receivers: scene.receivers().len(),
            ..SweepReport::default()
        };

        Ok(Self {
            scene,
            positions,
            state: SweepState::Configured,
            pending: None,
            report,
        })
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Total number of positions in the sweep
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Results gathered so far
    pub fn report(&self) -> &SweepReport {
        &self.report
    }

    /// Place the sensor at `step`, or finish if the sweep is exhausted
    fn pose(&mut self, step: usize) -> Result<SweepState, SimulationError> {
        let Some(&position) = self.positions.get(step) else {
            log::info!(
                "Sweep finished: {} samples, {} failures",
                self.report.samples.len(),
                self.report.failures.len()
            );
            return Ok(SweepState::Finished);
        };

        match evaluate_at(&mut self.scene, step, position)? {
            Ok(sample) => {
                log::debug!(
                    "Step {step}: sensor at ({:.3}, {:.3}, {:.3}), total Pr {:.4e} W",
                    position.x,
                    position.y,
                    position.z,
                    sample.received_power.sum()
                );
                self.pending = Some(sample);
                Ok(SweepState::Posed { step })
            }
            Err(failure) => {
                log::warn!("Step {step} aborted: {}", failure.reason);
                self.report.failures.push(failure);
                Ok(SweepState::Aborted { step })
            }
        }
    }

    /// Advance by one transition and return the new state
    pub fn step(&mut self) -> Result<SweepState, SimulationError> {
        use SweepState::*;

        let next = match self.state {
            Configured => {
                log::info!("Starting sweep over {} positions", self.positions.len());
                self.pose(0)?
            }
            Posed { step } => {
                if let Some(sample) = self.pending.take() {
                    self.report.samples.push(sample);
                }
                Sampled { step }
            }
            Sampled { step } | Aborted { step } => self.pose(step + 1)?,
            Finished => Finished,
        };

        self.state = next;
        Ok(next)
    }

    /// Run the sweep to completion
    pub fn run(mut self) -> Result<SweepReport, SimulationError> {
        while self.step()? != SweepState::Finished {}
        Ok(self.report)
    }

    /// Consume the driver and return whatever was gathered
    pub fn into_report(self) -> SweepReport {
        self.report
    }
}

/// Evaluate every position concurrently, each worker on its own scene copy.
///
/// Rows come back in position order and carry their originating index.
pub fn run_parallel(
    scene: &Scene,
    positions: &[Vector3<f64>],
) -> Result<SweepReport, SimulationError> {
    if scene.emitters().is_empty() || scene.receivers().is_empty() {
        return Err(SimulationError::EmptyScene {
            emitters: scene.emitters().len(),
            receivers: scene.receivers().len(),
        });
    }

    log::info!("Starting parallel sweep over {} positions", positions.len());

    let results = positions
        .par_iter()
        .enumerate()
        .map_init(
            || scene.clone(),
            |local, (index, &position)| evaluate_at(local, index, position),
        )
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = SweepReport {
        receivers: scene.receivers().len(),
        ..SweepReport::default()
    };
    for result in results {
        match result {
            Ok(sample) => report.samples.push(sample),
            Err(failure) => {
                log::warn!("Position {} aborted: {}", failure.index, failure.reason);
                report.failures.push(failure);
            }
        }
    }

    log::info!(
        "Parallel sweep finished: {} samples, {} failures",
        report.samples.len(),
        report.failures.len()
    );
    Ok(report)
}
