//! CSV export of sweep results.
//!
//! One row per successful sample: the sensor position label plus one column
//! per receiver (`pr_0`, `pr_1`, ...). Whether the label sits in the first or
//! last columns is configurable. Failed positions go to a separate log so the
//! dataset and the failures together account for every position visited.

use std::io::Write;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::driver::{SampleFailure, SweepReport};
use crate::SimulationError;

/// Where the position label columns go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelPlacement {
    #[default]
    First,
    Last,
}

impl std::fmt::Display for LabelPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelPlacement::First => write!(f, "first"),
            LabelPlacement::Last => write!(f, "last"),
        }
    }
}

/// Column layout of the exported dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetLayout {
    pub label_placement: LabelPlacement,
    /// Emit the z coordinate as a label column
    pub include_z: bool,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            label_placement: LabelPlacement::First,
            include_z: true,
        }
    }
}

impl DatasetLayout {
    fn label_names(&self) -> &'static [&'static str] {
        if self.include_z {
            &["x", "y", "z"]
        } else {
            &["x", "y"]
        }
    }

    /// Column names for a sensor with `receivers` receivers
    pub fn header(&self, receivers: usize) -> Vec<String> {
        let labels = self.label_names().iter().map(|s| s.to_string());
        let powers = (0..receivers).map(|i| format!("pr_{i}"));
        match self.label_placement {
            LabelPlacement::First => labels.chain(powers).collect(),
            LabelPlacement::Last => powers.chain(labels).collect(),
        }
    }
}

/// Write every sample of `report` as CSV.
///
/// The header always carries one `pr_*` column per receiver of the swept
/// sensor, so a sweep in which every position failed still produces the full
/// column layout.
///
/// # Errors
/// * `SimulationError::DimensionMismatch` - a sample disagrees with the report's receiver count
/// * `SimulationError::Csv` - the writer failed
pub fn write_dataset<W: Write>(
    writer: W,
    report: &SweepReport,
    layout: &DatasetLayout,
) -> Result<usize, SimulationError> {
    let receivers = report.receivers;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(layout.header(receivers))?;

    for sample in &report.samples {
        if sample.received_power.len() != receivers {
            return Err(SimulationError::DimensionMismatch(format!(
                "sample {} has {} receivers, expected {receivers}",
                sample.index,
                sample.received_power.len()
            )));
        }

        let label = sample
            .position
            .iter()
            .take(layout.label_names().len())
            .map(|v| v.to_string());
        let powers = sample.received_power.iter().map(|v| v.to_string());

        match layout.label_placement {
            LabelPlacement::First => wtr.write_record(label.chain(powers))?,
            LabelPlacement::Last => wtr.write_record(powers.chain(label))?,
        }
    }

    wtr.flush()?;
    Ok(report.samples.len())
}

/// Write the dataset to `path`, returning the number of rows written
pub fn write_dataset_file<P: AsRef<Path>>(
    path: P,
    report: &SweepReport,
    layout: &DatasetLayout,
) -> Result<usize, SimulationError> {
    let file = std::fs::File::create(path.as_ref())?;
    let rows = write_dataset(file, report, layout)?;
    log::info!("Wrote {rows} samples to {}", path.as_ref().display());
    Ok(rows)
}

/// Write the failure log: `index,x,y,z,reason`
pub fn write_failures<W: Write>(
    writer: W,
    failures: &[SampleFailure],
) -> Result<usize, SimulationError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["index", "x", "y", "z", "reason"])?;
    for failure in failures {
        wtr.write_record([
            failure.index.to_string(),
            failure.position.x.to_string(),
            failure.position.y.to_string(),
            failure.position.z.to_string(),
            failure.reason.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(failures.len())
}

pub fn write_failures_file<P: AsRef<Path>>(
    path: P,
    failures: &[SampleFailure],
) -> Result<usize, SimulationError> {
    let file = std::fs::File::create(path.as_ref())?;
    let rows = write_failures(file, failures)?;
    if rows > 0 {
        log::warn!("{rows} failed positions logged to {}", path.as_ref().display());
    }
    Ok(rows)
}
