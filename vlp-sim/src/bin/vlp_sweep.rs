//! Visible-light positioning dataset generator
//!
//! Builds a scene from a JSON configuration, sweeps the sensor through the
//! configured positions and writes one CSV row of received powers per position.
//!
//! # Usage
//!
//! ```bash
//! # Write the default configuration to edit
//! cargo run --release --bin vlp_sweep -- init-config scene.json
//!
//! # Generate a dataset (label columns first), with failure log and plot
//! cargo run --release --bin vlp_sweep -- run -c scene.json -o dataset.csv --plot sweep.svg
//!
//! # Same sweep evaluated on all cores, labels in the last columns
//! cargo run --release --bin vlp_sweep -- run -c scene.json -o dataset.csv --label last --parallel
//!
//! # Received power vector at a single position
//! cargo run --release --bin vlp_sweep -- probe -c scene.json 2.5,2.5,0.85
//! ```
//!
//! Set `RUST_LOG=debug` for per-sample logging.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use vlp_sim::dataset::{write_dataset_file, write_failures_file, LabelPlacement};
use vlp_sim::driver::{run_parallel, SimulationDriver, SweepReport, SweepState};
use vlp_sim::plot::render_sweep_svg;
use vlp_sim::shared_args::{PositionArg, SharedSimulationArgs};
use vlp_sim::SimulationConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration as JSON
    InitConfig {
        /// Destination file
        path: PathBuf,
    },

    /// Sweep the sensor and write the dataset
    Run {
        #[command(flatten)]
        shared: SharedSimulationArgs,

        /// Dataset CSV output
        #[arg(short, long, default_value = "vlp_dataset.csv")]
        output: PathBuf,

        /// Failure log CSV (defaults to `<output stem>_failures.csv`)
        #[arg(long)]
        failures: Option<PathBuf>,

        /// Position label columns, overriding the configuration
        #[arg(long, value_enum)]
        label: Option<LabelPlacement>,

        /// Evaluate positions on all cores
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Also render a top-down SVG of the sweep
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Print the received power vector at one sensor position
    Probe {
        #[command(flatten)]
        shared: SharedSimulationArgs,

        /// Sensor position "x,y,z" in meters
        position: PositionArg,
    },
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("Sweeping");
    pb
}

fn sweep(
    config: &SimulationConfig,
    parallel: bool,
) -> Result<SweepReport, Box<dyn std::error::Error>> {
    let scene = config.build_scene()?;
    let positions = config.sweep_positions()?;

    if parallel {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("Sweeping {} positions in parallel", positions.len()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        let report = run_parallel(&scene, &positions)?;
        spinner.finish_with_message("Done");
        return Ok(report);
    }

    let pb = progress_bar(positions.len() as u64);
    let mut driver = SimulationDriver::new(scene, positions)?;
    loop {
        match driver.step()? {
            SweepState::Sampled { .. } | SweepState::Aborted { .. } => pb.inc(1),
            SweepState::Finished => break,
            _ => {}
        }
    }
    pb.finish_with_message("Done");
    Ok(driver.into_report())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { path } => {
            SimulationConfig::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Commands::Run {
            shared,
            output,
            failures,
            label,
            parallel,
            plot,
        } => {
            let mut config = shared.load_config()?;
            if let Some(label) = label {
                config.dataset.label_placement = label;
            }

            let report = sweep(&config, parallel)?;

            let rows = write_dataset_file(&output, &report, &config.dataset)?;
            let failures_path = failures.unwrap_or_else(|| {
                let stem = output
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "vlp_dataset".to_string());
                output.with_file_name(format!("{stem}_failures.csv"))
            });
            let failed = write_failures_file(&failures_path, &report.failures)?;

            println!("Samples written: {rows} -> {}", output.display());
            println!("Failed positions: {failed} -> {}", failures_path.display());

            if let Some(plot_path) = plot {
                let scene = config.build_scene()?;
                render_sweep_svg(&plot_path, &config.room, &scene, &report)?;
                println!("Plot: {}", plot_path.display());
            }
        }
        Commands::Probe { shared, position } => {
            let config = shared.load_config()?;
            let mut scene = config.build_scene()?;
            scene.move_sensor(position.0);
            let power = scene.evaluate()?;

            println!("Sensor at {position}");
            for (receiver, pr) in scene.receivers().iter().zip(power.iter()) {
                let p = receiver.pose().position();
                println!(
                    "  receiver {:>3} at ({:.3}, {:.3}, {:.3}): {:.6e} W",
                    receiver.id, p.x, p.y, p.z, pr
                );
            }
            println!("  total: {:.6e} W", power.sum());
        }
    }

    Ok(())
}
