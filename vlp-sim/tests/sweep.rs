//! End-to-end sweeps: scene -> driver -> dataset

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use approx::assert_relative_eq;
use nalgebra::Vector3;
use vlp_math::{rotate_x, translation, Htm};
use vlp_sim::dataset::{write_dataset_file, write_failures_file, DatasetLayout, LabelPlacement};
use vlp_sim::driver::{run_parallel, SimulationDriver};
use vlp_sim::plan::SweepPlan;
use vlp_sim::{Emitter, Receiver, ReceiverParams, Scene, Sensor, SimulationConfig, SimulationError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn receiver_params(half_fov_rad: f64) -> ReceiverParams {
    ReceiverParams {
        active_area_m2: 0.01,
        filter_gain: 1.0,
        refractive_index: 1.0,
        responsivity: 1.0,
        half_fov_rad,
    }
}

/// One downward emitter at (0, 0, 2) and one upward receiver on the floor
fn single_link_scene(half_fov_rad: f64) -> Scene {
    let emitter = Emitter::new(0, translation(0.0, 0.0, 2.0) * rotate_x(PI), 1.0, 1.0).unwrap();
    let receiver = Receiver::new(0, Htm::identity(), receiver_params(half_fov_rad)).unwrap();
    Scene::new(vec![emitter], Sensor::new(Htm::identity(), vec![receiver])).unwrap()
}

#[test]
fn test_closed_form_single_link() {
    init_logging();
    let report = SimulationDriver::new(single_link_scene(FRAC_PI_2), vec![Vector3::zeros()])
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.samples.len(), 1);
    assert_relative_eq!(
        report.samples[0].received_power[0],
        0.01 / (4.0 * PI),
        epsilon = 1e-15
    );
}

#[test]
fn test_field_of_view_cutoff_is_discontinuous() {
    init_logging();
    let mut scene = single_link_scene(FRAC_PI_4);

    // Incidence angle atan(d / 2) crosses π/4 at d = 2
    scene.move_sensor(Vector3::new(1.99, 0.0, 0.0));
    let inside = scene.evaluate().unwrap()[0];
    scene.move_sensor(Vector3::new(2.01, 0.0, 0.0));
    let outside = scene.evaluate().unwrap()[0];

    assert!(inside > 1e-5, "just inside the FOV should still see light, got {inside}");
    assert_eq!(outside, 0.0);
}

#[test]
fn test_inverse_square_falloff_on_axis() {
    let mut scene = single_link_scene(FRAC_PI_2);
    scene.move_sensor(Vector3::new(0.0, 0.0, 1.0));
    let near = scene.evaluate().unwrap()[0];
    scene.move_sensor(Vector3::new(0.0, 0.0, 0.0));
    let far = scene.evaluate().unwrap()[0];

    assert_relative_eq!(near / far, 4.0, epsilon = 1e-12);
}

#[test]
fn test_collocated_position_becomes_failure_row() {
    init_logging();
    let positions = vec![
        Vector3::new(0.5, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 2.0),
        Vector3::new(-0.5, 0.0, 0.0),
    ];

    let report = SimulationDriver::new(single_link_scene(FRAC_PI_2), positions.clone())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.samples.len() + report.failures.len(), positions.len());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_relative_eq!(report.failures[0].position, positions[1]);

    // Symmetric positions either side of the emitter see the same power
    assert_relative_eq!(
        report.samples[0].received_power[0],
        report.samples[1].received_power[0],
        epsilon = 1e-15
    );
}

#[test]
fn test_empty_scene_rejected() {
    let sensor = Sensor::new(Htm::identity(), vec![]);
    let emitter = Emitter::new(0, translation(0.0, 0.0, 2.0), 1.0, 1.0).unwrap();
    assert!(matches!(
        Scene::new(vec![emitter], sensor),
        Err(SimulationError::EmptyScene { .. })
    ));
}

#[test]
fn test_parallel_sweep_matches_sequential() {
    init_logging();
    let config = SimulationConfig {
        sweep: SweepPlan::Grid {
            nx: 7,
            ny: 5,
            height_m: 0.85,
            margin_m: 0.2,
        },
        ..SimulationConfig::default()
    };
    let scene = config.build_scene().unwrap();
    let positions = config.sweep_positions().unwrap();

    let sequential = SimulationDriver::new(scene.clone(), positions.clone())
        .unwrap()
        .run()
        .unwrap();
    let parallel = run_parallel(&scene, &positions).unwrap();

    assert_eq!(sequential.samples.len(), 35);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_configured_sweep_to_csv() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("scene.json");
    let dataset_path = dir.path().join("dataset.csv");
    let failures_path = dir.path().join("failures.csv");

    let mut config = SimulationConfig::default();
    config.sweep = SweepPlan::Line {
        start: [0.5, 2.5, 0.85],
        end: [4.5, 2.5, 0.85],
        steps: 11,
    };
    config.dataset = DatasetLayout {
        label_placement: LabelPlacement::Last,
        include_z: true,
    };
    config.save_to_file(&config_path).unwrap();

    let config = SimulationConfig::load_from_file(&config_path).unwrap();
    let scene = config.build_scene().unwrap();
    let positions = config.sweep_positions().unwrap();
    let report = SimulationDriver::new(scene, positions)
        .unwrap()
        .run()
        .unwrap();

    let rows = write_dataset_file(&dataset_path, &report, &config.dataset).unwrap();
    let failed = write_failures_file(&failures_path, &report.failures).unwrap();
    assert_eq!(rows, 11);
    assert_eq!(failed, 0);

    let mut rdr = csv::Reader::from_path(&dataset_path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    let receivers = config.sensor.receiver_count();
    assert_eq!(header.len(), receivers + 3);
    assert_eq!(header[0], "pr_0");
    assert_eq!(header[receivers..], ["x", "y", "z"]);

    let records: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 11);
    let x_last: f64 = records[10][receivers].parse().unwrap();
    assert_relative_eq!(x_last, 4.5, epsilon = 1e-12);

    // Every row sees some light under the default 2x2 ceiling grid
    for record in &records {
        let total: f64 = record
            .iter()
            .take(receivers)
            .map(|v| v.parse::<f64>().unwrap())
            .sum();
        assert!(total > 0.0);
    }
}

#[test]
fn test_parallel_sweep_reports_collocated_position() {
    init_logging();
    let positions = vec![
        Vector3::new(0.5, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 2.0),
        Vector3::new(-0.5, 0.0, 0.0),
    ];

    let report = run_parallel(&single_link_scene(FRAC_PI_2), &positions).unwrap();

    assert_eq!(report.samples.len() + report.failures.len(), positions.len());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    let indices: Vec<usize> = report.samples.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 2]);
}

#[test]
fn test_all_failed_sweep_keeps_dataset_columns() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("dataset.csv");

    // Every position sits on the emitter
    let positions = vec![Vector3::new(0.0, 0.0, 2.0); 3];
    let report = run_parallel(&single_link_scene(FRAC_PI_2), &positions).unwrap();
    assert!(report.samples.is_empty());
    assert_eq!(report.failures.len(), 3);

    let rows = write_dataset_file(&dataset_path, &report, &DatasetLayout::default()).unwrap();
    assert_eq!(rows, 0);

    let mut rdr = csv::Reader::from_path(&dataset_path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, ["x", "y", "z", "pr_0"]);
    assert_eq!(rdr.records().count(), 0);
}
