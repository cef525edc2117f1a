//! Top-down SVG rendering of a finished sweep.
//!
//! Samples are coloured by total received power (blue low, red high), failed
//! positions are crosses and emitters are triangles. Drawing only reads the
//! report and scene; nothing here feeds back into the simulation.

use std::path::Path;

use nalgebra::DMatrix;
use plotters::prelude::*;
use vlp_math::PointLinks;

use crate::driver::SweepReport;
use crate::layout::Room;
use crate::scene::Scene;
use crate::SimulationError;

const PLOT_WIDTH_PX: u32 = 800;

/// Room floor outline as homogeneous 2D corners joined in order
pub fn room_outline(room: &Room) -> Result<PointLinks, SimulationError> {
    let (w, d) = (room.width_m, room.depth_m);
    #[rustfmt::skip]
    let corners = DMatrix::from_row_slice(3, 4, &[
        0.0, w,   w,   0.0,
        0.0, 0.0, d,   d,
        1.0, 1.0, 1.0, 1.0,
    ]);
    Ok(PointLinks::new(corners, vec![(0, 1), (1, 2), (2, 3), (3, 0)])?)
}

/// Map `value` in `[0, max]` onto a blue-to-red hue
fn power_color(value: f64, max: f64) -> HSLColor {
    let t = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    HSLColor((1.0 - t) * 0.66, 0.85, 0.5)
}

/// Render the sweep to an SVG file at `path`
///
/// # Errors
/// * `SimulationError::Plot` - the backend could not draw or write the file
pub fn render_sweep_svg(
    path: &Path,
    room: &Room,
    scene: &Scene,
    report: &SweepReport,
) -> Result<(), SimulationError> {
    let outline = room_outline(room)?;
    draw(path, room, &outline, scene, report).map_err(|e| SimulationError::Plot(e.to_string()))?;
    log::info!("Saved sweep plot to {}", path.display());
    Ok(())
}

fn draw(
    path: &Path,
    room: &Room,
    outline: &PointLinks,
    scene: &Scene,
    report: &SweepReport,
) -> Result<(), Box<dyn std::error::Error>> {
    let height_px = ((PLOT_WIDTH_PX as f64) * room.depth_m / room.width_m).round() as u32;
    let root = SVGBackend::new(path, (PLOT_WIDTH_PX, height_px.max(200))).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.margin(10, 10, 10, 10);

    let mut chart = ChartBuilder::on(&root)
        .caption("Total received power", ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..room.width_m, 0.0..room.depth_m)?;

    chart
        .configure_mesh()
        .x_desc("x (m)")
        .y_desc("y (m)")
        .draw()?;

    chart.draw_series(outline.segments().map(|(a, b)| {
        PathElement::new(vec![(a[0], a[1]), (b[0], b[1])], BLACK.stroke_width(2))
    }))?;

    let totals: Vec<f64> = report
        .samples
        .iter()
        .map(|s| s.received_power.sum())
        .collect();
    let max_total = totals.iter().copied().fold(0.0, f64::max);

    chart.draw_series(report.samples.iter().zip(&totals).map(|(sample, &total)| {
        Circle::new(
            (sample.position.x, sample.position.y),
            4,
            power_color(total, max_total).filled(),
        )
    }))?;

    chart.draw_series(report.failures.iter().map(|failure| {
        Cross::new(
            (failure.position.x, failure.position.y),
            5,
            RED.stroke_width(2),
        )
    }))?;

    chart.draw_series(scene.emitters().iter().map(|emitter| {
        let p = emitter.pose().position();
        TriangleMarker::new((p.x, p.y), 8, BLACK.filled())
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::driver::run_parallel;
    use crate::plan::SweepPlan;

    #[test]
    fn test_room_outline_is_closed() {
        let room = Room::default();
        let outline = room_outline(&room).unwrap();
        let segments: Vec<_> = outline.segments().collect();

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3].1, segments[0].0);
        assert_eq!(segments[1].1, vec![5.0, 5.0]);
    }

    #[test]
    fn test_power_color_range() {
        assert_eq!(power_color(0.0, 1.0).0, 0.66);
        assert_eq!(power_color(1.0, 1.0).0, 0.0);
        assert_eq!(power_color(5.0, 0.0).0, 0.66);
    }

    #[test]
    fn test_render_sweep() {
        let config = SimulationConfig {
            sweep: SweepPlan::Grid {
                nx: 4,
                ny: 4,
                height_m: 0.85,
                margin_m: 0.5,
            },
            ..SimulationConfig::default()
        };
        let scene = config.build_scene().unwrap();
        let report = run_parallel(&scene, &config.sweep_positions().unwrap()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.svg");
        render_sweep_svg(&path, &config.room, &scene, &report).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }
}
