//! Line-of-sight radiometry between an emitter and a receiver pose.
//!
//! The emitter radiates with a generalised Lambertian pattern of order `m`
//! along its local z axis; the receiver collects along its own local z axis
//! and accepts nothing beyond its half field of view `Psi`.

use std::f64::consts::{FRAC_PI_2, LN_2, PI};

use nalgebra::Vector3;
use vlp_math::{GeometryError, Htm};

/// Angles and range of a single emitter -> receiver link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkGeometry {
    /// Angle between the emitter's principal axis and the line to the receiver
    pub irradiance_rad: f64,
    /// Angle between the receiver's principal axis and the line back to the emitter
    pub incidence_rad: f64,
    /// Euclidean distance between emitter and receiver
    pub distance_m: f64,
}

/// Compute irradiance angle, incidence angle and distance for a link.
///
/// With `l = p_R - p_E` the irradiance angle is measured between the emitter z
/// axis and `l`, the incidence angle between the receiver z axis and `-l`.
/// Both lie in `[0, π]`.
///
/// # Errors
/// * `GeometryError::DegenerateGeometry` - emitter and receiver positions coincide
pub fn irradiance_incidence(emitter: &Htm, receiver: &Htm) -> Result<LinkGeometry, GeometryError> {
    let l = receiver.position() - emitter.position();
    let distance_m = l.norm();

    if !(distance_m > f64::EPSILON) {
        return Err(GeometryError::DegenerateGeometry(format!(
            "emitter and receiver are collocated at ({:.3}, {:.3}, {:.3})",
            emitter.position().x,
            emitter.position().y,
            emitter.position().z
        )));
    }

    Ok(LinkGeometry {
        irradiance_rad: angle_to(&emitter.z_axis(), &l, distance_m),
        incidence_rad: angle_to(&receiver.z_axis(), &(-l), distance_m),
        distance_m,
    })
}

fn angle_to(axis: &Vector3<f64>, direction: &Vector3<f64>, direction_norm: f64) -> f64 {
    let cos = axis.dot(direction) / (axis.norm() * direction_norm);
    // Rounding can push |cos| a hair past 1 for aligned vectors
    cos.clamp(-1.0, 1.0).acos()
}

/// Lambertian mode number from the half-power semi-angle `Φ½`:
/// `m = -ln 2 / ln(cos Φ½)`.
///
/// # Errors
/// * `GeometryError::InvalidArgument` - angle outside `(0, π/2)`
pub fn lambertian_order_from_half_angle(
    half_power_semi_angle_rad: f64,
) -> Result<f64, GeometryError> {
    if !(half_power_semi_angle_rad > 0.0 && half_power_semi_angle_rad < FRAC_PI_2) {
        return Err(GeometryError::InvalidArgument(format!(
            "half-power semi-angle must be in (0, π/2) rad, got {half_power_semi_angle_rad}"
        )));
    }
    Ok(-LN_2 / half_power_semi_angle_rad.cos().ln())
}

/// Radiant intensity normalisation `(m + 1) / 2π` of a Lambertian source
pub fn lambertian_normalization(lambertian_order: f64) -> f64 {
    (lambertian_order + 1.0) / (2.0 * PI)
}

/// Geometric coupling factor `cos(φ)^m · cos(ψ) / r²` for a link.
///
/// Exactly zero when the incidence angle exceeds `half_fov_rad` or the
/// receiver sits behind the emitter (`φ > π/2`).
pub fn coupling_factor(link: &LinkGeometry, lambertian_order: f64, half_fov_rad: f64) -> f64 {
    if link.incidence_rad > half_fov_rad || link.irradiance_rad > FRAC_PI_2 {
        return 0.0;
    }

    link.irradiance_rad.cos().powf(lambertian_order) * link.incidence_rad.cos()
        / (link.distance_m * link.distance_m)
}
