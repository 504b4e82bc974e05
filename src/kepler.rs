//! Two-body elliptical propagation.
//!
//! Solves Kepler's equation by Newton iteration and rotates the perifocal
//! position into the heliocentric ecliptic J2000 frame. This is the only
//! propagator in the crate; unbound orbits are rejected upstream by
//! [`crate::elements::OrbitalElements::validate`].
use nalgebra::Vector3;

use crate::angles::{principal_angle, rot_x, rot_z};
use crate::constants::{Radian, MJD};
use crate::elements::OrbitalElements;
use crate::errors::NeoschedError;

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-12;

/// Solve Kepler's equation `E - e sin E = M` for the eccentric anomaly.
///
/// Newton iteration seeded with `M` for moderate eccentricities and `π`
/// for highly eccentric orbits, where the naive seed can cycle.
///
/// Arguments
/// ---------
/// * `mean_anomaly`: mean anomaly in radians (any branch)
/// * `eccentricity`: orbital eccentricity, must be in [0, 1)
///
/// Return
/// ------
/// * the eccentric anomaly in radians, on the same branch reduced to
///   [0, 2π), or [`NeoschedError::KeplerNotConverged`]
pub fn solve_kepler(mean_anomaly: Radian, eccentricity: f64) -> Result<Radian, NeoschedError> {
    let m = principal_angle(mean_anomaly);
    let mut ecc_anomaly = if eccentricity < 0.8 { m } else { std::f64::consts::PI };

    for _ in 0..MAX_ITERATIONS {
        let f = ecc_anomaly - eccentricity * ecc_anomaly.sin() - m;
        let fp = 1.0 - eccentricity * ecc_anomaly.cos();
        let delta = f / fp;
        ecc_anomaly -= delta;
        if delta.abs() < TOLERANCE {
            return Ok(ecc_anomaly);
        }
    }
    Err(NeoschedError::KeplerNotConverged {
        mean_anomaly: m,
        eccentricity,
    })
}

/// Heliocentric ecliptic J2000 position of a target at a TT date, in AU.
///
/// The element set must already satisfy
/// [`validate`](crate::elements::OrbitalElements::validate); the caller is
/// expected to have checked it once per propagation run rather than per
/// tick.
pub fn heliocentric_position(
    elements: &OrbitalElements,
    mjd_tt: MJD,
) -> Result<Vector3<f64>, NeoschedError> {
    let a = elements.semi_major()?;
    let e = elements.eccentricity;
    let m = elements.mean_anomaly_at(mjd_tt)?;
    let ecc_anomaly = solve_kepler(m, e)?;

    // Perifocal plane coordinates.
    let x = a * (ecc_anomaly.cos() - e);
    let y = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();
    let perifocal = Vector3::new(x, y, 0.0);

    let rot = rot_z(-elements.ascending_node.to_radians())
        * rot_x(-elements.inclination.to_radians())
        * rot_z(-elements.arg_perihelion.to_radians());
    Ok(rot * perifocal)
}
