//! Low-precision apparent solar position (Meeus polynomial theory).
//!
//! Accurate to roughly an arcminute over the current century, which is
//! ample for twilight boundaries, phase-angle magnitudes and the Earth
//! barycentre used by the geocentric reduction.
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::angles::{altitude, ecliptic_to_equatorial, principal_angle};
use crate::constants::{Degree, Radian, MJD, T2000};
use crate::sites::Site;
use crate::time::{local_sidereal_time, mjd_utc};

/// Apparent solar coordinates at a given date.
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    /// Apparent right ascension, radians, [0, 2π).
    pub ra: Radian,
    /// Apparent declination, radians.
    pub dec: Radian,
    /// Apparent ecliptic longitude, radians.
    pub ecliptic_longitude: Radian,
    /// Earth-Sun distance, AU.
    pub distance_au: f64,
}

/// Compute the apparent geocentric solar position.
///
/// Mean longitude, mean anomaly and equation of the center from the Meeus
/// low-precision series, with the 0.00569° + 0.00478° sin Ω aberration and
/// nutation correction applied to the longitude.
///
/// # Arguments
/// * `mjd` - Modified Julian Date (UTC; the TT offset is negligible at
///   this precision)
pub fn solar_position(mjd: MJD) -> SolarPosition {
    let t = (mjd - T2000) / 36525.0;

    // Mean longitude and mean anomaly of the Sun, degrees.
    let mean_long = (280.46645 + t * (36000.76983 + t * 0.0003032)).rem_euclid(360.0);
    let mean_anom = (357.52910 + t * (35999.05030 - t * (0.0001559 - 0.00000048 * t))).rem_euclid(360.0);
    let m = mean_anom.to_radians();

    // Earth's orbital eccentricity.
    let earth_e = 0.016708617 - t * (0.000042037 - t * 0.0000001236);

    // Equation of the center, degrees.
    let eq_center = (1.914600 - t * (0.004817 - 0.000014 * t)) * m.sin()
        + (0.019993 - t * 0.000101) * (2.0 * m).sin()
        + 0.000290 * (3.0 * m).sin();

    let true_long = mean_long + eq_center;
    let true_anom = (mean_anom + eq_center).to_radians();

    let distance_au =
        1.000001018 * (1.0 - earth_e * earth_e) / (1.0 + earth_e * true_anom.cos());

    // Longitude of the ascending node of the Moon's orbit; corrects the
    // obliquity and apparent longitude for nutation and aberration.
    let omega = (125.04 - 1934.136 * t).to_radians();
    let eps0 = 23.439291111 - 0.013004167 * t;
    let eps = (eps0 + 0.00256 * omega.cos()).to_radians();

    let app_long = (true_long - 0.00569 - 0.00478 * omega.sin()).to_radians();

    let ra = principal_angle((eps.cos() * app_long.sin()).atan2(app_long.cos()));
    let dec = (eps.sin() * app_long.sin()).asin();

    SolarPosition {
        ra,
        dec,
        ecliptic_longitude: principal_angle(app_long),
        distance_au,
    }
}

/// Heliocentric position of the Earth in the equatorial J2000 frame, AU.
///
/// The opposite of the geocentric solar vector; the sub-arcminute error of
/// the solar theory maps to well under the 0.01 AU tolerance of the
/// light-time loop.
pub fn earth_heliocentric(mjd: MJD) -> Vector3<f64> {
    let sun = solar_position(mjd);
    let geocentric_sun = Vector3::new(
        sun.distance_au * sun.ecliptic_longitude.cos(),
        sun.distance_au * sun.ecliptic_longitude.sin(),
        0.0,
    );
    -ecliptic_to_equatorial(&geocentric_sun, 23.439291111)
}

/// Geometric altitude of the Sun above a site's horizon, degrees.
pub fn sun_altitude(epoch: Epoch, site: &Site) -> Degree {
    let sun = solar_position(mjd_utc(epoch));
    let lst = local_sidereal_time(epoch, site.longitude);
    altitude(site.latitude, sun.dec, lst - sun.ra).to_degrees()
}
