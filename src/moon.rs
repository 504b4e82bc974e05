//! Low-precision lunar position and phase.
//!
//! Truncated ELP series (the dominant Meeus terms), good to a few
//! arcminutes. The Moon only ever enters the scheduler as a separation
//! cutoff of tens of degrees and a phase gate, so this is far more
//! precision than the decisions need.
use hifitime::Epoch;

use crate::angles::{altitude, principal_angle, separation};
use crate::constants::{Degree, Radian, MJD, T2000};
use crate::sites::Site;
use crate::sun::solar_position;
use crate::time::{local_sidereal_time, mjd_utc};

/// Geocentric apparent equatorial coordinates of the Moon, radians.
pub fn moon_radec(mjd: MJD) -> (Radian, Radian) {
    let t = (mjd - T2000) / 36525.0;

    // Fundamental arguments, degrees.
    let lp = 218.3164477 + 481267.88123421 * t; // mean longitude
    let d = (297.8501921 + 445267.1114034 * t).to_radians(); // mean elongation
    let m = (357.5291092 + 35999.0502909 * t).to_radians(); // Sun mean anomaly
    let mp = (134.9633964 + 477198.8675055 * t).to_radians(); // Moon mean anomaly
    let f = (93.2720950 + 483202.0175233 * t).to_radians(); // argument of latitude

    // Principal longitude terms, degrees.
    let lon = lp
        + 6.288774 * mp.sin()
        + 1.274027 * (2.0 * d - mp).sin()
        + 0.658314 * (2.0 * d).sin()
        + 0.213618 * (2.0 * mp).sin()
        - 0.185116 * m.sin()
        - 0.114332 * (2.0 * f).sin()
        + 0.058793 * (2.0 * d - 2.0 * mp).sin()
        + 0.057066 * (2.0 * d - m - mp).sin()
        + 0.053322 * (2.0 * d + mp).sin()
        + 0.045758 * (2.0 * d - m).sin();

    // Principal latitude terms, degrees.
    let lat = 5.128122 * f.sin()
        + 0.280602 * (mp + f).sin()
        + 0.277693 * (mp - f).sin()
        + 0.173237 * (2.0 * d - f).sin()
        + 0.055413 * (2.0 * d - mp + f).sin()
        + 0.046271 * (2.0 * d - mp - f).sin();

    let lon = principal_angle(lon.to_radians());
    let lat = lat.to_radians();

    let eps = (23.439291111 - 0.013004167 * t).to_radians();
    let ra = principal_angle(
        (lon.sin() * eps.cos() - lat.tan() * eps.sin()).atan2(lon.cos()),
    );
    let dec = (lat.sin() * eps.cos() + lat.cos() * eps.sin() * lon.sin()).asin();
    (ra, dec)
}

/// Geometric altitude of the Moon above a site's horizon, degrees.
pub fn moon_altitude(epoch: Epoch, site: &Site) -> Degree {
    let (ra, dec) = moon_radec(mjd_utc(epoch));
    let lst = local_sidereal_time(epoch, site.longitude);
    altitude(site.latitude, dec, lst - ra).to_degrees()
}

/// Angular separation between the Moon and a target direction, degrees.
pub fn moon_separation(epoch: Epoch, target_ra: Radian, target_dec: Radian) -> Degree {
    let (moon_ra, moon_dec) = moon_radec(mjd_utc(epoch));
    separation(moon_ra, moon_dec, target_ra, target_dec).to_degrees()
}

/// Illuminated fraction of the Moon's disk, in [0, 1].
///
/// Uses the cos i = -cos φ approximation of the phase angle (Meeus p.345,
/// in error by at most 0.0014 in the phase).
pub fn moon_phase(epoch: Epoch) -> f64 {
    let mjd = mjd_utc(epoch);
    let (moon_ra, moon_dec) = moon_radec(mjd);
    let sun = solar_position(mjd);
    let cos_phi = separation(sun.ra, sun.dec, moon_ra, moon_dec).cos();
    ((1.0 - cos_phi) / 2.0).clamp(0.0, 1.0)
}
