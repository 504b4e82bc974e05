//! Angle utilities shared by the ephemeris and visibility modules.
use crate::constants::{Degree, Radian, DPI};
use nalgebra::{Matrix3, Vector3};

/// Reduce an angle to the fundamental interval [0, 2π).
///
/// Argument
/// --------
/// * `a`: angle in radians
///
/// Return
/// ------
/// * the same angle wrapped into [0, 2π)
pub fn principal_angle(a: Radian) -> Radian {
    a.rem_euclid(DPI)
}

/// Angular separation between two directions on the sphere, in radians.
///
/// Uses the haversine form, stable for both small and near-antipodal
/// separations.
///
/// Arguments
/// ---------
/// * `ra1`, `dec1`: first direction in radians
/// * `ra2`, `dec2`: second direction in radians
pub fn separation(ra1: Radian, dec1: Radian, ra2: Radian, dec2: Radian) -> Radian {
    let sdlat = ((dec2 - dec1) / 2.0).sin();
    let sdlon = ((ra2 - ra1) / 2.0).sin();
    let h = sdlat * sdlat + dec1.cos() * dec2.cos() * sdlon * sdlon;
    2.0 * h.sqrt().clamp(-1.0, 1.0).asin()
}

/// Position angle of direction 2 as seen from direction 1, East of North,
/// in radians, in [0, 2π).
pub fn position_angle(ra1: Radian, dec1: Radian, ra2: Radian, dec2: Radian) -> Radian {
    let dra = ra2 - ra1;
    let y = dra.sin() * dec2.cos();
    let x = dec2.sin() * dec1.cos() - dec2.cos() * dec1.sin() * dra.cos();
    principal_angle(y.atan2(x))
}

/// Geometric altitude above the horizon, in radians.
///
/// Arguments
/// ---------
/// * `latitude`: geodetic latitude of the observer, radians
/// * `dec`: declination of the target, radians
/// * `hour_angle`: local hour angle (LST - RA), radians
pub fn altitude(latitude: Radian, dec: Radian, hour_angle: Radian) -> Radian {
    (latitude.sin() * dec.sin() + latitude.cos() * dec.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0)
        .asin()
}

/// Rotation matrix about the x axis by `angle` radians.
pub fn rot_x(angle: Radian) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Rotation matrix about the z axis by `angle` radians.
pub fn rot_z(angle: Radian) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Rotate an ecliptic J2000 vector into the equatorial J2000 frame.
pub fn ecliptic_to_equatorial(v: &Vector3<f64>, obliquity_deg: Degree) -> Vector3<f64> {
    rot_x(-obliquity_deg.to_radians()) * v
}

/// Right ascension and declination (radians) of a cartesian direction.
/// RA is wrapped into [0, 2π).
pub fn radec_from_vector(v: &Vector3<f64>) -> (Radian, Radian) {
    let r = v.norm();
    let ra = principal_angle(v.y.atan2(v.x));
    let dec = (v.z / r).asin();
    (ra, dec)
}
