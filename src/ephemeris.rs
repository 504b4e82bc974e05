//! # Ephemeris engine
//!
//! Computes apparent positions and observing circumstances for a target at
//! a site. The reduction chain is:
//!
//! 1. Earth heliocentric position from the low-precision solar theory.
//! 2. Topocentric offset from the site's geocentric parallax coordinates
//!    rotated to the local sidereal time.
//! 3. Two-body propagation of the target, iterated for light travel time
//!    until the observer distance changes by less than 0.01 AU.
//! 4. Apparent magnitude from the H-G phase model (asteroids) or the
//!    `H + 5 log10 Δ + 2.5 G log10 r` law (comets).
//! 5. Sky-motion rate and position angle by finite differencing over one
//!    minute.
//!
//! The element set is borrowed immutably and validated once per call;
//! batch callers that propagate a grid should treat a returned error as
//! fatal for that target, not for the batch.
use hifitime::{Epoch, Unit};
use nalgebra::Vector3;

use crate::angles::{
    altitude, ecliptic_to_equatorial, position_angle, principal_angle, radec_from_vector,
    separation,
};
use crate::constants::{ArcSec, Degree, ERAU, OBLIQUITY_J2000, TAU_LIGHT_DAY};
use crate::elements::{ObjectKind, OrbitalElements};
use crate::errors::NeoschedError;
use crate::kepler::heliocentric_position;
use crate::moon::{moon_altitude, moon_phase, moon_separation};
use crate::sites::Site;
use crate::sun::{earth_heliocentric, sun_altitude};
use crate::time::{local_sidereal_time, mjd_tt};

/// A single ephemeris line: where the target is and what the sky is doing
/// at one instant, from one site.
#[derive(Debug, Clone)]
pub struct EphemerisPoint {
    pub epoch: Epoch,
    /// Apparent right ascension, degrees, [0, 360).
    pub ra: Degree,
    /// Apparent declination, degrees, [-90, 90].
    pub dec: Degree,
    /// Predicted V magnitude; `None` when the elements carry no H.
    pub magnitude: Option<f64>,
    /// Geometric altitude above the site horizon, degrees.
    /// Zero for the geocenter pseudo-site.
    pub altitude: Degree,
    /// Total apparent sky motion, arcsec/minute.
    pub sky_motion: ArcSec,
    /// Direction of motion, degrees East of North.
    pub sky_motion_pa: Degree,
    /// Sun altitude at the site, degrees.
    pub sun_altitude: Degree,
    /// Target-Moon separation, degrees.
    pub moon_separation: Degree,
    /// Moon altitude at the site, degrees.
    pub moon_altitude: Degree,
    /// Illuminated lunar fraction, [0, 1].
    pub moon_phase: f64,
    /// Observer-target distance Δ, AU.
    pub earth_distance: f64,
    /// Heliocentric distance r, AU.
    pub sun_distance: f64,
}

impl EphemerisPoint {
    /// South polar distance (90° + Dec), the North/South routing metric.
    pub fn south_polar_distance(&self) -> Degree {
        90.0 + self.dec
    }
}

/// Astrometric state used internally and by the finite-difference motion
/// estimate.
struct ObserverState {
    /// Observer → target vector, equatorial, AU.
    topocentric: Vector3<f64>,
    /// Heliocentric distance of the target, AU.
    sun_distance: f64,
    /// Observer → target distance, AU.
    earth_distance: f64,
    /// Squared Sun-observer distance, AU².
    sun_observer_sq: f64,
}

fn observer_state(
    elements: &OrbitalElements,
    epoch: Epoch,
    site: &Site,
) -> Result<ObserverState, NeoschedError> {
    let tt = mjd_tt(epoch);

    let mut observer = earth_heliocentric(tt);
    if !site.is_geocenter() {
        let lst = local_sidereal_time(epoch, site.longitude);
        let (rho_cos, rho_sin) = site.parallax_coords();
        observer += ERAU * Vector3::new(rho_cos * lst.cos(), rho_cos * lst.sin(), rho_sin);
    }

    // Light-time iteration: repropagate at the retarded epoch until the
    // distance estimate moves by less than 0.01 AU.
    let mut previous: f64 = -100.0;
    let mut delta: f64 = 0.0;
    let mut ltt_days = 0.0;
    let mut topocentric = Vector3::zeros();
    let mut target = Vector3::zeros();
    while (delta - previous).abs() > 0.01 {
        previous = delta;
        let ecliptic = heliocentric_position(elements, tt - ltt_days)?;
        target = ecliptic_to_equatorial(&ecliptic, OBLIQUITY_J2000);
        topocentric = target - observer;
        delta = topocentric.norm();
        ltt_days = TAU_LIGHT_DAY * delta;
    }

    Ok(ObserverState {
        topocentric,
        sun_distance: target.norm(),
        earth_distance: delta,
        sun_observer_sq: observer.norm_squared(),
    })
}

/// H-G phase function magnitude (asteroids) or the two-parameter comet
/// law. `None` when no absolute magnitude is available.
fn apparent_magnitude(elements: &OrbitalElements, state: &ObserverState) -> Option<f64> {
    let h = elements.abs_mag?;
    let g = elements.slope;
    let r = state.sun_distance;
    let delta = state.earth_distance;
    match elements.kind {
        ObjectKind::Comet => Some(h + 5.0 * delta.log10() + 2.5 * g * r.log10()),
        ObjectKind::Asteroid => {
            // Phase angle β: Sun-target-observer.
            let cos_beta =
                ((r * r + delta * delta - state.sun_observer_sq) / (2.0 * r * delta)).clamp(-1.0, 1.0);
            let beta = cos_beta.acos();
            let tan_half = (beta / 2.0).tan();
            let phi1 = (-3.33 * tan_half.powf(0.63)).exp();
            let phi2 = (-1.87 * tan_half.powf(1.22)).exp();
            Some(h + 5.0 * (r * delta).log10() - 2.5 * ((1.0 - g) * phi1 + g * phi2).log10())
        }
        ObjectKind::ArtificialSatellite => None,
    }
}

/// Compute a full ephemeris line for one target, instant and site.
///
/// Arguments
/// ---------
/// * `elements`: validated further in here; bad sets fail fast
/// * `epoch`: UTC instant of the prediction
/// * `site`: observing site (the geocenter `500` yields zero altitudes)
///
/// Return
/// ------
/// * an [`EphemerisPoint`], or the propagation/validation error
pub fn compute_ephemeris(
    elements: &OrbitalElements,
    epoch: Epoch,
    site: &Site,
) -> Result<EphemerisPoint, NeoschedError> {
    elements.validate()?;

    let state = observer_state(elements, epoch, site)?;
    let (ra_rad, dec_rad) = radec_from_vector(&state.topocentric);

    let alt = if site.is_geocenter() {
        0.0
    } else {
        let lst = local_sidereal_time(epoch, site.longitude);
        altitude(site.latitude, dec_rad, lst - ra_rad).to_degrees()
    };

    // Finite-difference sky motion over one minute; includes the diurnal
    // parallax term for topocentric sites, as the planner wants.
    let later = epoch + Unit::Minute * 1.0;
    let state_later = observer_state(elements, later, site)?;
    let (ra2, dec2) = radec_from_vector(&state_later.topocentric);
    let sky_motion = separation(ra_rad, dec_rad, ra2, dec2).to_degrees() * 3600.0;
    let sky_motion_pa = position_angle(ra_rad, dec_rad, ra2, dec2).to_degrees();

    Ok(EphemerisPoint {
        epoch,
        ra: principal_angle(ra_rad).to_degrees(),
        dec: dec_rad.to_degrees(),
        magnitude: apparent_magnitude(elements, &state),
        altitude: alt,
        sky_motion,
        sky_motion_pa,
        sun_altitude: sun_altitude(epoch, site),
        moon_separation: moon_separation(epoch, ra_rad, dec_rad),
        moon_altitude: moon_altitude(epoch, site),
        moon_phase: moon_phase(epoch),
        earth_distance: state.earth_distance,
        sun_distance: state.sun_distance,
    })
}

#[cfg(test)]
mod ephemeris_test {
    use super::*;
    use crate::sites::get_site;
    use std::str::FromStr;

    fn main_belt() -> OrbitalElements {
        OrbitalElements::asteroid(
            Epoch::from_str("2025-01-01T00:00:00").unwrap(),
            Some(15.0),
            0.15,
            0.12,
            8.0,
            75.0,
            310.0,
            2.4,
            122.0,
        )
    }

    #[test]
    fn test_geocentric_point_ranges() {
        let site = get_site("500").unwrap();
        let epoch = Epoch::from_str("2025-02-15T06:00:00").unwrap();
        let point = compute_ephemeris(&main_belt(), epoch, site).unwrap();

        assert!((0.0..360.0).contains(&point.ra));
        assert!((-90.0..=90.0).contains(&point.dec));
        assert_eq!(point.altitude, 0.0);
        assert!(point.earth_distance > 1.0 && point.earth_distance < 4.0);
        // r must stay inside the orbit's radial range.
        assert!(point.sun_distance >= 2.4 * (1.0 - 0.12) - 1e-9);
        assert!(point.sun_distance <= 2.4 * (1.0 + 0.12) + 1e-9);
        assert!(point.sky_motion > 0.0 && point.sky_motion < 10.0);
        assert!((0.0..360.0).contains(&point.sky_motion_pa));
        assert!((0.0..=1.0).contains(&point.moon_phase));
        assert!(point.magnitude.is_some());
    }

    #[test]
    fn test_light_time_iteration_settles() {
        // A close-in orbit forces the retarded-epoch loop through more
        // than one pass; the state it settles on must be geometrically
        // consistent (triangle Sun-observer-target).
        let el = OrbitalElements::asteroid(
            Epoch::from_str("2025-01-01T00:00:00").unwrap(),
            Some(20.0),
            0.15,
            0.2,
            3.0,
            40.0,
            90.0,
            1.1,
            350.0,
        );
        let site = get_site("500").unwrap();
        let epoch = Epoch::from_str("2025-02-15T06:00:00").unwrap();
        let state = observer_state(&el, epoch, site).unwrap();
        assert!(state.earth_distance > 0.0 && state.earth_distance.is_finite());
        assert!((state.topocentric.norm() - state.earth_distance).abs() < 1e-12);
        let sun_observer = state.sun_observer_sq.sqrt();
        assert!(state.earth_distance <= state.sun_distance + sun_observer + 1e-9);
        assert!(state.sun_distance <= state.earth_distance + sun_observer + 1e-9);
    }

    #[test]
    fn test_no_abs_mag_no_magnitude() {
        let mut el = main_belt();
        el.abs_mag = None;
        let site = get_site("500").unwrap();
        let epoch = Epoch::from_str("2025-02-15T06:00:00").unwrap();
        let point = compute_ephemeris(&el, epoch, site).unwrap();
        assert!(point.magnitude.is_none());
    }

    #[test]
    fn test_invalid_elements_rejected() {
        let mut el = main_belt();
        el.eccentricity = 1.5;
        let site = get_site("V37").unwrap();
        let epoch = Epoch::from_str("2025-02-15T06:00:00").unwrap();
        assert!(compute_ephemeris(&el, epoch, site).is_err());
    }

    #[test]
    fn test_elements_not_mutated() {
        let el = main_belt();
        let snapshot = el.clone();
        let site = get_site("V37").unwrap();
        let epoch = Epoch::from_str("2025-02-15T06:00:00").unwrap();
        let _ = compute_ephemeris(&el, epoch, site).unwrap();
        assert_eq!(el, snapshot);
    }

    #[test]
    fn test_topocentric_parallax_is_small() {
        // A main-belt object at >1 AU: topocentric displacement under ~10".
        let el = main_belt();
        let epoch = Epoch::from_str("2025-02-15T06:00:00").unwrap();
        let geo = compute_ephemeris(&el, epoch, get_site("500").unwrap()).unwrap();
        let topo = compute_ephemeris(&el, epoch, get_site("V37").unwrap()).unwrap();
        let shift = separation(
            geo.ra.to_radians(),
            geo.dec.to_radians(),
            topo.ra.to_radians(),
            topo.dec.to_radians(),
        )
        .to_degrees()
            * 3600.0;
        assert!(shift > 0.0 && shift < 10.0, "parallax shift {shift} arcsec");
    }

    #[test]
    fn test_asteroid_magnitude_zero_phase() {
        // At zero phase angle phi1 = phi2 = 1 and the phase term vanishes.
        let el = main_belt();
        let state = ObserverState {
            topocentric: Vector3::new(1.0, 0.0, 0.0),
            sun_distance: 2.0,
            earth_distance: 1.0,
            // Observer on the Sun-target line: R = r - Δ.
            sun_observer_sq: 1.0,
        };
        let mag = apparent_magnitude(&el, &state).unwrap();
        assert!((mag - (15.0 + 5.0 * 2.0_f64.log10())).abs() < 1e-12);
    }

    #[test]
    fn test_comet_magnitude_law() {
        let el = OrbitalElements::comet(
            Epoch::from_str("2025-01-01T00:00:00").unwrap(),
            Some(8.0),
            4.0,
            0.4,
            12.0,
            50.0,
            200.0,
            1.5,
            Epoch::from_str("2025-03-01T00:00:00").unwrap(),
        );
        let state = ObserverState {
            topocentric: Vector3::new(1.0, 0.0, 0.0),
            sun_distance: 2.0,
            earth_distance: 1.5,
            sun_observer_sq: 1.0,
        };
        let mag = apparent_magnitude(&el, &state).unwrap();
        let expected = 8.0 + 5.0 * 1.5_f64.log10() + 2.5 * 4.0 * 2.0_f64.log10();
        assert!((mag - expected).abs() < 1e-12);
    }
}
