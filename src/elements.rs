//! # Orbital element sets
//!
//! This module defines [`OrbitalElements`], the classical element
//! representation every scheduling decision starts from, together with
//! [`ObjectKind`] which selects the propagation and magnitude model.
//!
//! ## Representation
//!
//! The six Keplerian parameters are stored in the units the ingestion
//! pipeline delivers them in:
//!
//! 1. **e** – Eccentricity (unitless)
//! 2. **i** – Inclination (degrees)
//! 3. **Ω** – Longitude of ascending node (degrees)
//! 4. **ω** – Argument of perihelion (degrees)
//! 5. **a, M** – Semi-major axis (AU) and mean anomaly at epoch (degrees),
//!    for asteroids
//! 6. **q, T** – Perihelion distance (AU) and epoch of perihelion, for
//!    comets
//!
//! plus the reference epoch and the photometric parameters **H** (absolute
//! magnitude, optional) and **G** (slope).
//!
//! ## Invariants
//!
//! Only bound elliptical orbits (`0 <= e < 1`) are propagated. Hyperbolic
//! and parabolic sets, and the `ArtificialSatellite` kind (TLE-driven in the
//! wider system), are rejected by [`OrbitalElements::validate`] with a
//! dedicated error rather than silently producing garbage. Every consumer
//! borrows the elements immutably; propagation never mutates them.
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, GAUSS_GRAV, MJD};
use crate::errors::NeoschedError;

/// Dynamical class of a target, selecting the propagation and magnitude
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Minor planet: `a`/`M` elements, H-G phase function.
    Asteroid,
    /// Comet: `q`/`T` elements, `H + 5 log10 Δ + 2.5 G log10 r` magnitude.
    Comet,
    /// TLE-driven object, propagated elsewhere in the system.
    ArtificialSatellite,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Asteroid => write!(f, "asteroid"),
            ObjectKind::Comet => write!(f, "comet"),
            ObjectKind::ArtificialSatellite => write!(f, "artificial satellite"),
        }
    }
}

/// Heliocentric osculating elements of a single target.
///
/// Angles are in degrees, distances in AU, the reference epoch on the TT
/// scale. Fields that do not apply to the object's kind are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub kind: ObjectKind,
    /// Reference epoch of the osculating elements.
    pub epoch: Epoch,
    /// Absolute magnitude H; `None` when photometry is not yet available.
    pub abs_mag: Option<f64>,
    /// Phase slope parameter G (asteroids) or activity parameter (comets).
    pub slope: f64,
    pub eccentricity: f64,
    pub inclination: Degree,
    pub ascending_node: Degree,
    pub arg_perihelion: Degree,
    /// Semi-major axis in AU (asteroids).
    pub semi_major_axis: Option<f64>,
    /// Mean anomaly at `epoch` in degrees (asteroids).
    pub mean_anomaly: Option<Degree>,
    /// Perihelion distance in AU (comets).
    pub perihelion_distance: Option<f64>,
    /// Epoch of perihelion passage (comets).
    pub epoch_of_perihelion: Option<Epoch>,
}

impl OrbitalElements {
    /// Build an asteroid element set.
    #[allow(clippy::too_many_arguments)]
    pub fn asteroid(
        epoch: Epoch,
        abs_mag: Option<f64>,
        slope: f64,
        eccentricity: f64,
        inclination: Degree,
        ascending_node: Degree,
        arg_perihelion: Degree,
        semi_major_axis: f64,
        mean_anomaly: Degree,
    ) -> Self {
        OrbitalElements {
            kind: ObjectKind::Asteroid,
            epoch,
            abs_mag,
            slope,
            eccentricity,
            inclination,
            ascending_node,
            arg_perihelion,
            semi_major_axis: Some(semi_major_axis),
            mean_anomaly: Some(mean_anomaly),
            perihelion_distance: None,
            epoch_of_perihelion: None,
        }
    }

    /// Build a comet element set.
    #[allow(clippy::too_many_arguments)]
    pub fn comet(
        epoch: Epoch,
        abs_mag: Option<f64>,
        slope: f64,
        eccentricity: f64,
        inclination: Degree,
        ascending_node: Degree,
        arg_perihelion: Degree,
        perihelion_distance: f64,
        epoch_of_perihelion: Epoch,
    ) -> Self {
        OrbitalElements {
            kind: ObjectKind::Comet,
            epoch,
            abs_mag,
            slope,
            eccentricity,
            inclination,
            ascending_node,
            arg_perihelion,
            semi_major_axis: None,
            mean_anomaly: None,
            perihelion_distance: Some(perihelion_distance),
            epoch_of_perihelion: Some(epoch_of_perihelion),
        }
    }

    /// Check the physical invariants required by the elliptical propagator.
    ///
    /// Return
    /// ------
    /// * `Ok(())` for a bound, fully specified element set
    /// * [`NeoschedError::UnsupportedObjectKind`] for artificial satellites
    /// * [`NeoschedError::InvalidElements`] otherwise
    pub fn validate(&self) -> Result<(), NeoschedError> {
        if self.kind == ObjectKind::ArtificialSatellite {
            return Err(NeoschedError::UnsupportedObjectKind(
                "artificial satellites are propagated from TLEs, not elements".into(),
            ));
        }
        if !self.eccentricity.is_finite() || self.eccentricity < 0.0 {
            return Err(NeoschedError::InvalidElements(format!(
                "eccentricity {} is not a valid value",
                self.eccentricity
            )));
        }
        if self.eccentricity >= 1.0 {
            return Err(NeoschedError::InvalidElements(format!(
                "eccentricity {} >= 1: only elliptical orbits are propagated",
                self.eccentricity
            )));
        }
        match self.kind {
            ObjectKind::Asteroid => {
                let a = self.semi_major_axis.ok_or_else(|| {
                    NeoschedError::InvalidElements("asteroid without semi-major axis".into())
                })?;
                if !(a > 0.0) {
                    return Err(NeoschedError::InvalidElements(format!(
                        "semi-major axis {a} must be positive"
                    )));
                }
                self.mean_anomaly.ok_or_else(|| {
                    NeoschedError::InvalidElements("asteroid without mean anomaly".into())
                })?;
            }
            ObjectKind::Comet => {
                let q = self.perihelion_distance.ok_or_else(|| {
                    NeoschedError::InvalidElements("comet without perihelion distance".into())
                })?;
                if !(q > 0.0) {
                    return Err(NeoschedError::InvalidElements(format!(
                        "perihelion distance {q} must be positive"
                    )));
                }
                self.epoch_of_perihelion.ok_or_else(|| {
                    NeoschedError::InvalidElements("comet without epoch of perihelion".into())
                })?;
            }
            ObjectKind::ArtificialSatellite => unreachable!(),
        }
        Ok(())
    }

    /// Semi-major axis in AU, derived from `q` and `e` for comets.
    ///
    /// Assumes [`validate`](Self::validate) has passed.
    pub fn semi_major(&self) -> Result<f64, NeoschedError> {
        match self.kind {
            ObjectKind::Asteroid => self.semi_major_axis.ok_or_else(|| {
                NeoschedError::InvalidElements("asteroid without semi-major axis".into())
            }),
            ObjectKind::Comet => {
                let q = self.perihelion_distance.ok_or_else(|| {
                    NeoschedError::InvalidElements("comet without perihelion distance".into())
                })?;
                Ok(q / (1.0 - self.eccentricity))
            }
            ObjectKind::ArtificialSatellite => Err(NeoschedError::UnsupportedObjectKind(
                "artificial satellite has no heliocentric semi-major axis".into(),
            )),
        }
    }

    /// Mean motion in radians per day.
    pub fn mean_motion(&self) -> Result<f64, NeoschedError> {
        let a = self.semi_major()?;
        Ok(GAUSS_GRAV / (a * a.sqrt()))
    }

    /// Mean anomaly in radians at an arbitrary TT date.
    ///
    /// For asteroids the stored mean anomaly is advanced from the element
    /// epoch; for comets it is counted from the perihelion passage.
    pub fn mean_anomaly_at(&self, mjd_tt: MJD) -> Result<f64, NeoschedError> {
        let n = self.mean_motion()?;
        match self.kind {
            ObjectKind::Asteroid => {
                let m0 = self
                    .mean_anomaly
                    .ok_or_else(|| {
                        NeoschedError::InvalidElements("asteroid without mean anomaly".into())
                    })?
                    .to_radians();
                Ok(m0 + n * (mjd_tt - self.epoch.to_mjd_tt_days()))
            }
            ObjectKind::Comet => {
                let tp = self.epoch_of_perihelion.ok_or_else(|| {
                    NeoschedError::InvalidElements("comet without epoch of perihelion".into())
                })?;
                Ok(n * (mjd_tt - tp.to_mjd_tt_days()))
            }
            ObjectKind::ArtificialSatellite => Err(NeoschedError::UnsupportedObjectKind(
                "artificial satellites are propagated from TLEs, not elements".into(),
            )),
        }
    }
}

#[cfg(test)]
mod elements_test {
    use super::*;
    use std::str::FromStr;

    fn main_belt() -> OrbitalElements {
        OrbitalElements::asteroid(
            Epoch::from_str("2024-01-01T00:00:00").unwrap(),
            Some(18.2),
            0.15,
            0.1,
            5.0,
            120.0,
            30.0,
            2.2,
            45.0,
        )
    }

    #[test]
    fn test_validate_ok() {
        assert!(main_belt().validate().is_ok());
    }

    #[test]
    fn test_validate_hyperbolic() {
        let mut el = main_belt();
        el.eccentricity = 1.2;
        assert!(matches!(
            el.validate(),
            Err(NeoschedError::InvalidElements(_))
        ));
    }

    #[test]
    fn test_validate_satellite() {
        let mut el = main_belt();
        el.kind = ObjectKind::ArtificialSatellite;
        assert!(matches!(
            el.validate(),
            Err(NeoschedError::UnsupportedObjectKind(_))
        ));
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut el = main_belt();
        el.semi_major_axis = None;
        assert!(el.validate().is_err());

        let mut el = main_belt();
        el.mean_anomaly = None;
        assert!(el.validate().is_err());
    }

    #[test]
    fn test_comet_semi_major() {
        let el = OrbitalElements::comet(
            Epoch::from_str("2024-01-01T00:00:00").unwrap(),
            Some(10.0),
            4.0,
            0.5,
            30.0,
            100.0,
            200.0,
            1.0,
            Epoch::from_str("2024-06-01T00:00:00").unwrap(),
        );
        assert!(el.validate().is_ok());
        assert!((el.semi_major().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_anomaly_advances() {
        let el = main_belt();
        let t0 = el.epoch.to_mjd_tt_days();
        let m0 = el.mean_anomaly_at(t0).unwrap();
        assert!((m0 - 45.0_f64.to_radians()).abs() < 1e-12);

        let n = el.mean_motion().unwrap();
        let m1 = el.mean_anomaly_at(t0 + 10.0).unwrap();
        assert!((m1 - m0 - 10.0 * n).abs() < 1e-12);
    }

    #[test]
    fn test_json_roundtrip() {
        let el = main_belt();
        let json = serde_json::to_string(&el).unwrap();
        let back: OrbitalElements = serde_json::from_str(&json).unwrap();
        assert_eq!(el, back);
    }
}
