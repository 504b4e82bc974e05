//! Slot-length and exposure planning.
//!
//! The portal allocates telescope time in fixed "slots" whose length is a
//! step function of the predicted magnitude, tuned per telescope class.
//! Within the slot, the exposure time follows the apparent rate of motion
//! (trailing must stay near one pixel) and the exposure count fills what
//! remains after the setup and readout overheads.
use tracing::debug;

use crate::constants::{ArcSec, BRIGHTEST_ALLOWABLE_MAG, MIN_EXPOSURE_COUNT};
use crate::errors::NeoschedError;
use crate::sites::{Site, TelescopeClass};

/// The exposure plan for one scheduled block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposurePlan {
    /// Single exposure length, seconds.
    pub exp_time: f64,
    pub exp_count: u32,
    /// Total slot length, minutes.
    pub slot_minutes: f64,
}

/// Upper-edge magnitude bins per class: `(upper_mag, slot_minutes)`.
/// A target qualifies for the first bin whose edge exceeds its magnitude.
fn mag_bins(class: TelescopeClass) -> &'static [(f64, f64)] {
    match class {
        TelescopeClass::TwoMeter => &[
            (17.0, 5.5),
            (17.5, 7.5),
            (18.0, 10.0),
            (19.0, 15.0),
            (20.0, 20.0),
            (20.5, 22.5),
            (21.0, 25.0),
            (21.5, 27.5),
            (22.0, 30.0),
            (23.3, 35.0),
        ],
        TelescopeClass::OneMeter => &[
            (16.0, 5.5),
            (16.5, 6.5),
            (17.0, 9.5),
            (17.5, 12.0),
            (18.0, 15.0),
            (20.0, 20.0),
            (20.5, 22.5),
            (21.0, 25.0),
            (21.5, 30.0),
            (22.0, 40.0),
            (22.5, 45.0),
        ],
        TelescopeClass::Point4Meter => &[
            (12.0, 15.0),
            (15.0, 17.5),
            (17.5, 20.0),
            (18.5, 22.5),
            (19.5, 25.0),
            (20.0, 27.5),
            (20.5, 32.5),
            (21.0, 35.0),
        ],
        TelescopeClass::Geocenter => &[],
    }
}

/// Slot length in minutes for a magnitude at a telescope class.
///
/// Return
/// ------
/// * the slot length, or [`NeoschedError::MagnitudeOutOfRange`] when the
///   target is brighter than [`BRIGHTEST_ALLOWABLE_MAG`] or fainter than
///   the last bin
pub fn slot_length(magnitude: f64, class: TelescopeClass) -> Result<f64, NeoschedError> {
    let out_of_range = || NeoschedError::MagnitudeOutOfRange {
        magnitude,
        telescope_class: class.to_string(),
    };
    if magnitude < BRIGHTEST_ALLOWABLE_MAG {
        return Err(out_of_range());
    }
    mag_bins(class)
        .iter()
        .find(|(upper, _)| magnitude < *upper)
        .map(|(_, slot)| *slot)
        .ok_or_else(out_of_range)
}

/// Exposure time for an apparent rate, rounded down to `round_to` seconds
/// with a one-second floor.
fn estimate_exptime(rate: ArcSec, pixel_scale: f64, round_to: f64) -> (f64, f64) {
    let exptime = 60.0 / rate / pixel_scale;
    let rounded = ((exptime / round_to).floor() * round_to).max(1.0);
    (rounded, exptime)
}

/// Exposure time for an apparent rate and pixel scale, capped at
/// `max_exp_time`. Trailing is held near one pixel per exposure.
pub fn determine_exptime(rate: ArcSec, pixel_scale: f64, max_exp_time: f64) -> f64 {
    let (mut rounded, _) = estimate_exptime(rate, pixel_scale, 5.0);
    if rounded > max_exp_time {
        debug!(rounded, max_exp_time, "capping exposure time");
        rounded = max_exp_time;
    }
    if rounded < 10.0 {
        // Short exposures get half-second rounding instead.
        rounded = estimate_exptime(rate, pixel_scale, 0.5).0;
    }
    rounded
}

/// Build the full exposure plan for one block.
///
/// Arguments
/// ---------
/// * `magnitude`: predicted V magnitude at the window midpoint
/// * `rate`: apparent sky motion, arcsec/min
/// * `site`: scheduling site (class supplies bins, overheads, pixel scale)
pub fn exposure_plan(
    magnitude: f64,
    rate: ArcSec,
    site: &Site,
) -> Result<ExposurePlan, NeoschedError> {
    let class = site.class;
    let slot_minutes = slot_length(magnitude, class)?;
    let slot_secs = slot_minutes * 60.0;

    // Cap single exposures so at least the minimum count fits the slot,
    // then round up to the nearest 5 seconds.
    let max_exp_time = (slot_secs / MIN_EXPOSURE_COUNT as f64)
        .min(class.max_exp_length());
    let max_exp_time = (max_exp_time / 5.0).ceil() * 5.0;

    let mut exp_time = determine_exptime(rate, class.pixel_scale(), max_exp_time);

    let setup = class.setup_overhead();
    let overhead = class.exp_overhead();
    let mut exp_count = ((slot_secs - setup) / (exp_time + overhead)).floor() as i64;

    if exp_count < MIN_EXPOSURE_COUNT as i64 {
        // Squeeze the exposure time instead of dropping below the minimum
        // count.
        exp_count = MIN_EXPOSURE_COUNT as i64;
        exp_time = (slot_secs - setup - overhead * exp_count as f64) / exp_count as f64;
        debug!(exp_time, exp_count, "reduced exposure time to fit slot");
    }

    if !(exp_time > 0.0) {
        return Err(NeoschedError::InfeasibleExposurePlan(format!(
            "slot of {slot_minutes} min at {class} leaves no usable exposure time"
        )));
    }

    Ok(ExposurePlan {
        exp_time,
        exp_count: exp_count as u32,
        slot_minutes,
    })
}

#[cfg(test)]
mod exposure_test {
    use super::*;
    use crate::sites::get_site;

    #[test]
    fn test_slot_length_bins() {
        assert_eq!(slot_length(17.4, TelescopeClass::TwoMeter).unwrap(), 7.5);
        assert_eq!(slot_length(17.2, TelescopeClass::OneMeter).unwrap(), 12.0);
        assert_eq!(slot_length(21.2, TelescopeClass::OneMeter).unwrap(), 30.0);
        assert_eq!(slot_length(20.2, TelescopeClass::Point4Meter).unwrap(), 32.5);
    }

    #[test]
    fn test_slot_length_too_bright() {
        assert!(matches!(
            slot_length(3.0, TelescopeClass::TwoMeter),
            Err(NeoschedError::MagnitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_slot_length_too_faint() {
        assert!(matches!(
            slot_length(23.4, TelescopeClass::TwoMeter),
            Err(NeoschedError::MagnitudeOutOfRange { .. })
        ));
        assert!(matches!(
            slot_length(21.0, TelescopeClass::Point4Meter),
            Err(NeoschedError::MagnitudeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_determine_exptime_rounding() {
        // 60/2.5/0.389 = 61.7 s, rounds down to a 5 s boundary.
        assert_eq!(determine_exptime(2.5, 0.389, 300.0), 60.0);
    }

    #[test]
    fn test_determine_exptime_capped() {
        assert_eq!(determine_exptime(0.1, 0.304, 300.0), 300.0);
    }

    #[test]
    fn test_determine_exptime_fast_mover() {
        // 60/30/0.571 = 3.50 s: below 10 s, half-second rounding.
        assert_eq!(determine_exptime(30.0, 0.571, 300.0), 3.5);
    }

    #[test]
    fn test_exposure_plan_one_meter() {
        let site = get_site("V37").unwrap();
        let plan = exposure_plan(20.2, 1.0, site).unwrap();
        assert_eq!(plan.slot_minutes, 22.5);
        assert_eq!(plan.exp_time, 150.0);
        assert_eq!(plan.exp_count, 6);
    }

    #[test]
    fn test_exposure_plan_enforces_minimum_count() {
        // A slow, bright-ish target on the 2m: slot 5.5 min, long nominal
        // exposure; the plan must fall back to 4 shorter exposures.
        let site = get_site("F65").unwrap();
        let plan = exposure_plan(16.5, 0.5, site).unwrap();
        assert_eq!(plan.exp_count, MIN_EXPOSURE_COUNT);
        let total = site.class.setup_overhead()
            + plan.exp_count as f64 * (plan.exp_time + site.class.exp_overhead());
        assert!(total <= plan.slot_minutes * 60.0 + 1e-9);
    }

    #[test]
    fn test_exposure_plan_fits_slot() {
        let site = get_site("Z21").unwrap();
        let plan = exposure_plan(19.0, 2.0, site).unwrap();
        let total = site.class.setup_overhead()
            + plan.exp_count as f64 * (plan.exp_time + site.class.exp_overhead());
        assert!(total <= plan.slot_minutes * 60.0 + 1e-9);
        assert!(plan.exp_count >= MIN_EXPOSURE_COUNT);
    }
}
