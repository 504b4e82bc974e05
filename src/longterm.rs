//! # Long-term scheduler
//!
//! Looks ahead over a span of nights and reports, for each night the
//! target is worth observing, when and how well it can be seen. Used for
//! Yarkovsky and radar targets that are monitored over weeks rather than
//! chased on discovery night.
//!
//! The four output vectors are index-aligned: entry `i` of every vector
//! describes the same admitted night. A propagation failure on any night
//! degrades that target to "no visibility" with a log line; it never
//! aborts the scan.
use hifitime::{Epoch, Unit};
use tracing::{debug, warn};

use crate::constants::Degree;
use crate::elements::OrbitalElements;
use crate::ephemeris::{compute_ephemeris, EphemerisPoint};
use crate::sites::Site;
use crate::visibility::darkness_window;

/// Admission gates for a night.
#[derive(Debug, Clone, Copy)]
pub struct LongTermParams {
    /// Minimum hours the target must be dark-and-up.
    pub dark_and_up_limit: f64,
    /// Faintest admissible predicted magnitude.
    pub faint_limit: f64,
    /// Moon illumination above which a moon-up night is rejected.
    pub moon_phase_limit: f64,
    /// Moon altitude treated as "up", degrees.
    pub moon_alt_limit: Degree,
    /// Ephemeris grid spacing, minutes.
    pub step_minutes: f64,
}

impl Default for LongTermParams {
    fn default() -> Self {
        LongTermParams {
            dark_and_up_limit: 3.0,
            faint_limit: 21.5,
            moon_phase_limit: 0.85,
            moon_alt_limit: 30.0,
            step_minutes: 5.0,
        }
    }
}

/// Per-night visibility for one target, index-aligned across vectors.
#[derive(Debug, Default)]
pub struct LongTermSchedule {
    /// Calendar dates (`YYYY-MM-DD`, UTC) of the admitted nights.
    pub visible_dates: Vec<String>,
    /// First dark-and-up ephemeris line of each admitted night.
    pub first_points: Vec<EphemerisPoint>,
    /// Hours the target is dark-and-up on each admitted night.
    pub dark_and_up_hours: Vec<f64>,
    /// Best altitude of each admitted night, degrees.
    pub max_altitudes: Vec<Degree>,
}

impl LongTermSchedule {
    pub fn is_empty(&self) -> bool {
        self.visible_dates.is_empty()
    }
}

fn date_string(epoch: Epoch) -> String {
    let (year, month, day, ..) = epoch.to_gregorian_utc();
    format!("{year:04}-{month:02}-{day:02}")
}

/// Scan `num_days` nights (inclusive of the start date) and collect the
/// nights worth observing.
///
/// Never fails: bad elements or a siteless night simply contribute no
/// entries.
pub fn compute_schedule(
    site: &Site,
    elements: &OrbitalElements,
    start_date: Epoch,
    num_days: u32,
    params: &LongTermParams,
) -> LongTermSchedule {
    let mut schedule = LongTermSchedule::default();
    let alt_limit = site.class.alt_limit();

    for day in 0..=num_days {
        let date = start_date + Unit::Day * (day as f64);
        let Some((dark_start, dark_end)) = darkness_window(site, date) else {
            debug!(site = site.code, %date, "no darkness, skipping night");
            continue;
        };

        // Dark-and-up subset of the night's ephemeris grid.
        let mut night_points: Vec<EphemerisPoint> = Vec::new();
        let mut t = dark_start;
        let mut failed = false;
        while t <= dark_end {
            match compute_ephemeris(elements, t, site) {
                Ok(point) => {
                    if point.altitude >= alt_limit {
                        night_points.push(point);
                    }
                }
                Err(e) => {
                    warn!(site = site.code, error = %e, "propagation failed, night dropped");
                    failed = true;
                    break;
                }
            }
            t += Unit::Minute * params.step_minutes;
        }
        if failed || night_points.is_empty() {
            continue;
        }

        let first = &night_points[0];
        let last = &night_points[night_points.len() - 1];
        let dark_and_up_hours = (last.epoch - first.epoch).to_unit(Unit::Hour);

        let Some(mag) = first.magnitude else {
            continue;
        };
        let moon_up =
            first.moon_altitude >= params.moon_alt_limit || last.moon_altitude >= params.moon_alt_limit;
        let moon_ok = !moon_up || first.moon_phase <= params.moon_phase_limit;

        if dark_and_up_hours >= params.dark_and_up_limit && mag <= params.faint_limit && moon_ok {
            let max_altitude = night_points
                .iter()
                .map(|p| p.altitude)
                .fold(f64::NEG_INFINITY, f64::max);
            schedule.visible_dates.push(date_string(first.epoch));
            schedule.dark_and_up_hours.push(dark_and_up_hours);
            schedule.max_altitudes.push(max_altitude);
            schedule.first_points.push(night_points.swap_remove(0));
        }
    }

    schedule
}
