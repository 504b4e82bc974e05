//! # Visibility window finder
//!
//! Walks an ephemeris grid between two instants and merges the ticks where
//! the target is observable into [`VisibilityWindow`]s. A tick is
//! observable when the site is dark, the target is above the site's
//! altitude limit and the predicted magnitude sits in the configured band.
//!
//! Windows never span a night boundary. Nights are bucketed by *local
//! solar midnight*: the MJD shifted by the site longitude, rounded to the
//! nearest integer, so a night that straddles UTC midnight (every Chilean
//! night does) still counts as one night.
use hifitime::{Duration, Epoch, Unit};
use tracing::debug;

use crate::constants::{Degree, MJD, SUN_ALT_DARKNESS};
use crate::elements::OrbitalElements;
use crate::ephemeris::{compute_ephemeris, EphemerisPoint};
use crate::errors::NeoschedError;
use crate::sites::Site;
use crate::sun::sun_altitude;
use crate::time::{align_to_step, mjd_utc};

/// Thresholds a tick must clear to count as observable.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityConstraints {
    /// Minimum target altitude, degrees.
    pub alt_limit: Degree,
    /// Brightest acceptable magnitude (inclusive).
    pub bright_limit: f64,
    /// Faintest acceptable magnitude (exclusive).
    pub faint_limit: f64,
    /// Sun altitude below which the site is dark, degrees.
    pub sun_alt_limit: Degree,
}

impl Default for VisibilityConstraints {
    fn default() -> Self {
        VisibilityConstraints {
            alt_limit: 30.0,
            bright_limit: 19.0,
            faint_limit: 22.0,
            sun_alt_limit: SUN_ALT_DARKNESS,
        }
    }
}

impl VisibilityConstraints {
    /// Default constraints with the altitude limit of a site's telescope
    /// class.
    pub fn for_site(site: &Site) -> Self {
        VisibilityConstraints {
            alt_limit: site.class.alt_limit(),
            ..Default::default()
        }
    }
}

/// A contiguous run of observable ticks within one night.
#[derive(Debug, Clone)]
pub struct VisibilityWindow {
    /// MJD of the local solar midnight this window belongs to.
    pub night: i64,
    pub start: Epoch,
    pub end: Epoch,
    /// `end - start` in hours; zero for a single-tick window.
    pub duration_hours: f64,
    /// Highest target altitude over the member ticks, degrees.
    pub max_altitude: Degree,
    /// The member ephemeris lines, in time order.
    pub points: Vec<EphemerisPoint>,
}

/// One classified grid sample.
#[derive(Debug, Clone)]
pub struct Tick {
    pub point: EphemerisPoint,
    pub night: i64,
    pub observable: bool,
}

/// Night bucket of an instant at a site: the MJD shifted to local solar
/// time and rounded to the nearest midnight.
pub fn night_of(epoch: Epoch, site: &Site) -> i64 {
    let local_mjd: MJD = mjd_utc(epoch) + site.longitude.to_degrees() / 360.0;
    local_mjd.round() as i64
}

/// Pure tick classification: dark, up, and in the magnitude band.
///
/// The band is half-open, `bright_limit <= mag < faint_limit`; a point
/// with no magnitude never qualifies.
pub fn is_observable(point: &EphemerisPoint, constraints: &VisibilityConstraints) -> bool {
    let dark = point.sun_altitude < constraints.sun_alt_limit;
    let up = point.altitude >= constraints.alt_limit;
    let in_band = matches!(point.magnitude,
        Some(mag) if mag >= constraints.bright_limit && mag < constraints.faint_limit);
    dark && up && in_band
}

/// Merge classified ticks into windows.
///
/// Pure function over the tick sequence: a window is a maximal run of
/// observable ticks sharing a night id. The caller guarantees the ticks
/// are in time order.
pub fn merge_ticks(ticks: Vec<Tick>) -> Vec<VisibilityWindow> {
    let mut windows = Vec::new();
    let mut run: Vec<EphemerisPoint> = Vec::new();
    let mut run_night = 0i64;

    let flush = |run: &mut Vec<EphemerisPoint>, night: i64, windows: &mut Vec<VisibilityWindow>| {
        if run.is_empty() {
            return;
        }
        let start = run[0].epoch;
        let end = run[run.len() - 1].epoch;
        let max_altitude = run
            .iter()
            .map(|p| p.altitude)
            .fold(f64::NEG_INFINITY, f64::max);
        windows.push(VisibilityWindow {
            night,
            start,
            end,
            duration_hours: (end - start).to_unit(Unit::Hour),
            max_altitude,
            points: std::mem::take(run),
        });
    };

    for tick in ticks {
        if tick.observable {
            if !run.is_empty() && tick.night != run_night {
                flush(&mut run, run_night, &mut windows);
            }
            run_night = tick.night;
            run.push(tick.point);
        } else {
            flush(&mut run, run_night, &mut windows);
        }
    }
    flush(&mut run, run_night, &mut windows);
    windows
}

/// Find the visibility windows of a target between two instants.
///
/// Arguments
/// ---------
/// * `elements`: target element set (validated here, never mutated)
/// * `site`: observing site
/// * `start`, `end`: UTC range, half-open `[start, end)`; `start` is
///   rounded up to the step grid and the tick at `end` belongs to the
///   next scan
/// * `step`: tick spacing
/// * `constraints`: altitude/darkness/magnitude thresholds
///
/// Return
/// ------
/// * the windows in time order; an empty vector is a valid "never
///   observable" answer
pub fn find_windows(
    elements: &OrbitalElements,
    site: &Site,
    start: Epoch,
    end: Epoch,
    step: Duration,
    constraints: &VisibilityConstraints,
) -> Result<Vec<VisibilityWindow>, NeoschedError> {
    if end <= start {
        return Err(NeoschedError::InvalidWindow(format!(
            "range end {end} not after start {start}"
        )));
    }
    if step.to_seconds() <= 0.0 {
        return Err(NeoschedError::InvalidWindow("non-positive step".into()));
    }
    elements.validate()?;

    let mut ticks = Vec::new();
    let mut t = align_to_step(start, step);
    while t < end {
        let point = compute_ephemeris(elements, t, site)?;
        let observable = is_observable(&point, constraints);
        ticks.push(Tick {
            night: night_of(t, site),
            point,
            observable,
        });
        t += step;
    }

    let windows = merge_ticks(ticks);
    debug!(
        site = site.code,
        windows = windows.len(),
        "visibility scan complete"
    );
    Ok(windows)
}

/// Find the dark interval of the night that begins after `date` at a site.
///
/// Scans 48 hours at five-minute resolution for the first sunset-to-dark
/// transition and the matching dawn. Returns `None` for the geocenter and
/// for sites with no dark time in range (polar summer).
pub fn darkness_window(site: &Site, date: Epoch) -> Option<(Epoch, Epoch)> {
    if site.is_geocenter() {
        return None;
    }
    let step = Unit::Minute * 5.0;
    let mut t = date;
    let end_scan = date + Unit::Hour * 48.0;

    let mut dark_start: Option<Epoch> = None;
    let mut was_dark = sun_altitude(t, site) < SUN_ALT_DARKNESS;
    // If the scan opens mid-night, skip the partial night.
    t += step;
    while t <= end_scan {
        let dark = sun_altitude(t, site) < SUN_ALT_DARKNESS;
        match (was_dark, dark) {
            (false, true) => dark_start = Some(t),
            (true, false) => {
                if let Some(start) = dark_start {
                    return Some((start, t - step));
                }
            }
            _ => {}
        }
        was_dark = dark;
        t += step;
    }
    None
}

#[cfg(test)]
mod visibility_test {
    use super::*;
    use crate::sites::get_site;
    use std::str::FromStr;

    fn tick(minutes: i64, altitude: f64, mag: Option<f64>, sun_alt: f64, night: i64) -> Tick {
        let epoch = Epoch::from_str("2025-03-01T02:00:00").unwrap() + Unit::Minute * (minutes as f64);
        let point = EphemerisPoint {
            epoch,
            ra: 150.0,
            dec: 10.0,
            magnitude: mag,
            altitude,
            sky_motion: 1.0,
            sky_motion_pa: 90.0,
            sun_altitude: sun_alt,
            moon_separation: 90.0,
            moon_altitude: -20.0,
            moon_phase: 0.3,
            earth_distance: 1.0,
            sun_distance: 2.0,
        };
        let constraints = VisibilityConstraints::default();
        let observable = is_observable(&point, &constraints);
        Tick {
            point,
            night,
            observable,
        }
    }

    #[test]
    fn test_altitude_run_merges_into_one_window() {
        // Altitudes [10, 35, 40, 32, 5] at 30-minute ticks, limit 30:
        // exactly ticks 1..=3 observable, one window of 1.0 h.
        let alts = [10.0, 35.0, 40.0, 32.0, 5.0];
        let ticks: Vec<Tick> = alts
            .iter()
            .enumerate()
            .map(|(i, &alt)| tick(30 * i as i64, alt, Some(20.0), -30.0, 60735))
            .collect();
        let windows = merge_ticks(ticks);
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w.points.len(), 3);
        assert!((w.duration_hours - 1.0).abs() < 1e-9);
        assert_eq!(w.max_altitude, 40.0);
        assert_eq!(w.night, 60735);
    }

    #[test]
    fn test_gap_splits_windows_and_single_tick_is_zero_length() {
        // [obs, obs, not, obs] -> two windows, the second zero duration.
        let alts = [35.0, 36.0, 10.0, 33.0];
        let ticks: Vec<Tick> = alts
            .iter()
            .enumerate()
            .map(|(i, &alt)| tick(30 * i as i64, alt, Some(20.0), -30.0, 60735))
            .collect();
        let windows = merge_ticks(ticks);
        assert_eq!(windows.len(), 2);
        assert!((windows[0].duration_hours - 0.5).abs() < 1e-9);
        assert_eq!(windows[1].points.len(), 1);
        assert_eq!(windows[1].duration_hours, 0.0);
        assert_eq!(windows[1].start, windows[1].end);
    }

    #[test]
    fn test_night_boundary_splits_windows() {
        let ticks = vec![
            tick(0, 40.0, Some(20.0), -30.0, 60735),
            tick(30, 40.0, Some(20.0), -30.0, 60735),
            tick(60, 40.0, Some(20.0), -30.0, 60736),
            tick(90, 40.0, Some(20.0), -30.0, 60736),
        ];
        let windows = merge_ticks(ticks);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].night, 60735);
        assert_eq!(windows[1].night, 60736);
    }

    #[test]
    fn test_magnitude_band_half_open() {
        let c = VisibilityConstraints::default();
        // On the bright limit: observable.
        assert!(is_observable(&tick(0, 40.0, Some(19.0), -30.0, 0).point, &c));
        // On the faint limit: excluded.
        assert!(!is_observable(&tick(0, 40.0, Some(22.0), -30.0, 0).point, &c));
        // No magnitude: excluded.
        assert!(!is_observable(&tick(0, 40.0, None, -30.0, 0).point, &c));
    }

    #[test]
    fn test_twilight_tick_excluded() {
        let c = VisibilityConstraints::default();
        assert!(!is_observable(&tick(0, 40.0, Some(20.0), -10.0, 0).point, &c));
        assert!(is_observable(&tick(0, 40.0, Some(20.0), -15.1, 0).point, &c));
    }

    #[test]
    fn test_night_of_stable_across_utc_midnight() {
        // Tenerife (lon ~ -16.5°): the night of March 1st runs through UTC
        // midnight; both sides land in the same bucket.
        let site = get_site("Z21").unwrap();
        let before = Epoch::from_str("2025-03-01T23:00:00").unwrap();
        let after = Epoch::from_str("2025-03-02T01:00:00").unwrap();
        assert_eq!(night_of(before, site), night_of(after, site));
        // Local noon belongs to a different bucket than the following night.
        let noon = Epoch::from_str("2025-03-01T13:00:00").unwrap();
        assert_ne!(night_of(noon, site), night_of(before, site));
    }

    #[test]
    fn test_darkness_window_mid_latitude() {
        let site = get_site("V37").unwrap();
        let date = Epoch::from_str("2025-03-01T00:00:00").unwrap();
        let (start, end) = darkness_window(site, date).expect("V37 has dark time");
        assert!(end > start);
        let hours = (end - start).to_unit(Unit::Hour);
        assert!((6.0..14.0).contains(&hours), "dark for {hours} h");
        let midpoint = start + Unit::Second * ((end - start).to_seconds() / 2.0);
        assert!(sun_altitude(midpoint, site) < SUN_ALT_DARKNESS);
    }

    #[test]
    fn test_darkness_window_geocenter_none() {
        let site = get_site("500").unwrap();
        let date = Epoch::from_str("2025-03-01T00:00:00").unwrap();
        assert!(darkness_window(site, date).is_none());
    }

    #[test]
    fn test_find_windows_rejects_inverted_range() {
        let el = crate::elements::OrbitalElements::asteroid(
            Epoch::from_str("2025-01-01T00:00:00").unwrap(),
            Some(18.0),
            0.15,
            0.1,
            5.0,
            100.0,
            50.0,
            1.8,
            10.0,
        );
        let site = get_site("V37").unwrap();
        let start = Epoch::from_str("2025-03-02T00:00:00").unwrap();
        let end = Epoch::from_str("2025-03-01T00:00:00").unwrap();
        let err = find_windows(&el, site, start, end, Unit::Minute * 30.0, &Default::default());
        assert!(matches!(err, Err(NeoschedError::InvalidWindow(_))));
    }

    #[test]
    fn test_find_windows_range_is_half_open() {
        let el = crate::elements::OrbitalElements::asteroid(
            Epoch::from_str("2025-01-01T00:00:00").unwrap(),
            Some(17.0),
            0.15,
            0.1,
            5.0,
            100.0,
            50.0,
            1.8,
            10.0,
        );
        let site = get_site("V37").unwrap();
        // 04:00-05:00 UTC is deep night at V37 in March; with the
        // altitude and magnitude gates wide open every grid tick is
        // observable, so the window members are exactly the grid.
        let start = Epoch::from_str("2025-03-01T04:00:00").unwrap();
        let end = Epoch::from_str("2025-03-01T05:00:00").unwrap();
        let constraints = VisibilityConstraints {
            alt_limit: -90.0,
            bright_limit: 0.0,
            faint_limit: 30.0,
            ..Default::default()
        };
        let windows =
            find_windows(&el, site, start, end, Unit::Minute * 30.0, &constraints).unwrap();
        assert_eq!(windows.len(), 1);
        // 04:00 and 04:30 only; the 05:00 tick belongs to the next scan.
        assert_eq!(windows[0].points.len(), 2);
        assert_eq!(
            mjd_utc(windows[0].end),
            mjd_utc(Epoch::from_str("2025-03-01T04:30:00").unwrap())
        );
    }

    #[test]
    fn test_find_windows_invariants() {
        let el = crate::elements::OrbitalElements::asteroid(
            Epoch::from_str("2025-01-01T00:00:00").unwrap(),
            Some(17.0),
            0.15,
            0.1,
            5.0,
            100.0,
            50.0,
            1.8,
            10.0,
        );
        let site = get_site("V37").unwrap();
        let start = Epoch::from_str("2025-03-01T00:00:00").unwrap();
        let end = Epoch::from_str("2025-03-04T00:00:00").unwrap();
        let constraints = VisibilityConstraints {
            bright_limit: 0.0,
            faint_limit: 30.0,
            ..VisibilityConstraints::for_site(site)
        };
        let windows =
            find_windows(&el, site, start, end, Unit::Minute * 30.0, &constraints).unwrap();
        for w in &windows {
            assert!(w.end >= w.start);
            assert!(!w.points.is_empty());
            assert!(w.max_altitude >= constraints.alt_limit);
            for p in &w.points {
                assert!(p.sun_altitude < SUN_ALT_DARKNESS);
                assert!(p.altitude >= constraints.alt_limit);
            }
        }
        // Windows are time-ordered and non-overlapping.
        for pair in windows.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
    }
}
