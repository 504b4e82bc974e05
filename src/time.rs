//! Time-scale helpers on top of [`hifitime`].
//!
//! All public timestamps in the crate are [`hifitime::Epoch`] values; this
//! module supplies the MJD and sidereal-time conversions the ephemeris and
//! visibility code need.
use hifitime::{Duration, Epoch, Unit};

use crate::constants::{Radian, DPI, MJD, T2000};

/// Modified Julian Date (UTC) of an epoch.
pub fn mjd_utc(epoch: Epoch) -> MJD {
    epoch.to_mjd_utc_days()
}

/// Modified Julian Date (TT) of an epoch.
pub fn mjd_tt(epoch: Epoch) -> MJD {
    epoch.to_mjd_tt_days()
}

/// Epoch from a Modified Julian Date on the UTC scale.
pub fn epoch_from_mjd_utc(mjd: MJD) -> Epoch {
    Epoch::from_mjd_utc(mjd)
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 ≈ UTC here).
///
/// IAU 1982 polynomial for the mean sidereal time at 0h, plus the
/// fractional-day term scaled by the sidereal/solar rate ratio.
///
/// # Arguments
/// * `tjm` - Modified Julian Date
///
/// # Returns
/// * GMST angle in radians, normalized to [0, 2π).
pub fn gmst(tjm: MJD) -> Radian {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let mut gmst0 = ((C3 * t + C2) * t + C1) * t + C0;
    gmst0 *= DPI / 86400.0;

    let h = tjm.fract() * DPI;
    let mut gmst = gmst0 + h * RAP;

    let mut i: i64 = (gmst / DPI).floor() as i64;
    if gmst < 0.0 {
        i -= 1;
    }
    gmst -= i as f64 * DPI;

    gmst
}

/// Local apparent sidereal time (mean, no nutation) at an east longitude.
pub fn local_sidereal_time(epoch: Epoch, east_longitude: Radian) -> Radian {
    (gmst(mjd_utc(epoch)) + east_longitude).rem_euclid(DPI)
}

/// Round an epoch up to the next multiple of `step` from UTC midnight of
/// its own day. An epoch already on a tick is returned unchanged.
pub fn align_to_step(epoch: Epoch, step: Duration) -> Epoch {
    let mjd = mjd_utc(epoch);
    let day = mjd.floor();
    let step_days = step.to_seconds() / 86_400.0;
    let ticks = ((mjd - day) / step_days).ceil();
    epoch_from_mjd_utc(day) + Unit::Second * (ticks * step.to_seconds())
}
