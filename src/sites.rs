//! Static registry of observing sites.
//!
//! Each [`Site`] fuses the geodetic position with the per-telescope-class
//! planning parameters (altitude limit, pixel scale, overheads). The
//! registry is read-only; the scheduler never edits site data at runtime.
//! Site `500` is the geocenter, used by the candidate filter for
//! site-independent triage.
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::constants::{Degree, Meter, Radian, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS};
use crate::errors::NeoschedError;

/// Telescope aperture class, selecting altitude limits, magnitude bins and
/// overheads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelescopeClass {
    TwoMeter,
    OneMeter,
    Point4Meter,
    /// Virtual class for the geocenter pseudo-site.
    Geocenter,
}

impl std::fmt::Display for TelescopeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelescopeClass::TwoMeter => write!(f, "2m0"),
            TelescopeClass::OneMeter => write!(f, "1m0"),
            TelescopeClass::Point4Meter => write!(f, "0m4"),
            TelescopeClass::Geocenter => write!(f, "geocenter"),
        }
    }
}

impl TelescopeClass {
    /// Slew/acquire padding at the front of a block, seconds.
    pub fn setup_overhead(&self) -> f64 {
        match self {
            TelescopeClass::TwoMeter => 240.0,
            TelescopeClass::OneMeter => 90.0,
            TelescopeClass::Point4Meter => 90.0,
            TelescopeClass::Geocenter => 0.0,
        }
    }

    /// Readout plus fixed per-exposure overhead, seconds.
    pub fn exp_overhead(&self) -> f64 {
        match self {
            TelescopeClass::TwoMeter => 19.0,
            TelescopeClass::OneMeter => 38.0,
            TelescopeClass::Point4Meter => 14.0,
            TelescopeClass::Geocenter => 0.0,
        }
    }

    /// Imager pixel scale, arcsec/pixel.
    pub fn pixel_scale(&self) -> f64 {
        match self {
            TelescopeClass::TwoMeter => 0.304,
            TelescopeClass::OneMeter => 0.389,
            TelescopeClass::Point4Meter => 0.571,
            TelescopeClass::Geocenter => 0.0,
        }
    }

    /// Lowest usable target altitude, degrees.
    pub fn alt_limit(&self) -> Degree {
        match self {
            TelescopeClass::TwoMeter => 20.0,
            TelescopeClass::OneMeter => 30.0,
            TelescopeClass::Point4Meter => 15.0,
            TelescopeClass::Geocenter => 0.0,
        }
    }

    /// Longest single exposure, seconds.
    pub fn max_exp_length(&self) -> f64 {
        match self {
            TelescopeClass::Geocenter => 0.0,
            _ => 300.0,
        }
    }
}

/// An observing site: geodetic position plus planning parameters.
#[derive(Debug, Clone)]
pub struct Site {
    /// MPC-style three character code.
    pub code: &'static str,
    pub name: &'static str,
    /// Geodetic longitude, radians, East positive.
    pub longitude: Radian,
    /// Geodetic latitude, radians, North positive.
    pub latitude: Radian,
    /// Height above the reference ellipsoid, meters.
    pub height: Meter,
    pub class: TelescopeClass,
}

impl Site {
    pub fn is_geocenter(&self) -> bool {
        self.class == TelescopeClass::Geocenter
    }

    /// Geocentric parallax coordinates (ρ cos φ', ρ sin φ') in units of the
    /// equatorial Earth radius, from the geodetic latitude and height.
    pub fn parallax_coords(&self) -> (f64, f64) {
        let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;
        let u = (axis_ratio * self.latitude.tan()).atan();
        let h = self.height / EARTH_MAJOR_AXIS;
        let rho_cos = u.cos() + h * self.latitude.cos();
        let rho_sin = axis_ratio * u.sin() + h * self.latitude.sin();
        (rho_cos, rho_sin)
    }
}

/// Degrees/arcminutes/arcseconds to radians, sign carried by `sign`.
fn dms(sign: f64, d: f64, m: f64, s: f64) -> Radian {
    sign * (d + m / 60.0 + s / 3600.0).to_radians()
}

fn site(
    code: &'static str,
    name: &'static str,
    longitude: Radian,
    latitude: Radian,
    height: Meter,
    class: TelescopeClass,
) -> (&'static str, Site) {
    (
        code,
        Site {
            code,
            name,
            longitude,
            latitude,
            height,
            class,
        },
    )
}

static SITE_REGISTRY: LazyLock<HashMap<&'static str, Site>> = LazyLock::new(|| {
    use TelescopeClass::*;
    HashMap::from([
        site(
            "F65",
            "Haleakala-Faulkes Telescope North (FTN)",
            dms(-1.0, 156.0, 15.0, 27.4),
            dms(1.0, 20.0, 42.0, 25.5),
            3055.0,
            TwoMeter,
        ),
        site(
            "E10",
            "Siding Spring-Faulkes Telescope South (FTS)",
            dms(1.0, 149.0, 4.0, 13.0),
            dms(-1.0, 31.0, 16.0, 23.4),
            1111.8,
            TwoMeter,
        ),
        site(
            "V37",
            "LCO Node at McDonald Observatory (ELP)",
            dms(-1.0, 104.0, 0.0, 54.63),
            dms(1.0, 30.0, 40.0, 47.53),
            2010.0,
            OneMeter,
        ),
        site(
            "V38",
            "LCO Node 0m4a Aqawan A at McDonald Observatory (ELP)",
            dms(-1.0, 104.0, 0.0, 54.24),
            dms(1.0, 30.0, 40.0, 48.15),
            2027.0,
            Point4Meter,
        ),
        site(
            "W85",
            "LCO LSC Node 1m0 Dome A at Cerro Tololo",
            dms(-1.0, 70.0, 48.0, 17.24),
            dms(-1.0, 30.0, 10.0, 2.58),
            2201.0,
            OneMeter,
        ),
        site(
            "W86",
            "LCO LSC Node 1m0 Dome B at Cerro Tololo",
            dms(-1.0, 70.0, 48.0, 16.78),
            dms(-1.0, 30.0, 10.0, 2.39),
            2201.0,
            OneMeter,
        ),
        site(
            "W87",
            "LCO LSC Node 1m0 Dome C at Cerro Tololo",
            dms(-1.0, 70.0, 48.0, 16.85),
            dms(-1.0, 30.0, 10.0, 2.81),
            2201.0,
            OneMeter,
        ),
        site(
            "W89",
            "LCO LSC Node 0m4a Aqawan A at Cerro Tololo",
            dms(-1.0, 70.0, 48.0, 16.88),
            dms(-1.0, 30.0, 10.0, 3.79),
            2202.5,
            Point4Meter,
        ),
        site(
            "W79",
            "LCO LSC Node 0m4b Aqawan B at Cerro Tololo",
            dms(-1.0, 70.0, 48.0, 16.74),
            dms(-1.0, 30.0, 10.0, 3.56),
            2202.5,
            Point4Meter,
        ),
        site(
            "K91",
            "LCO CPT Node 1m0 Dome A at Sutherland",
            dms(1.0, 20.0, 48.0, 36.65),
            dms(-1.0, 32.0, 22.0, 50.0),
            1807.0,
            OneMeter,
        ),
        site(
            "K92",
            "LCO CPT Node 1m0 Dome B at Sutherland",
            dms(1.0, 20.0, 48.0, 36.13),
            dms(-1.0, 32.0, 22.0, 50.0),
            1807.0,
            OneMeter,
        ),
        site(
            "K93",
            "LCO CPT Node 1m0 Dome C at Sutherland",
            dms(1.0, 20.0, 48.0, 36.39),
            dms(-1.0, 32.0, 22.0, 50.38),
            1807.0,
            OneMeter,
        ),
        site(
            "L09",
            "LCO CPT Node 0m4a Aqawan A at Sutherland",
            dms(1.0, 20.0, 48.0, 35.54),
            dms(-1.0, 32.0, 22.0, 50.25),
            1804.0,
            Point4Meter,
        ),
        site(
            "Q63",
            "LCO COJ Node 1m0 Dome A at Siding Spring",
            dms(1.0, 149.0, 4.0, 14.33),
            dms(-1.0, 31.0, 16.0, 22.56),
            1168.0,
            OneMeter,
        ),
        site(
            "Q64",
            "LCO COJ Node 1m0 Dome B at Siding Spring",
            dms(1.0, 149.0, 4.0, 14.75),
            dms(-1.0, 31.0, 16.0, 22.89),
            1168.0,
            OneMeter,
        ),
        site(
            "Q58",
            "LCO COJ Node 0m4a at Siding Spring",
            dms(1.0, 149.0, 4.0, 15.05),
            dms(-1.0, 31.0, 16.0, 22.38),
            1191.0,
            Point4Meter,
        ),
        site(
            "Q59",
            "LCO COJ Node 0m4b at Siding Spring",
            dms(1.0, 149.0, 4.0, 14.91),
            dms(-1.0, 31.0, 16.0, 22.48),
            1191.0,
            Point4Meter,
        ),
        site(
            "Z21",
            "LCO TFN Node 0m4a Aqawan A at Tenerife",
            dms(-1.0, 16.0, 30.0, 42.13),
            dms(1.0, 28.0, 18.0, 1.11),
            2390.0,
            Point4Meter,
        ),
        site(
            "Z17",
            "LCO TFN Node 0m4b Aqawan A at Tenerife",
            dms(-1.0, 16.0, 30.0, 42.21),
            dms(1.0, 28.0, 18.0, 1.11),
            2390.0,
            Point4Meter,
        ),
        site(
            "T04",
            "LCO OGG Node 0m4b at Maui",
            dms(-1.0, 156.0, 15.0, 27.11),
            dms(1.0, 20.0, 42.0, 25.1),
            3037.0,
            Point4Meter,
        ),
        site(
            "T03",
            "LCO OGG Node 0m4c at Maui",
            dms(-1.0, 156.0, 15.0, 27.12),
            dms(1.0, 20.0, 42.0, 25.1),
            3037.0,
            Point4Meter,
        ),
        site("500", "Geocenter", 0.0, 0.0, 0.0, Geocenter),
    ])
});

/// Look up a site by its code.
///
/// Return
/// ------
/// * a static reference into the registry, or
///   [`NeoschedError::UnknownSite`]
pub fn get_site(code: &str) -> Result<&'static Site, NeoschedError> {
    SITE_REGISTRY
        .get(code.to_uppercase().as_str())
        .ok_or_else(|| NeoschedError::UnknownSite(code.to_string()))
}

/// All registered site codes, for CLI diagnostics.
pub fn site_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = SITE_REGISTRY.keys().copied().collect();
    codes.sort_unstable();
    codes
}
