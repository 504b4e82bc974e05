//! # Constants and type definitions for neosched
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `neosched` library.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, days ↔ seconds, AU ↔ km)
//! - Scheduling thresholds shared between the visibility finder, the
//!   candidate filter and the exposure planner
//! - Core type aliases used across the crate
//!
//! These definitions are used by all main modules, including the ephemeris
//! engine, the visibility finder and the schedule submitter.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth polar radius in meters (GRS1980/WGS84)
pub const EARTH_MINOR_AXIS: f64 = 6_356_752.3;

/// Earth radius expressed in astronomical units
pub const ERAU: f64 = (EARTH_MAJOR_AXIS / 1000.) / AU;

/// Gaussian gravitational constant k (used in classical orbit dynamics)
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Light travel time for one astronomical unit, in days
pub const TAU_LIGHT_DAY: f64 = AU / VLIGHT / SECONDS_PER_DAY;

/// Mean obliquity of the ecliptic at J2000.0, in degrees (IAU 1976)
pub const OBLIQUITY_J2000: f64 = 23.439291111;

// -------------------------------------------------------------------------------------------------
// Scheduling thresholds
// -------------------------------------------------------------------------------------------------

/// Sun altitude below which the sky counts as dark, in degrees.
///
/// Zenith distance 105°, halfway between nautical and astronomical
/// twilight. Moving-object follow-up does not wait for full astronomical
/// darkness.
pub const SUN_ALT_DARKNESS: Degree = -15.0;

/// Brightest target magnitude the exposure planner accepts.
/// Anything brighter saturates even the shortest useful exposure.
pub const BRIGHTEST_ALLOWABLE_MAG: f64 = 6.0;

/// Minimum number of exposures in a scheduled block
pub const MIN_EXPOSURE_COUNT: u32 = 4;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// MPC-style code identifying an observing site (3 characters)
pub type SiteCode = String;
/// Modified Julian Date (days)
pub type MJD = f64;
