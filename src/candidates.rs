//! # Candidate filter
//!
//! Triage of the candidate list before any telescope time is requested.
//! Each candidate gets one geocentric ephemeris at the decision instant;
//! a policy gate then either routes it to the Northern or Southern queue
//! (by south polar distance) or records a skip reason. The filter is pure
//! apart from reading the block store: input order is preserved, nothing
//! is mutated, and one broken candidate never aborts the batch.
use std::path::Path;

use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{ArcSec, Degree};
use crate::elements::OrbitalElements;
use crate::ephemeris::{compute_ephemeris, EphemerisPoint};
use crate::errors::NeoschedError;
use crate::sites::{get_site, TelescopeClass};
use crate::store::BlockStore;

/// A target awaiting a scheduling decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Provisional designation or number, e.g. `"2025 AB"`.
    pub object_id: String,
    pub elements: OrbitalElements,
}

/// Thresholds of the triage gate.
#[derive(Debug, Clone, Copy)]
pub struct FilterPolicy {
    /// Brightest magnitude accepted (inclusive).
    pub bright_limit: f64,
    /// Faintest magnitude accepted (exclusive).
    pub faint_limit: f64,
    /// South polar distance above which a target goes North, degrees.
    pub spd_south_cut: Degree,
    /// Maximum apparent rate, arcsec/min.
    pub speed_cutoff: ArcSec,
    /// Minimum Moon separation, degrees.
    pub moon_sep_cutoff: Degree,
    /// Skip targets not found on frames at least this many times.
    pub not_found_threshold: u32,
    /// Targets brighter than this go to the 0.4 m queue.
    pub point4m_mag_cut: f64,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy {
            bright_limit: 19.0,
            faint_limit: 22.0,
            spd_south_cut: 95.0,
            speed_cutoff: 5.0,
            moon_sep_cutoff: 30.0,
            not_found_threshold: 2,
            point4m_mag_cut: 20.5,
        }
    }
}

/// Why a candidate was left out of this pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    TooBright(f64),
    TooFaint(f64),
    /// No absolute magnitude on the elements, so no prediction.
    NoMagnitude,
    /// Apparent rate above the policy cutoff, arcsec/min.
    TooFast(ArcSec),
    /// Moon separation below the policy cutoff, degrees.
    MoonTooClose(Degree),
    /// An active block already exists.
    AlreadyActive,
    /// Not found on frames too many times.
    NotFoundTooOften(u32),
    /// Per-candidate ephemeris failure (bad elements and the like).
    EphemerisFailed(String),
    /// Magnitude outside the slot bins or an unbuildable request.
    Unschedulable(String),
    /// No darkness or the window closed before submission.
    NoWindow,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooBright(mag) => write!(f, "too bright (V={mag:.1})"),
            SkipReason::TooFaint(mag) => write!(f, "too faint (V={mag:.1})"),
            SkipReason::NoMagnitude => write!(f, "no magnitude available"),
            SkipReason::TooFast(rate) => write!(f, "moving too fast ({rate:.1} \"/min)"),
            SkipReason::MoonTooClose(sep) => write!(f, "too close to the Moon ({sep:.1} deg)"),
            SkipReason::AlreadyActive => write!(f, "active block already scheduled"),
            SkipReason::NotFoundTooOften(n) => write!(f, "not found on frames {n} times"),
            SkipReason::EphemerisFailed(e) => write!(f, "ephemeris failed: {e}"),
            SkipReason::Unschedulable(e) => write!(f, "unschedulable: {e}"),
            SkipReason::NoWindow => write!(f, "no usable observing window"),
        }
    }
}

/// Scheduling queue a surviving candidate is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hemisphere::North => write!(f, "North"),
            Hemisphere::South => write!(f, "South"),
        }
    }
}

/// A triage survivor and the telescope class its magnitude qualifies for.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedCandidate {
    pub candidate: Candidate,
    /// 0.4 m for bright targets, 1 m for the rest.
    pub class: TelescopeClass,
}

/// Outcome of one filter pass. Queue order matches input order.
#[derive(Debug, Default)]
pub struct FilterResult {
    pub north: Vec<RoutedCandidate>,
    pub south: Vec<RoutedCandidate>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl FilterResult {
    pub fn total(&self) -> usize {
        self.north.len() + self.south.len() + self.skipped.len()
    }
}

/// Pure classification of one candidate from its geocentric ephemeris and
/// store counts.
pub fn classify(
    point: &EphemerisPoint,
    active_blocks: usize,
    not_found: u32,
    policy: &FilterPolicy,
) -> Result<Hemisphere, SkipReason> {
    if active_blocks > 0 {
        return Err(SkipReason::AlreadyActive);
    }
    if not_found >= policy.not_found_threshold {
        return Err(SkipReason::NotFoundTooOften(not_found));
    }
    let mag = point.magnitude.ok_or(SkipReason::NoMagnitude)?;
    if mag < policy.bright_limit {
        return Err(SkipReason::TooBright(mag));
    }
    if mag >= policy.faint_limit {
        return Err(SkipReason::TooFaint(mag));
    }
    if point.sky_motion > policy.speed_cutoff {
        return Err(SkipReason::TooFast(point.sky_motion));
    }
    if point.moon_separation < policy.moon_sep_cutoff {
        return Err(SkipReason::MoonTooClose(point.moon_separation));
    }
    if point.south_polar_distance() > policy.spd_south_cut {
        Ok(Hemisphere::North)
    } else {
        Ok(Hemisphere::South)
    }
}

/// Telescope class a predicted magnitude qualifies for: bright targets
/// are sent to the 0.4 m queue, the rest need a 1 m aperture.
pub fn preferred_class(magnitude: f64, policy: &FilterPolicy) -> TelescopeClass {
    if magnitude < policy.point4m_mag_cut {
        TelescopeClass::Point4Meter
    } else {
        TelescopeClass::OneMeter
    }
}

/// Filter a candidate list at a decision instant.
///
/// Arguments
/// ---------
/// * `candidates`: triage input, order preserved in the output queues
/// * `as_of`: instant of the geocentric ephemeris used for the decision
/// * `policy`: triage thresholds
/// * `store`: block persistence, read-only here
pub fn filter_candidates(
    candidates: &[Candidate],
    as_of: Epoch,
    policy: &FilterPolicy,
    store: &dyn BlockStore,
) -> FilterResult {
    let geocenter = match get_site("500") {
        Ok(site) => site,
        Err(_) => unreachable!("geocenter is always registered"),
    };

    let mut result = FilterResult::default();
    for candidate in candidates {
        let decision = match compute_ephemeris(&candidate.elements, as_of, geocenter) {
            Ok(point) => classify(
                &point,
                store.active_block_count(&candidate.object_id),
                store.not_found_count(&candidate.object_id),
                policy,
            )
            .map(|hemisphere| {
                // Classify guarantees a magnitude on the Ok path.
                let class = point
                    .magnitude
                    .map(|mag| preferred_class(mag, policy))
                    .unwrap_or(TelescopeClass::OneMeter);
                (hemisphere, class)
            }),
            Err(e) => {
                warn!(object = %candidate.object_id, error = %e, "ephemeris failed during triage");
                Err(SkipReason::EphemerisFailed(e.to_string()))
            }
        };
        match decision {
            Ok((hemisphere, class)) => {
                let routed = RoutedCandidate {
                    candidate: candidate.clone(),
                    class,
                };
                match hemisphere {
                    Hemisphere::North => result.north.push(routed),
                    Hemisphere::South => result.south.push(routed),
                }
            }
            Err(reason) => result.skipped.push((candidate.object_id.clone(), reason)),
        }
    }
    info!(
        north = result.north.len(),
        south = result.south.len(),
        skipped = result.skipped.len(),
        "candidate triage complete"
    );
    result
}

/// Load a candidate list from a JSON file (an array of [`Candidate`]).
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>, NeoschedError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| NeoschedError::CandidateFile(format!("{}: {e}", path.display())))
}
