//! # Schedule submitter
//!
//! Turns one surviving candidate into a portal request group and walks it
//! through the submission state machine:
//!
//! ```text
//! Checking -> Submitted -> Recorded
//!     \            \
//!      \            `-> Rejected   (portal refused / transport failed)
//!       `-> skipped                (already active, window gone)
//! ```
//!
//! `Checking` always re-reads the active-block count from the store; the
//! count seen at filter time may be minutes old. `Submitted` is the only
//! network side effect. `Recorded` persists through
//! [`BlockStore::record_schedule`], whose `false` return means another
//! pass claimed the target first and this submission is treated as
//! superseded. The group id (`object_SITE-YYYYMMDD`) makes resubmission
//! of the same object/site/night idempotent on the portal side.
use hifitime::{Epoch, Unit};
use tracing::{debug, info, warn};

use crate::candidates::{Candidate, SkipReason};
use crate::ephemeris::compute_ephemeris;
use crate::errors::NeoschedError;
use crate::exposure::exposure_plan;
use crate::network::TelescopeNetwork;
use crate::sites::Site;
use crate::store::BlockStore;
use crate::visibility::darkness_window;

/// States of one submission attempt, in log lines and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Checking,
    Submitted,
    Recorded,
    Rejected,
}

/// The semantic parameters of one request group.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub object_id: String,
    pub site_code: String,
    pub proposal_code: String,
    /// Idempotency key: `object_SITE-YYYYMMDD` of the observing night.
    pub group_id: String,
    pub window_start: Epoch,
    pub window_end: Epoch,
    pub exp_count: u32,
    /// Single exposure length, seconds.
    pub exp_time: f64,
    pub slot_minutes: f64,
    pub filter_pattern: String,
    /// Predicted V magnitude at the window midpoint.
    pub magnitude: f64,
    /// Predicted rate at the window midpoint, arcsec/min.
    pub speed: f64,
}

/// Outcome of one candidate in a scheduling pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    Scheduled { tracking_number: String },
    /// `--execute` was not given; this is what would have been submitted.
    DryRun { group_id: String },
    Skipped(SkipReason),
    Failed(String),
}

/// Group id for an object, site and night.
pub fn group_id(object_id: &str, site: &Site, night_start: Epoch) -> String {
    let (year, month, day, ..) = night_start.to_gregorian_utc();
    format!("{}_{}-{year:04}{month:02}{day:02}", object_id, site.code)
}

/// Build the request group for a candidate's next night at a site.
///
/// Finds the night's dark window (rolling to the next night when the
/// current one has already ended), predicts the target at the window
/// midpoint and sizes the exposure plan from the prediction.
pub fn build_request(
    candidate: &Candidate,
    site: &Site,
    proposal_code: &str,
    date: Epoch,
    as_of: Epoch,
) -> Result<ScheduleRequest, NeoschedError> {
    let (dark_start, dark_end) = darkness_window(site, date).ok_or_else(|| {
        NeoschedError::InvalidWindow(format!("no darkness at {} around {date}", site.code))
    })?;
    // Night already over: plan the next one.
    let (dark_start, dark_end) = if dark_end <= as_of {
        darkness_window(site, date + Unit::Day * 1.0).ok_or_else(|| {
            NeoschedError::InvalidWindow(format!("no darkness at {} after {date}", site.code))
        })?
    } else {
        (dark_start, dark_end)
    };

    let midpoint = dark_start + Unit::Second * ((dark_end - dark_start).to_seconds() / 2.0);
    let point = compute_ephemeris(&candidate.elements, midpoint, site)?;
    let magnitude = point.magnitude.ok_or_else(|| {
        NeoschedError::InvalidElements(format!(
            "{} has no absolute magnitude, cannot size a slot",
            candidate.object_id
        ))
    })?;

    let plan = exposure_plan(magnitude, point.sky_motion, site)?;

    Ok(ScheduleRequest {
        object_id: candidate.object_id.clone(),
        site_code: site.code.to_string(),
        proposal_code: proposal_code.to_string(),
        group_id: group_id(&candidate.object_id, site, dark_start),
        window_start: dark_start,
        window_end: dark_end,
        exp_count: plan.exp_count,
        exp_time: plan.exp_time,
        slot_minutes: plan.slot_minutes,
        filter_pattern: "w".to_string(),
        magnitude,
        speed: point.sky_motion,
    })
}

/// Run one candidate through the submission state machine.
///
/// Arguments
/// ---------
/// * `execute`: the dry-run gate; `false` stops before any network call
///
/// Return
/// ------
/// * a [`ScheduleOutcome`]; never an error, the batch report carries the
///   failures
#[allow(clippy::too_many_arguments)]
pub fn schedule_candidate(
    candidate: &Candidate,
    site: &Site,
    proposal_code: &str,
    date: Epoch,
    as_of: Epoch,
    store: &dyn BlockStore,
    network: &dyn TelescopeNetwork,
    execute: bool,
) -> ScheduleOutcome {
    let request = match build_request(candidate, site, proposal_code, date, as_of) {
        Ok(request) => request,
        Err(NeoschedError::MagnitudeOutOfRange { magnitude, telescope_class }) => {
            debug!(object = %candidate.object_id, magnitude, "outside slot bins");
            return ScheduleOutcome::Skipped(SkipReason::Unschedulable(format!(
                "V={magnitude:.1} outside {telescope_class} bins"
            )));
        }
        Err(NeoschedError::InvalidWindow(reason)) => {
            debug!(object = %candidate.object_id, %reason, "no window");
            return ScheduleOutcome::Skipped(SkipReason::NoWindow);
        }
        Err(e) => return ScheduleOutcome::Failed(e.to_string()),
    };

    // Checking: the store is the source of truth, filter-time counts are
    // stale by now.
    debug!(state = ?SubmissionState::Checking, group_id = %request.group_id);
    if store.active_block_count(&candidate.object_id) > 0 {
        return ScheduleOutcome::Skipped(SkipReason::AlreadyActive);
    }
    if request.window_end <= as_of {
        return ScheduleOutcome::Skipped(SkipReason::NoWindow);
    }

    if !execute {
        info!(group_id = %request.group_id, site = site.code,
            exp = format!("{}x{:.1}s", request.exp_count, request.exp_time),
            "dry run, not submitting");
        return ScheduleOutcome::DryRun {
            group_id: request.group_id,
        };
    }

    debug!(state = ?SubmissionState::Submitted, group_id = %request.group_id);
    let receipt = match network.submit(&request) {
        Ok(receipt) => receipt,
        Err(e) => {
            warn!(state = ?SubmissionState::Rejected, object = %candidate.object_id,
                site = site.code, window_start = %request.window_start,
                window_end = %request.window_end, error = %e, "submission rejected");
            return ScheduleOutcome::Failed(e.to_string());
        }
    };

    if !store.record_schedule(&candidate.object_id, &receipt.tracking_number, &request) {
        // Claim lost: someone recorded an active block since Checking.
        warn!(object = %candidate.object_id, tracking = %receipt.tracking_number,
            "claim lost after submission, treating as superseded");
        return ScheduleOutcome::Skipped(SkipReason::AlreadyActive);
    }
    info!(state = ?SubmissionState::Recorded, group_id = %request.group_id,
        tracking = %receipt.tracking_number, "block recorded");
    ScheduleOutcome::Scheduled {
        tracking_number: receipt.tracking_number,
    }
}

#[cfg(test)]
mod submit_test {
    use super::*;
    use crate::elements::OrbitalElements;
    use crate::network::SubmissionReceipt;
    use crate::sites::get_site;
    use crate::store::MemoryBlockStore;
    use std::cell::Cell;
    use std::str::FromStr;

    /// Network double that counts calls and can be told to fail.
    struct FakeNetwork {
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeNetwork {
        fn ok() -> Self {
            FakeNetwork {
                calls: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            FakeNetwork {
                calls: Cell::new(0),
                fail: true,
            }
        }
    }

    impl TelescopeNetwork for FakeNetwork {
        fn submit(&self, _request: &ScheduleRequest) -> Result<SubmissionReceipt, NeoschedError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(NeoschedError::Submission("portal says no".into()));
            }
            Ok(SubmissionReceipt {
                tracking_number: "12345".to_string(),
                request_ids: vec![67890],
                duration_secs: 1350.0,
            })
        }
    }

    fn near_earth() -> Candidate {
        // Close-in orbit keeps the predicted magnitude inside the 1m bins
        // for any observing geometry (H=17 puts V between ~17 and ~21.5).
        Candidate {
            object_id: "2025 AB".to_string(),
            elements: OrbitalElements::asteroid(
                Epoch::from_str("2025-01-01T00:00:00").unwrap(),
                Some(17.0),
                0.15,
                0.1,
                7.0,
                110.0,
                40.0,
                1.5,
                20.0,
            ),
        }
    }

    fn setup() -> (&'static Site, Epoch, Epoch) {
        let site = get_site("V37").unwrap();
        let date = Epoch::from_str("2025-03-01T00:00:00").unwrap();
        let as_of = date;
        (site, date, as_of)
    }

    #[test]
    fn test_group_id_format() {
        let site = get_site("V37").unwrap();
        let night = Epoch::from_str("2025-03-01T02:10:00").unwrap();
        assert_eq!(group_id("2025 AB", site, night), "2025 AB_V37-20250301");
    }

    #[test]
    fn test_build_request_shapes() {
        let (site, date, as_of) = setup();
        let request = build_request(&near_earth(), site, "LCO2025A-001", date, as_of).unwrap();
        assert_eq!(request.site_code, "V37");
        assert!(request.window_end > request.window_start);
        assert!(request.exp_count >= 4);
        assert!(request.exp_time > 0.0);
        assert!(request.group_id.starts_with("2025 AB_V37-2025030"));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (site, date, as_of) = setup();
        let store = MemoryBlockStore::new();
        let network = FakeNetwork::ok();
        let outcome = schedule_candidate(
            &near_earth(),
            site,
            "LCO2025A-001",
            date,
            as_of,
            &store,
            &network,
            false,
        );
        assert!(matches!(outcome, ScheduleOutcome::DryRun { .. }));
        assert_eq!(network.calls.get(), 0);
        assert_eq!(store.active_block_count("2025 AB"), 0);
    }

    #[test]
    fn test_at_most_once_submission() {
        let (site, date, as_of) = setup();
        let store = MemoryBlockStore::new();
        let network = FakeNetwork::ok();
        let candidate = near_earth();

        let first = schedule_candidate(
            &candidate, site, "LCO2025A-001", date, as_of, &store, &network, true,
        );
        assert_eq!(
            first,
            ScheduleOutcome::Scheduled {
                tracking_number: "12345".to_string()
            }
        );
        assert_eq!(store.active_block_count("2025 AB"), 1);
        assert_eq!(network.calls.get(), 1);

        // Second pass: Checking sees the active block, no network call.
        let second = schedule_candidate(
            &candidate, site, "LCO2025A-001", date, as_of, &store, &network, true,
        );
        assert_eq!(second, ScheduleOutcome::Skipped(SkipReason::AlreadyActive));
        assert_eq!(network.calls.get(), 1);
        assert_eq!(store.active_block_count("2025 AB"), 1);
    }

    #[test]
    fn test_rejection_records_nothing() {
        let (site, date, as_of) = setup();
        let store = MemoryBlockStore::new();
        let network = FakeNetwork::failing();
        let outcome = schedule_candidate(
            &near_earth(), site, "LCO2025A-001", date, as_of, &store, &network, true,
        );
        assert!(matches!(outcome, ScheduleOutcome::Failed(_)));
        // Target stays eligible for the next pass.
        assert_eq!(store.active_block_count("2025 AB"), 0);
    }

    #[test]
    fn test_claim_lost_after_submission() {
        let (site, date, as_of) = setup();
        let store = MemoryBlockStore::new();
        let network = FakeNetwork::ok();
        let candidate = near_earth();
        // Another pass claims the object between Checking and Recorded:
        // emulate by pre-recording after building but before our call by
        // using a store that already holds an active claim... easiest is
        // to race the same store through record_schedule directly.
        let request = build_request(&candidate, site, "LCO2025A-001", date, as_of).unwrap();
        assert!(store.record_schedule("2025 AB", "99", &request));

        let outcome = schedule_candidate(
            &candidate, site, "LCO2025A-001", date, as_of, &store, &network, true,
        );
        // Checking already sees the claim; no second submission happens.
        assert_eq!(outcome, ScheduleOutcome::Skipped(SkipReason::AlreadyActive));
        assert_eq!(network.calls.get(), 0);
    }

    #[test]
    fn test_unschedulable_magnitude_is_skipped() {
        let (site, date, as_of) = setup();
        let store = MemoryBlockStore::new();
        let network = FakeNetwork::ok();
        let mut candidate = near_earth();
        // H=28 puts the prediction far beyond every slot bin.
        candidate.elements.abs_mag = Some(28.0);
        let outcome = schedule_candidate(
            &candidate, site, "LCO2025A-001", date, as_of, &store, &network, true,
        );
        assert!(matches!(
            outcome,
            ScheduleOutcome::Skipped(SkipReason::Unschedulable(_))
        ));
        assert_eq!(network.calls.get(), 0);
    }
}
