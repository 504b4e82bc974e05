//! Batch scheduling pass: triage the candidate list, then walk every
//! surviving candidate through the submitter at its hemisphere's site.
//!
//! The pass itself never fails; every per-candidate problem ends up as an
//! outcome in the report, so one bad target cannot take the night down.
use hifitime::Epoch;
use tracing::info;

use crate::candidates::{filter_candidates, Candidate, FilterPolicy, Hemisphere, SkipReason};
use crate::network::TelescopeNetwork;
use crate::sites::{Site, TelescopeClass};
use crate::store::BlockStore;
use crate::submit::{schedule_candidate, ScheduleOutcome};

/// The sites one hemisphere's queue can be scheduled at. Bright targets
/// prefer the 0.4 m site; when none is configured they fall back to the
/// 1 m site.
#[derive(Debug, Clone, Copy)]
pub struct HemisphereSites<'a> {
    pub one_meter: &'a Site,
    pub point4: Option<&'a Site>,
}

impl<'a> HemisphereSites<'a> {
    pub fn one_meter_only(site: &'a Site) -> Self {
        HemisphereSites {
            one_meter: site,
            point4: None,
        }
    }

    fn site_for(&self, class: TelescopeClass) -> &'a Site {
        match class {
            TelescopeClass::Point4Meter => self.point4.unwrap_or(self.one_meter),
            _ => self.one_meter,
        }
    }
}

/// Everything that happened in one pass, in candidate order (north queue
/// first, then south, then the triage skips).
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(String, Hemisphere, ScheduleOutcome)>,
    /// Candidates the triage gate dropped before submission.
    pub skipped: Vec<(String, SkipReason)>,
}

impl BatchReport {
    pub fn scheduled_count(&self, hemisphere: Hemisphere) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, h, outcome)| {
                *h == hemisphere && matches!(outcome, ScheduleOutcome::Scheduled { .. })
            })
            .count()
    }

    pub fn dry_run_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, _, outcome)| matches!(outcome, ScheduleOutcome::DryRun { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, _, outcome)| matches!(outcome, ScheduleOutcome::Failed(_)))
            .count()
    }

    /// One-line human summary for the end of a run.
    pub fn summary(&self) -> String {
        format!(
            "Scheduled {} in the North, {} in the South ({} dry-run, {} failed, {} skipped)",
            self.scheduled_count(Hemisphere::North),
            self.scheduled_count(Hemisphere::South),
            self.dry_run_count(),
            self.failed_count(),
            self.skipped.len()
                + self
                    .outcomes
                    .iter()
                    .filter(|(_, _, o)| matches!(o, ScheduleOutcome::Skipped(_)))
                    .count()
        )
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (object, hemisphere, outcome) in &self.outcomes {
            let line = match outcome {
                ScheduleOutcome::Scheduled { tracking_number } => {
                    format!("scheduled ({hemisphere}, tracking {tracking_number})")
                }
                ScheduleOutcome::DryRun { group_id } => {
                    format!("dry run ({hemisphere}, would submit {group_id})")
                }
                ScheduleOutcome::Skipped(reason) => format!("skipped: {reason}"),
                ScheduleOutcome::Failed(reason) => format!("FAILED: {reason}"),
            };
            writeln!(f, "{object}: {line}")?;
        }
        for (object, reason) in &self.skipped {
            writeln!(f, "{object}: filtered out: {reason}")?;
        }
        write!(f, "{}", self.summary())
    }
}

/// Run one full pass over a candidate list.
///
/// Arguments
/// ---------
/// * `north` / `south`: where each hemisphere's queue goes, per class
/// * `date`: night to schedule
/// * `as_of`: decision instant for triage and window checks
/// * `execute`: dry-run gate, forwarded to every submission
#[allow(clippy::too_many_arguments)]
pub fn run_batch(
    candidates: &[Candidate],
    north: HemisphereSites<'_>,
    south: HemisphereSites<'_>,
    proposal_code: &str,
    date: Epoch,
    as_of: Epoch,
    policy: &FilterPolicy,
    store: &dyn BlockStore,
    network: &dyn TelescopeNetwork,
    execute: bool,
) -> BatchReport {
    let triage = filter_candidates(candidates, as_of, policy, store);
    info!(
        north = triage.north.len(),
        south = triage.south.len(),
        skipped = triage.skipped.len(),
        "triage complete"
    );

    let mut report = BatchReport::default();
    let queues = [
        (Hemisphere::North, north, &triage.north),
        (Hemisphere::South, south, &triage.south),
    ];
    for (hemisphere, sites, queue) in queues {
        for routed in queue {
            let site = sites.site_for(routed.class);
            let outcome = schedule_candidate(
                &routed.candidate,
                site,
                proposal_code,
                date,
                as_of,
                store,
                network,
                execute,
            );
            report
                .outcomes
                .push((routed.candidate.object_id.clone(), hemisphere, outcome));
        }
    }
    report.skipped = triage.skipped;
    info!("{}", report.summary());
    report
}
