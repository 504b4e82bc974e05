//! Telescope-network submission client.
//!
//! [`TelescopeNetwork`] is the seam between the scheduler and the outside
//! world; [`PortalClient`] implements it over HTTP with token
//! authentication. Submission is the only network side effect in the
//! crate, it blocks with a 20 second global timeout and a timeout is a
//! failure like any other: the submitter marks the target rejected and the
//! next pass retries.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ureq::Agent;

use crate::errors::NeoschedError;
use crate::submit::ScheduleRequest;

/// What the portal answered for an accepted request group.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Portal tracking number of the request group.
    pub tracking_number: String,
    /// Ids of the individual requests inside the group.
    pub request_ids: Vec<u64>,
    /// Total scheduled duration, seconds.
    pub duration_secs: f64,
}

/// Submission seam; the batch path only ever sees this trait.
pub trait TelescopeNetwork {
    fn submit(&self, request: &ScheduleRequest) -> Result<SubmissionReceipt, NeoschedError>;
}

/// JSON body POSTed to the portal. The portal owns the full request-group
/// schema; the scheduler's obligation is the semantic parameters below.
#[derive(Debug, Serialize)]
struct RequestGroupPayload<'a> {
    name: &'a str,
    proposal: &'a str,
    target: &'a str,
    site: &'a str,
    start: String,
    end: String,
    exposure_count: u32,
    exposure_time: f64,
    slot_length: f64,
    filter_pattern: &'a str,
}

#[derive(Debug, Deserialize)]
struct RequestItem {
    id: u64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct RequestGroupResponse {
    id: Option<serde_json::Value>,
    #[serde(default)]
    requests: Vec<RequestItem>,
}

/// HTTP client for the observation portal.
#[derive(Debug, Clone)]
pub struct PortalClient {
    agent: Agent,
    base_url: String,
    token: String,
}

impl PortalClient {
    /// Build a client for a portal endpoint with an API token.
    pub fn new(base_url: &str, token: &str) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(20)))
            .build();
        PortalClient {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

impl TelescopeNetwork for PortalClient {
    fn submit(&self, request: &ScheduleRequest) -> Result<SubmissionReceipt, NeoschedError> {
        let url = format!("{}/api/requestgroups/", self.base_url);
        let payload = RequestGroupPayload {
            name: &request.group_id,
            proposal: &request.proposal_code,
            target: &request.object_id,
            site: &request.site_code,
            start: request.window_start.to_string(),
            end: request.window_end.to_string(),
            exposure_count: request.exp_count,
            exposure_time: request.exp_time,
            slot_length: request.slot_minutes,
            filter_pattern: &request.filter_pattern,
        };
        debug!(group_id = %request.group_id, url = %url, "submitting request group");

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Token {}", self.token))
            .send_json(&payload)?;

        let parsed: RequestGroupResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| NeoschedError::MalformedResponse(e.to_string()))?;

        let tracking_number = match parsed.id {
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            other => {
                warn!(group_id = %request.group_id, "portal response carried no id");
                return Err(NeoschedError::MalformedResponse(format!(
                    "missing request group id (got {other:?})"
                )));
            }
        };

        let receipt = SubmissionReceipt {
            tracking_number,
            request_ids: parsed.requests.iter().map(|r| r.id).collect(),
            duration_secs: parsed.requests.iter().map(|r| r.duration).sum(),
        };
        debug!(tracking_number = %receipt.tracking_number, "request group accepted");
        Ok(receipt)
    }
}
