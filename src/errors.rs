//! Error taxonomy of the `neosched` library.
//!
//! Every fallible operation in the crate returns [`NeoschedError`]. The
//! variants separate input problems (bad elements, unknown site), numerical
//! problems (non-converging Kepler solution), planning problems (magnitude
//! outside the slot bins, empty window) and network problems (transport,
//! portal rejection, malformed response). Batch loops never abort on a
//! per-object error: they record it and move to the next target.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NeoschedError {
    /// The orbital element set fails a physical invariant
    /// (eccentricity, semi-major axis, missing field for its kind).
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),

    /// Parabolic/hyperbolic orbits and artificial satellites have no
    /// propagator in this crate.
    #[error("unsupported object kind: {0}")]
    UnsupportedObjectKind(String),

    /// The site code is not in the static registry.
    #[error("unknown site code: {0}")]
    UnknownSite(String),

    /// Newton iteration on Kepler's equation did not converge.
    #[error("Kepler equation did not converge (M={mean_anomaly}, e={eccentricity})")]
    KeplerNotConverged { mean_anomaly: f64, eccentricity: f64 },

    /// The predicted magnitude falls outside the slot-length bins of the
    /// telescope class, so no slot can be planned.
    #[error("magnitude {magnitude} outside schedulable range for {telescope_class}")]
    MagnitudeOutOfRange {
        magnitude: f64,
        telescope_class: String,
    },

    /// The exposure plan does not fit in the slot.
    #[error("exposure plan infeasible: {0}")]
    InfeasibleExposurePlan(String),

    /// The requested or computed observing window is empty or inverted.
    #[error("invalid observing window: {0}")]
    InvalidWindow(String),

    /// The target already has an active block; submission must not proceed.
    #[error("target {0} already has an active block")]
    AlreadyActive(String),

    /// The portal accepted the connection but rejected the request group.
    #[error("submission rejected: {0}")]
    Submission(String),

    /// The portal answered with a body the client cannot interpret.
    #[error("malformed portal response: {0}")]
    MalformedResponse(String),

    /// Transport-level HTTP failure (includes timeouts).
    #[error(transparent)]
    Http(#[from] Box<ureq::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("candidate file error: {0}")]
    CandidateFile(String),
}

impl From<ureq::Error> for NeoschedError {
    fn from(err: ureq::Error) -> Self {
        NeoschedError::Http(Box::new(err))
    }
}
