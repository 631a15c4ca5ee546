//! Parameters structure for the behaviour planner

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the behaviour planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Following distance below which the ego is too close to the object ahead. Also the
    /// clearance required either side of the ego in a lane before changing into it.
    ///
    /// Units: meters
    pub safe_dist_m: f64,

    /// Maximum reference speed.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Change in reference speed each cycle.
    ///
    /// Units: meters/second
    pub speed_step_ms: f64,
}
