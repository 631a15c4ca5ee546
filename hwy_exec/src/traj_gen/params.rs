//! Parameters structure for the trajectory generator

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the trajectory generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Number of points in every generated trajectory.
    pub horizon: usize,

    /// Progress between consecutive anchor points ahead of the ego.
    ///
    /// Units: meters
    pub anchor_spacing_m: f64,

    /// Number of anchor points placed ahead of the ego.
    pub num_anchors: usize,

    /// Distance ahead, in the local frame, used to linearise the spline when choosing the step
    /// between new points.
    ///
    /// Units: meters
    pub lookahead_x_m: f64,
}
