//! # Control messages
//!
//! The planner replies to every telemetry packet with exactly one [`PlanResponse`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Trajectory to be followed by the vehicle, one point per simulation step.
///
/// Coordinates are world frame meters. `next_x` and `next_y` always have the same length.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ControlMsg {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response to a single telemetry packet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PlanResponse {
    /// The cycle succeeded and produced a new trajectory.
    Trajectory(ControlMsg),

    /// The cycle was rejected. The planner's state was left unchanged and the vehicle should
    /// keep following its previous path.
    CycleRejected { reason: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ControlMsg {
    /// Number of points in the trajectory.
    pub fn len(&self) -> usize {
        self.next_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_x.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
