//! # Behaviour planner
//!
//! Once per cycle the behaviour planner looks at the traffic around the ego and decides which lane
//! to drive in and how fast to go.
//!
//! The decision rules are:
//!  1. Objects are propagated forward to the time at which the previous trajectory ends.
//!  1. If an object in the current lane is ahead by less than the safe distance the ego is too
//!     close.
//!  1. When too close, a neighbouring lane is free if it exists and has no object within the safe
//!     distance either side of the ego. The left lane is preferred over the right one.
//!  1. The reference speed is reduced by one step when too close, otherwise it's increased by one
//!     step up to the maximum speed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of the planner which persists between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannerState {
    /// Lane the ego is driving in, or changing into.
    pub lane: usize,

    /// Speed the ego is aiming for.
    ///
    /// Units: meters/second
    pub ref_speed_ms: f64,
}

/// A change of lane decided during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneChange {
    pub from: usize,
    pub to: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during behaviour planning.
#[derive(Debug, thiserror::Error)]
pub enum BehavError {
    #[error("The current lane ({0}) is not a valid lane")]
    InvalidLane(usize),

    #[error("Behaviour input {0} is not finite")]
    NonFiniteInput(&'static str),
}
