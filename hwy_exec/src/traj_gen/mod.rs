//! # Trajectory generator
//!
//! Turns the lane and speed chosen by the behaviour planner into a sequence of world positions,
//! one per simulation step, which continues on from the part of the previous trajectory the
//! vehicle hasn't driven yet.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod spline;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use comms_if::ctrl::ControlMsg;
use nalgebra::Point2;
use spline::SplineError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A trajectory sampled at the simulation step time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    /// Points in the world frame.
    ///
    /// Units: meters
    pub points_m: Vec<Point2<f64>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during trajectory generation.
#[derive(Debug, thiserror::Error)]
pub enum TrajGenError {
    #[error("Could not fit the trajectory spline: {0}")]
    SplineError(SplineError),

    #[error("The reference speed ({0} m/s) must be finite and not negative")]
    InvalidSpeed(f64),

    #[error("Trajectory point {0} is not finite")]
    NonFiniteOutput(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    /// Convert into the outbound control message.
    pub fn to_ctrl_msg(&self) -> ControlMsg {
        ControlMsg {
            next_x: self.points_m.iter().map(|p| p.x).collect(),
            next_y: self.points_m.iter().map(|p| p.y).collect(),
        }
    }
}
