//! # Planner control
//!
//! Runs one planning cycle per telemetry packet:
//!  1. Validate the telemetry and convert it into the planner's units.
//!  1. Run the behaviour planner to choose the lane and speed.
//!  1. Run the trajectory generator to produce the new trajectory.
//!  1. Commit the new lane and speed.
//!
//! If any step fails the cycle is rejected and the persistent state is left as it was.

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

use comms_if::tlm::{TelemetryMsg, TlmError};
use nalgebra::Point2;

use util::{archive::ArchiveError, convert::mph_to_ms, params::LoadError};

use crate::{
    behav::BehavError,
    road::{RoadMap, RoadPoint},
    traj_gen::TrajGenError,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The ego vehicle, as reported by the telemetry, in the planner's units.
#[derive(Debug, Clone, PartialEq)]
pub struct EgoState {
    /// Units: meters
    pub position_m: Point2<f64>,

    /// Units: radians
    pub head_rad: f64,

    /// Units: meters/second
    pub speed_ms: f64,

    /// Ego position in the road frame, recomputed from the world position.
    pub road_pos: RoadPoint,

    /// Part of the previous trajectory not yet driven.
    pub leftover_m: Vec<Point2<f64>>,

    /// Road frame position at the end of the previous trajectory, as reported by the vehicle.
    pub end_path: RoadPoint,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Potential errors that could occur during initialisation of the module.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Could not load the planner parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid planner parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the planner archive: {0}")]
    ArchiveError(ArchiveError),
}

/// Potential errors that can occur during a planning cycle.
#[derive(Debug, thiserror::Error)]
pub enum PlannerCtrlError {
    #[error("Invalid telemetry: {0}")]
    InvalidTelemetry(TlmError),

    #[error("Behaviour planning failed: {0}")]
    BehavError(BehavError),

    #[error("Trajectory generation failed: {0}")]
    TrajGenError(TrajGenError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EgoState {
    /// Build the ego state from a validated telemetry packet.
    ///
    /// This is the only place the telemetry's degrees and miles/hour are converted.
    pub fn from_tlm(tlm: &TelemetryMsg, map: &RoadMap) -> Self {
        let position_m = Point2::new(tlm.x, tlm.y);
        let head_rad = tlm.yaw.to_radians();

        Self {
            position_m,
            head_rad,
            speed_ms: mph_to_ms(tlm.speed),
            road_pos: map.to_road_frame(&position_m, head_rad),
            leftover_m: tlm
                .previous_path_x
                .iter()
                .zip(tlm.previous_path_y.iter())
                .map(|(x, y)| Point2::new(*x, *y))
                .collect(),
            end_path: RoadPoint::new(tlm.end_path_s, tlm.end_path_d),
        }
    }
}
