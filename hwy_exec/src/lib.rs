//! # Highway planner library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the highway planner crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Executable parameters
pub mod params;

/// Road map - the fixed centreline waypoints, lane geometry and the road frame transform
pub mod road;

/// Traffic model - tracked objects expressed in the road frame
pub mod traffic;

/// Behaviour planner - chooses the target lane and speed each cycle
pub mod behav;

/// Trajectory generator - turns a target lane and speed into a sampled trajectory
pub mod traj_gen;

/// Planner control - runs one planning cycle per telemetry packet
pub mod planner_ctrl;

/// Data store - cycle counters and the latest status
pub mod data_store;

/// Planner server - answers telemetry requests over the network
pub mod planner_server;

/// Telemetry replay - feeds a recorded telemetry log through the planner
pub mod tlm_replay;
