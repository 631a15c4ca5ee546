//! # Communications interface crate.
//!
//! Provides the messages exchanged between the planner and the vehicle (or simulator), and the
//! networking helpers used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Inbound telemetry sent by the vehicle once per cycle
pub mod tlm;

/// Outbound trajectory responses sent by the planner
pub mod ctrl;

/// Network module
pub mod net;
