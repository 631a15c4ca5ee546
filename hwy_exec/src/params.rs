//! # Highway Executable Parameters
//!
//! This module provide parameters for the highway planner executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use util::logger::{self, LevelFilter, LoggerInitError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HwyExecParams {
    /// Minimum log level, at least `info`. Overridden by `--debug` on the command line.
    pub log_level: String,

    /// Per-module log levels, keyed by module path (for example `hwy_lib::traj_gen`).
    #[serde(default)]
    pub module_log_levels: BTreeMap<String, String>,

    /// Path to the road map CSV file, relative to the software root.
    pub map_path: String,

    /// Total length of one lap of the road.
    ///
    /// Units: meters
    pub max_s_m: f64,

    /// Point used to decide the sign of the lateral offset. Points farther from this reference
    /// than the centreline have a positive offset.
    ///
    /// Units: meters
    pub sign_ref_m: [f64; 2],

    /// Name of the planner control parameter file.
    pub planner_ctrl_params: String,

    /// Network endpoint the planner server binds to.
    pub planner_endpoint: String,

    /// Server socket receive timeout.
    ///
    /// Units: milliseconds
    pub recv_timeout_ms: i32,

    /// Server socket send timeout.
    ///
    /// Units: milliseconds
    pub send_timeout_ms: i32,

    /// Server socket linger period.
    ///
    /// Units: milliseconds
    pub linger_ms: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HwyExecParams {
    /// Parse the log levels into the minimum level and the per-module overrides.
    pub fn log_levels(
        &self,
    ) -> Result<(LevelFilter, Vec<(String, LevelFilter)>), LoggerInitError> {
        let min_level = logger::parse_level(&self.log_level)?;
        logger::check_min_level(min_level)?;

        let module_levels = self
            .module_log_levels
            .iter()
            .map(|(module, level)| Ok((module.clone(), logger::parse_level(level)?)))
            .collect::<Result<Vec<_>, LoggerInitError>>()?;

        Ok((min_level, module_levels))
    }

    /// Extract the network parameters.
    pub fn net_params(&self) -> NetParams {
        NetParams {
            planner_endpoint: self.planner_endpoint.clone(),
            recv_timeout_ms: self.recv_timeout_ms,
            send_timeout_ms: self.send_timeout_ms,
            linger_ms: self.linger_ms,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
