//! Parameters structure for planner control

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{behav, road::Lanes, traj_gen};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for planner control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Time between consecutive trajectory points, also the target cycle period.
    ///
    /// Units: seconds
    pub step_time_s: f64,

    /// Lane the ego starts in.
    pub initial_lane: usize,

    /// Reference speed at startup.
    ///
    /// Units: meters/second
    pub initial_speed_ms: f64,

    pub lanes: Lanes,

    pub behav: behav::Params,

    pub traj_gen: traj_gen::Params,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Params {
    /// Check the parameters describe a usable planner, returning a description of the first
    /// problem found.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("step_time_s", self.step_time_s),
            ("lanes.width_m", self.lanes.width_m),
            ("behav.safe_dist_m", self.behav.safe_dist_m),
            ("behav.speed_step_ms", self.behav.speed_step_ms),
            ("traj_gen.anchor_spacing_m", self.traj_gen.anchor_spacing_m),
            ("traj_gen.lookahead_x_m", self.traj_gen.lookahead_x_m),
        ];
        for (name, val) in positive.iter() {
            if !val.is_finite() || *val <= 0.0 {
                return Err(format!("{} must be positive, found {}", name, val));
            }
        }

        if !self.behav.max_speed_ms.is_finite() || self.behav.max_speed_ms < 0.0 {
            return Err(format!(
                "behav.max_speed_ms must not be negative, found {}",
                self.behav.max_speed_ms
            ));
        }
        if !self.initial_speed_ms.is_finite()
            || self.initial_speed_ms < 0.0
            || self.initial_speed_ms > self.behav.max_speed_ms
        {
            return Err(format!(
                "initial_speed_ms must be between 0 and {}, found {}",
                self.behav.max_speed_ms, self.initial_speed_ms
            ));
        }
        if self.lanes.num_lanes == 0 {
            return Err("lanes.num_lanes must be at least 1".into());
        }
        if !self.lanes.is_valid(self.initial_lane) {
            return Err(format!(
                "initial_lane must be less than {}, found {}",
                self.lanes.num_lanes, self.initial_lane
            ));
        }
        if self.traj_gen.horizon == 0 {
            return Err("traj_gen.horizon must be at least 1".into());
        }
        if self.traj_gen.num_anchors == 0 {
            return Err("traj_gen.num_anchors must be at least 1".into());
        }

        Ok(())
    }
}
