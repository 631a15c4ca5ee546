//! Lane geometry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Lane layout on one side of the road.
///
/// Lane `k` occupies lateral offsets `d` in `[k * width_m, (k + 1) * width_m)`, so lane 0 is the
/// one next to the centreline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Lanes {
    /// Width of a single lane.
    ///
    /// Units: meters
    pub width_m: f64,

    /// Number of lanes.
    pub num_lanes: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Lanes {
    /// Get the lane containing the given lateral offset, or `None` if it's off the road.
    pub fn lane_of(&self, d_m: f64) -> Option<usize> {
        if !d_m.is_finite() || d_m < 0.0 {
            return None;
        }

        let lane = (d_m / self.width_m).floor() as usize;

        if lane < self.num_lanes {
            Some(lane)
        } else {
            None
        }
    }

    /// True if the lateral offset is inside the given lane.
    pub fn contains(&self, lane: usize, d_m: f64) -> bool {
        let lower = self.width_m * lane as f64;
        d_m >= lower && d_m < lower + self.width_m
    }

    /// Lateral offset of the centre of the given lane.
    pub fn centre_d_m(&self, lane: usize) -> f64 {
        self.width_m * lane as f64 + 0.5 * self.width_m
    }

    pub fn is_valid(&self, lane: usize) -> bool {
        lane < self.num_lanes
    }

    /// The lane to the left (toward the centreline), if there is one.
    pub fn left_of(&self, lane: usize) -> Option<usize> {
        lane.checked_sub(1).filter(|l| self.is_valid(*l))
    }

    /// The lane to the right (away from the centreline), if there is one.
    pub fn right_of(&self, lane: usize) -> Option<usize> {
        Some(lane + 1).filter(|l| self.is_valid(*l))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
