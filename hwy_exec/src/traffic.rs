//! # Traffic model
//!
//! Tracked objects are rebuilt from the telemetry every cycle, there is no identity tracking
//! between cycles. Objects are assumed to keep a constant speed along the road.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tlm::ObjectMsg;
use nalgebra::Vector2;
use serde::Serialize;

use util::maths::{signed_wrapped_diff, wrap};

use crate::road::{Lanes, RoadPoint};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An object sharing the road with the ego vehicle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrackedObject {
    pub id: u64,

    /// Position in the road frame, as reported by the vehicle.
    pub road_pos: RoadPoint,

    /// World frame velocity.
    ///
    /// Units: meters/second
    pub vel_ms: Vector2<f64>,

    /// Magnitude of the velocity.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// All objects tracked this cycle.
#[derive(Debug, Clone, Default)]
pub struct Traffic {
    pub objects: Vec<TrackedObject>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrackedObject {
    pub fn from_msg(msg: &ObjectMsg) -> Self {
        let vel_ms = Vector2::new(msg.vx, msg.vy);

        Self {
            id: msg.id,
            road_pos: RoadPoint::new(msg.s, msg.d),
            vel_ms,
            speed_ms: vel_ms.norm(),
        }
    }

    /// Progress of the object after `dt_s` seconds, wrapped into one lap.
    pub fn propagated_s_m(&self, dt_s: f64, max_s_m: f64) -> f64 {
        wrap(self.road_pos.s_m + self.speed_ms * dt_s, max_s_m)
    }

    /// Signed gap from `ego_s_m` to the object after `dt_s` seconds.
    ///
    /// Positive gaps are ahead of the ego. The gap is measured the short way around the lap so it
    /// stays correct across the start/finish seam.
    pub fn gap_m(&self, ego_s_m: f64, dt_s: f64, max_s_m: f64) -> f64 {
        signed_wrapped_diff(self.propagated_s_m(dt_s, max_s_m), ego_s_m, max_s_m)
    }
}

impl Traffic {
    pub fn from_msgs(msgs: &[ObjectMsg]) -> Self {
        Self {
            objects: msgs.iter().map(TrackedObject::from_msg).collect(),
        }
    }

    /// Iterate over all objects in the given lane.
    pub fn in_lane<'a>(
        &'a self,
        lanes: &'a Lanes,
        lane: usize,
    ) -> impl Iterator<Item = &'a TrackedObject> + 'a {
        self.objects
            .iter()
            .filter(move |o| lanes.contains(lane, o.road_pos.d_m))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
