//! Behaviour planner state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use serde::Serialize;

use util::maths::clamp;

use super::*;
use crate::road::Lanes;
use crate::traffic::Traffic;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The behaviour planner.
///
/// The planner holds no state of its own between cycles, the persistent lane and speed are passed
/// in and returned by [`BehavPlanner::plan`] so that the caller decides when to commit them.
#[derive(Debug, Clone)]
pub struct BehavPlanner {
    params: Params,
    lanes: Lanes,
    max_s_m: f64,
}

/// Input data to the behaviour planner.
#[derive(Debug, Clone, Copy)]
pub struct BehavInput<'a> {
    /// Progress of the ego at the end of the previous trajectory.
    ///
    /// Units: meters
    pub ego_s_m: f64,

    /// Time until the previous trajectory is used up. Objects are propagated by this much.
    ///
    /// Units: seconds
    pub time_to_path_end_s: f64,

    pub traffic: &'a Traffic,
}

/// The status report of a single behaviour decision.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct BehavReport {
    /// An object in the current lane is ahead and closer than the safe distance.
    pub too_close: bool,

    /// The lane to the left could be changed into. Only evaluated when too close.
    pub left_free: bool,

    /// The lane to the right could be changed into. Only evaluated when too close.
    pub right_free: bool,

    /// Smallest positive gap to an object in the current lane, if there is one.
    pub closest_ahead_m: Option<f64>,

    /// Lane change decided this cycle.
    pub lane_change: Option<LaneChange>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BehavPlanner {
    pub fn new(params: Params, lanes: Lanes, max_s_m: f64) -> Self {
        Self {
            params,
            lanes,
            max_s_m,
        }
    }

    /// Decide on the lane and speed for this cycle.
    ///
    /// Returns the updated planner state, which the caller must commit itself, and a report on the
    /// decision.
    pub fn plan(
        &self,
        input: &BehavInput,
        state: &PlannerState,
    ) -> Result<(PlannerState, BehavReport), BehavError> {
        if !self.lanes.is_valid(state.lane) {
            return Err(BehavError::InvalidLane(state.lane));
        }
        if !input.ego_s_m.is_finite() {
            return Err(BehavError::NonFiniteInput("ego_s_m"));
        }
        if !input.time_to_path_end_s.is_finite() {
            return Err(BehavError::NonFiniteInput("time_to_path_end_s"));
        }

        let mut report = BehavReport::default();
        let mut new_state = *state;

        // ---- OBJECT AHEAD ----

        report.closest_ahead_m = input
            .traffic
            .in_lane(&self.lanes, state.lane)
            .map(|o| self.gap_m(o, input))
            .filter(|g| *g > 0.0)
            .fold(None, |min: Option<f64>, g| match min {
                Some(m) if m <= g => Some(m),
                _ => Some(g),
            });

        report.too_close = matches!(
            report.closest_ahead_m,
            Some(g) if g < self.params.safe_dist_m
        );

        // ---- LANE CHANGE ----

        if report.too_close {
            let left = self.lanes.left_of(state.lane);
            let right = self.lanes.right_of(state.lane);

            report.left_free = left.map_or(false, |l| self.lane_free(l, input));
            report.right_free = right.map_or(false, |l| self.lane_free(l, input));

            let target = match (left, right) {
                (Some(l), _) if report.left_free => Some(l),
                (_, Some(r)) if report.right_free => Some(r),
                _ => None,
            };

            if let Some(to) = target {
                debug!("Changing lane from {} to {}", state.lane, to);
                report.lane_change = Some(LaneChange {
                    from: state.lane,
                    to,
                });
                new_state.lane = to;
            }
        }

        // ---- SPEED ----

        if report.too_close {
            new_state.ref_speed_ms -= self.params.speed_step_ms;
        } else if new_state.ref_speed_ms < self.params.max_speed_ms {
            new_state.ref_speed_ms += self.params.speed_step_ms;
        }
        new_state.ref_speed_ms = clamp(new_state.ref_speed_ms, 0.0, self.params.max_speed_ms);

        trace!(
            "Behaviour: too_close {}, left_free {}, right_free {}, lane {}, speed {:.3} m/s",
            report.too_close,
            report.left_free,
            report.right_free,
            new_state.lane,
            new_state.ref_speed_ms
        );

        Ok((new_state, report))
    }

    /// True if no object in the lane is within the safe distance of the ego, ahead or behind.
    fn lane_free(&self, lane: usize, input: &BehavInput) -> bool {
        input
            .traffic
            .in_lane(&self.lanes, lane)
            .all(|o| self.gap_m(o, input).abs() > self.params.safe_dist_m)
    }

    fn gap_m(&self, obj: &crate::traffic::TrackedObject, input: &BehavInput) -> f64 {
        obj.gap_m(input.ego_s_m, input.time_to_path_end_s, self.max_s_m)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tlm::ObjectMsg;

    const MAX_S_M: f64 = 6945.554;
    const SAFE_DIST_M: f64 = 30.0;
    const MAX_SPEED_MS: f64 = 22.0;
    const STEP_MS: f64 = 0.1;

    fn planner() -> BehavPlanner {
        BehavPlanner::new(
            Params {
                safe_dist_m: SAFE_DIST_M,
                max_speed_ms: MAX_SPEED_MS,
                speed_step_ms: STEP_MS,
            },
            Lanes {
                width_m: 4.0,
                num_lanes: 3,
            },
            MAX_S_M,
        )
    }

    fn make_traffic(objs: &[(f64, f64, f64)]) -> Traffic {
        let msgs: Vec<ObjectMsg> = objs
            .iter()
            .enumerate()
            .map(|(i, (s, d, vx))| ObjectMsg {
                id: i as u64,
                x: 0.0,
                y: 0.0,
                vx: *vx,
                vy: 0.0,
                s: *s,
                d: *d,
            })
            .collect();
        Traffic::from_msgs(&msgs)
    }

    fn input(ego_s_m: f64, traffic: &Traffic) -> BehavInput {
        BehavInput {
            ego_s_m,
            time_to_path_end_s: 0.0,
            traffic,
        }
    }

    #[test]
    fn test_speed_ramp() {
        let planner = planner();
        let traffic = Traffic::default();
        let mut state = PlannerState {
            lane: 1,
            ref_speed_ms: 0.0,
        };

        for n in 1..300 {
            let (s, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();
            state = s;

            assert!(!rpt.too_close);
            assert!(rpt.lane_change.is_none());
            assert_eq!(state.lane, 1);

            let expected = MAX_SPEED_MS.min(n as f64 * STEP_MS);
            assert!(
                (state.ref_speed_ms - expected).abs() < 1e-9,
                "cycle {}: {} != {}",
                n,
                state.ref_speed_ms,
                expected
            );
        }
    }

    #[test]
    fn test_too_close_slows_down() {
        let planner = planner();

        // Stationary object 20 m ahead in lane 1, and blockers in both neighbouring lanes
        let traffic = make_traffic(&[(120.0, 6.0, 0.0), (100.0, 2.0, 0.0), (100.0, 10.0, 0.0)]);
        let state = PlannerState {
            lane: 1,
            ref_speed_ms: 10.0,
        };

        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();

        assert!(rpt.too_close);
        assert!(!rpt.left_free);
        assert!(!rpt.right_free);
        assert_eq!(rpt.closest_ahead_m, Some(20.0));
        assert_eq!(new_state.lane, 1);
        assert!((new_state.ref_speed_ms - (10.0 - STEP_MS)).abs() < 1e-12);
    }

    #[test]
    fn test_lane_change_prefers_left() {
        let planner = planner();
        let eps = 1e-3;

        let traffic = make_traffic(&[(100.0 + SAFE_DIST_M - eps, 6.0, 0.0)]);
        let state = PlannerState {
            lane: 1,
            ref_speed_ms: 10.0,
        };

        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();

        assert!(rpt.too_close);
        assert!(rpt.left_free);
        assert!(rpt.right_free);
        assert_eq!(rpt.lane_change, Some(LaneChange { from: 1, to: 0 }));
        assert_eq!(new_state.lane, 0);
        assert!(new_state.ref_speed_ms < 10.0);
    }

    #[test]
    fn test_lane_change_right_when_left_blocked() {
        let planner = planner();

        // Object behind the ego in the left lane, inside the safe distance
        let traffic = make_traffic(&[(110.0, 6.0, 0.0), (80.0, 2.0, 0.0)]);
        let state = PlannerState {
            lane: 1,
            ref_speed_ms: 10.0,
        };

        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();

        assert!(!rpt.left_free);
        assert!(rpt.right_free);
        assert_eq!(new_state.lane, 2);

        // An object exactly at the safe distance, ahead or behind, still blocks the lane
        let traffic = make_traffic(&[(110.0, 6.0, 0.0), (100.0 + SAFE_DIST_M, 2.0, 0.0)]);
        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();
        assert!(!rpt.left_free);
        assert!(rpt.right_free);
        assert_eq!(new_state.lane, 2);

        let traffic = make_traffic(&[
            (110.0, 6.0, 0.0),
            (100.0 - SAFE_DIST_M, 2.0, 0.0),
            (100.0 - SAFE_DIST_M, 10.0, 0.0),
        ]);
        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();
        assert!(!rpt.left_free);
        assert!(!rpt.right_free);
        assert_eq!(new_state.lane, 1);
    }

    #[test]
    fn test_lane_bounds() {
        let planner = planner();

        // Leftmost lane can only go right
        let traffic = make_traffic(&[(110.0, 2.0, 0.0)]);
        let state = PlannerState {
            lane: 0,
            ref_speed_ms: 10.0,
        };
        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();
        assert!(!rpt.left_free);
        assert_eq!(new_state.lane, 1);

        // Rightmost lane with the left lane blocked stays put
        let traffic = make_traffic(&[(110.0, 10.0, 0.0), (100.0, 6.0, 0.0)]);
        let state = PlannerState {
            lane: 2,
            ref_speed_ms: 0.05,
        };
        let (new_state, rpt) = planner.plan(&input(100.0, &traffic), &state).unwrap();
        assert!(rpt.too_close);
        assert!(!rpt.right_free);
        assert_eq!(new_state.lane, 2);
        assert_eq!(new_state.ref_speed_ms, 0.0);
    }

    #[test]
    fn test_propagation_and_seam() {
        let planner = planner();
        let state = PlannerState {
            lane: 1,
            ref_speed_ms: 10.0,
        };

        // Object 40 m ahead moving at 5 m/s is 45 m ahead when the previous path ends
        let traffic = make_traffic(&[(140.0, 6.0, 5.0)]);
        let inp = BehavInput {
            ego_s_m: 100.0,
            time_to_path_end_s: 1.0,
            traffic: &traffic,
        };
        let (_, rpt) = planner.plan(&inp, &state).unwrap();
        assert!(!rpt.too_close);
        assert_eq!(rpt.closest_ahead_m, Some(45.0));

        // Object just past the seam is ahead of an ego just before it
        let traffic = make_traffic(&[(10.0, 6.0, 0.0)]);
        let (_, rpt) = planner
            .plan(&input(MAX_S_M - 5.0, &traffic), &state)
            .unwrap();
        assert!(rpt.too_close);
    }

    #[test]
    fn test_invalid_state() {
        let planner = planner();
        let traffic = Traffic::default();
        let state = PlannerState {
            lane: 3,
            ref_speed_ms: 0.0,
        };

        match planner.plan(&input(0.0, &traffic), &state) {
            Err(BehavError::InvalidLane(3)) => (),
            r => panic!("Expected an invalid lane error, got {:?}", r),
        }
    }
}
