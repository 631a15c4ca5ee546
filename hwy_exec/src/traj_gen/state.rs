//! Trajectory generator state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::{Isometry2, Point2, Vector2};
use serde::Serialize;
use std::sync::Arc;

use super::spline::CubicSpline;
use super::*;
use crate::road::{Lanes, RoadMap, RoadPoint};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Separation below which the last two points of the previous path are treated as the same
/// point, in which case they can't give a heading.
const MIN_REF_SEPARATION_M: f64 = 1e-3;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The trajectory generator.
#[derive(Debug, Clone)]
pub struct TrajGen {
    params: Params,
    lanes: Lanes,
    step_time_s: f64,
    map: Arc<RoadMap>,
}

/// Input data to the trajectory generator.
#[derive(Debug, Clone, Copy)]
pub struct TrajGenInput<'a> {
    /// Current ego position.
    ///
    /// Units: meters
    pub ego_position_m: Point2<f64>,

    /// Current ego heading.
    ///
    /// Units: radians
    pub ego_head_rad: f64,

    /// Progress from which the anchors are placed, the end of the previous path if there is one.
    ///
    /// Units: meters
    pub planning_s_m: f64,

    /// Part of the previous trajectory the vehicle hasn't driven yet.
    pub leftover_m: &'a [Point2<f64>],

    /// Lane to drive in.
    pub lane: usize,

    /// Speed to drive at.
    ///
    /// Units: meters/second
    pub ref_speed_ms: f64,
}

/// The status report of a single trajectory generation.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct TrajGenReport {
    /// Number of points carried over from the previous trajectory.
    pub num_leftover: usize,

    /// Number of new points appended.
    pub num_new: usize,

    /// True if the reference heading was taken from the ego rather than from the previous
    /// trajectory.
    pub head_from_ego: bool,

    /// Heading of the local frame.
    ///
    /// Units: radians
    pub ref_head_rad: f64,

    /// Step along the local X axis between new points.
    ///
    /// Units: meters
    pub x_step_m: f64,
}

/// The pose a new trajectory continues from.
struct RefPose {
    prev_m: Point2<f64>,
    point_m: Point2<f64>,
    head_rad: f64,
    head_from_ego: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrajGen {
    pub fn new(params: Params, lanes: Lanes, step_time_s: f64, map: Arc<RoadMap>) -> Self {
        Self {
            params,
            lanes,
            step_time_s,
            map,
        }
    }

    /// Generate a new trajectory.
    ///
    /// The leftover points are emitted first, unchanged, and new points are appended until the
    /// trajectory holds exactly `horizon` points. A leftover longer than the horizon is cut.
    pub fn generate(
        &self,
        input: &TrajGenInput,
    ) -> Result<(Trajectory, TrajGenReport), TrajGenError> {
        if !input.ref_speed_ms.is_finite() || input.ref_speed_ms < 0.0 {
            return Err(TrajGenError::InvalidSpeed(input.ref_speed_ms));
        }

        let horizon = self.params.horizon;
        let leftover = &input.leftover_m[..input.leftover_m.len().min(horizon)];

        let mut report = TrajGenReport {
            num_leftover: leftover.len(),
            ..Default::default()
        };

        // ---- REFERENCE POSE ----

        let ref_pose = self.reference_pose(input, leftover);
        report.head_from_ego = ref_pose.head_from_ego;
        report.ref_head_rad = ref_pose.head_rad;

        // ---- ANCHORS ----

        let lane_d_m = self.lanes.centre_d_m(input.lane);
        let mut anchors_m = Vec::with_capacity(2 + self.params.num_anchors);
        anchors_m.push(ref_pose.prev_m);
        anchors_m.push(ref_pose.point_m);
        for i in 1..=self.params.num_anchors {
            anchors_m.push(self.map.to_cartesian(&RoadPoint::new(
                input.planning_s_m + self.params.anchor_spacing_m * i as f64,
                lane_d_m,
            )));
        }

        // ---- CURVE FIT ----

        // Local frame has its origin at the reference point and X along the reference heading
        let local_frame = Isometry2::new(ref_pose.point_m.coords, ref_pose.head_rad);

        let (local_x, local_y): (Vec<f64>, Vec<f64>) = anchors_m
            .iter()
            .map(|p| {
                let l = local_frame.inverse_transform_point(p);
                (l.x, l.y)
            })
            .unzip();

        trace!("Local anchors: x {:?}, y {:?}", local_x, local_y);

        let spline = CubicSpline::new(&local_x, &local_y).map_err(TrajGenError::SplineError)?;

        // ---- RESAMPLE ----

        let target_x_m = self.params.lookahead_x_m;
        let target_y_m = spline.eval(target_x_m);
        let target_dist_m = target_x_m.hypot(target_y_m);

        let step_m = input.ref_speed_ms * self.step_time_s;
        let x_step_m = target_x_m * step_m / target_dist_m;
        report.x_step_m = x_step_m;

        let mut points_m = Vec::with_capacity(horizon);
        points_m.extend_from_slice(leftover);

        let mut x_add_on_m = 0.0;
        while points_m.len() < horizon {
            x_add_on_m += x_step_m;
            let local = Point2::new(x_add_on_m, spline.eval(x_add_on_m));
            points_m.push(local_frame.transform_point(&local));
        }
        report.num_new = horizon - leftover.len();

        if let Some(i) = points_m
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(TrajGenError::NonFiniteOutput(i));
        }

        Ok((Trajectory { points_m }, report))
    }

    /// Choose the two points and heading the new trajectory continues from.
    ///
    /// With at least two distinct leftover points the last two are used. Otherwise the reference
    /// is the ego itself, with a point one meter behind it along its heading.
    fn reference_pose(&self, input: &TrajGenInput, leftover: &[Point2<f64>]) -> RefPose {
        if leftover.len() >= 2 {
            let point_m = leftover[leftover.len() - 1];
            let prev_m = leftover[leftover.len() - 2];
            let dir = point_m - prev_m;

            if dir.norm() >= MIN_REF_SEPARATION_M {
                return RefPose {
                    prev_m,
                    point_m,
                    head_rad: dir.y.atan2(dir.x),
                    head_from_ego: false,
                };
            }

            // A stopped vehicle's path gives no heading, so keep the end point and use the ego's
            return RefPose {
                prev_m: point_m - head_vec(input.ego_head_rad),
                point_m,
                head_rad: input.ego_head_rad,
                head_from_ego: true,
            };
        }

        RefPose {
            prev_m: input.ego_position_m - head_vec(input.ego_head_rad),
            point_m: input.ego_position_m,
            head_rad: input.ego_head_rad,
            head_from_ego: true,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn head_vec(head_rad: f64) -> Vector2<f64> {
    Vector2::new(head_rad.cos(), head_rad.sin())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::road::test_util::circle_map;
    use util::maths::signed_wrapped_diff;

    const STEP_TIME_S: f64 = 0.02;
    const HORIZON: usize = 50;

    fn traj_gen() -> TrajGen {
        TrajGen::new(
            Params {
                horizon: HORIZON,
                anchor_spacing_m: 30.0,
                num_anchors: 3,
                lookahead_x_m: 30.0,
            },
            Lanes {
                width_m: 4.0,
                num_lanes: 3,
            },
            STEP_TIME_S,
            Arc::new(circle_map().unwrap()),
        )
    }

    /// Ego sitting in the centre of lane 1 at the given progress.
    fn ego_at(tg: &TrajGen, s_m: f64) -> (Point2<f64>, f64) {
        let pos = tg.map.to_cartesian(&RoadPoint::new(s_m, 6.0));
        let head = tg.map.segment_head_rad(tg.map.closest_waypoint(&pos));
        (pos, head)
    }

    fn input<'a>(
        tg: &TrajGen,
        s_m: f64,
        leftover_m: &'a [Point2<f64>],
        ref_speed_ms: f64,
    ) -> TrajGenInput<'a> {
        let (ego_position_m, ego_head_rad) = ego_at(tg, s_m);
        TrajGenInput {
            ego_position_m,
            ego_head_rad,
            planning_s_m: s_m,
            leftover_m,
            lane: 1,
            ref_speed_ms,
        }
    }

    #[test]
    fn test_fresh_start() {
        let tg = traj_gen();
        let speed_ms = 20.0;

        let (traj, rpt) = tg.generate(&input(&tg, 100.0, &[], speed_ms)).unwrap();

        assert_eq!(traj.len(), HORIZON);
        assert_eq!(rpt.num_leftover, 0);
        assert_eq!(rpt.num_new, HORIZON);
        assert!(rpt.head_from_ego);

        let (ego, _) = ego_at(&tg, 100.0);
        let mut prev = ego;
        let mut prev_s = tg.map.to_road_frame(&ego, rpt.ref_head_rad).s_m;

        for p in traj.points_m.iter() {
            // Spacing matches the speed within a couple of percent on this gentle curve
            let step = nalgebra::distance(&prev, p);
            assert!(
                (step - speed_ms * STEP_TIME_S).abs() < 0.02 * speed_ms * STEP_TIME_S,
                "step {}",
                step
            );

            let rp = tg.map.to_road_frame(p, rpt.ref_head_rad);
            assert_eq!(tg.lanes.lane_of(rp.d_m), Some(1), "d = {}", rp.d_m);
            assert!(signed_wrapped_diff(rp.s_m, prev_s, tg.map.max_s_m()) > 0.0);

            prev = *p;
            prev_s = rp.s_m;
        }
    }

    #[test]
    fn test_continuity() {
        let tg = traj_gen();

        let (first, _) = tg.generate(&input(&tg, 100.0, &[], 15.0)).unwrap();

        // The vehicle drove the first 12 points
        let leftover = &first.points_m[12..];
        let end = leftover[leftover.len() - 1];
        let end_s = tg
            .map
            .to_road_frame(&end, tg.map.segment_head_rad(tg.map.closest_waypoint(&end)))
            .s_m;
        let mut inp = input(&tg, 100.0, leftover, 15.0);
        inp.planning_s_m = end_s;

        let (second, rpt) = tg.generate(&inp).unwrap();

        assert_eq!(second.len(), HORIZON);
        assert_eq!(rpt.num_leftover, leftover.len());
        assert_eq!(rpt.num_new, 12);
        assert!(!rpt.head_from_ego);
        assert_eq!(&second.points_m[..leftover.len()], leftover);

        // The new points carry on at the same spacing
        let n = leftover.len();
        let last_step = nalgebra::distance(&second.points_m[n - 1], &second.points_m[n - 2]);
        let first_new_step = nalgebra::distance(&second.points_m[n], &second.points_m[n - 1]);
        assert!((last_step - first_new_step).abs() < 0.01);
    }

    #[test]
    fn test_long_leftover_truncated() {
        let tg = traj_gen();

        let (first, _) = tg.generate(&input(&tg, 100.0, &[], 15.0)).unwrap();
        let mut long = first.points_m.clone();
        long.extend_from_slice(&first.points_m[..10]);

        let (traj, rpt) = tg.generate(&input(&tg, 100.0, &long, 15.0)).unwrap();

        assert_eq!(traj.len(), HORIZON);
        assert_eq!(rpt.num_new, 0);
        assert_eq!(traj.points_m, first.points_m);
    }

    #[test]
    fn test_zero_speed_is_stationary() {
        let tg = traj_gen();
        let (ego, _) = ego_at(&tg, 100.0);

        let (traj, _) = tg.generate(&input(&tg, 100.0, &[], 0.0)).unwrap();
        for p in traj.points_m.iter() {
            assert!(nalgebra::distance(p, &ego) < 1e-9);
        }

        // The stationary path can be continued from
        let leftover = &traj.points_m[5..];
        let (traj, rpt) = tg.generate(&input(&tg, 100.0, leftover, 0.1)).unwrap();
        assert!(rpt.head_from_ego);
        assert_eq!(traj.len(), HORIZON);
    }

    #[test]
    fn test_errors() {
        let tg = traj_gen();

        match tg.generate(&input(&tg, 100.0, &[], std::f64::NAN)) {
            Err(TrajGenError::InvalidSpeed(_)) => (),
            r => panic!("Expected an invalid speed error, got {:?}", r),
        }

        // A previous path heading the wrong way puts the anchors behind the reference point
        let (ego, head) = ego_at(&tg, 100.0);
        let backwards = [ego, ego - head_vec(head)];
        match tg.generate(&input(&tg, 100.0, &backwards, 10.0)) {
            Err(TrajGenError::SplineError(_)) => (),
            r => panic!("Expected a spline error, got {:?}", r),
        }
    }

    #[test]
    fn test_ctrl_msg() {
        let traj = Trajectory {
            points_m: vec![Point2::new(1.0, 2.0), Point2::new(3.0, 4.0)],
        };
        let msg = traj.to_ctrl_msg();
        assert_eq!(msg.next_x, vec![1.0, 3.0]);
        assert_eq!(msg.next_y, vec![2.0, 4.0]);
    }
}
