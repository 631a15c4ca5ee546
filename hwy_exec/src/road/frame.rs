//! # Road frame transform
//!
//! Conversion between world positions and the road frame `(s, d)`, where `s` is the progress
//! along the centreline and `d` is the signed lateral offset from it. Positive `d` is to the right
//! of the direction of travel, which is the side away from the map's sign reference point.
//!
//! The transform is only accurate close to the polyline. Far from the road the projection may pick
//! a segment which doesn't correspond to the true nearest point on the centreline.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use util::maths::{abs_ang_dist, wrap};

use super::RoadMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point in the road frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadPoint {
    /// Progress along the road, in `[0, max_s_m)`.
    ///
    /// Units: meters
    pub s_m: f64,

    /// Signed lateral offset from the centreline.
    ///
    /// Units: meters
    pub d_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoadPoint {
    pub fn new(s_m: f64, d_m: f64) -> Self {
        Self { s_m, d_m }
    }
}

impl RoadMap {
    /// Index of the waypoint closest to the given position.
    ///
    /// If several waypoints are equally close the first one is returned.
    pub fn closest_waypoint(&self, pos_m: &Point2<f64>) -> usize {
        self.waypoints
            .iter()
            .enumerate()
            .min_by_key(|(_, wp)| OrderedFloat(nalgebra::distance(&wp.position_m, pos_m)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Index of the next waypoint ahead of a vehicle at `pos_m` facing `head_rad`.
    ///
    /// This is the closest waypoint, unless it lies more than 45 degrees away from the heading, in
    /// which case it's taken to be behind the vehicle and the waypoint after it is used.
    pub fn next_waypoint(&self, pos_m: &Point2<f64>, head_rad: f64) -> usize {
        let closest = self.closest_waypoint(pos_m);

        let to_wp = self.waypoints[closest].position_m - pos_m;
        let bearing_rad = to_wp.y.atan2(to_wp.x);

        if abs_ang_dist(head_rad, bearing_rad) > FRAC_PI_4 {
            self.next_index(closest)
        } else {
            closest
        }
    }

    /// Convert a world position into the road frame.
    ///
    /// The position is projected onto the segment ending at the next waypoint ahead of it.
    pub fn to_road_frame(&self, pos_m: &Point2<f64>, head_rad: f64) -> RoadPoint {
        let next = self.next_waypoint(pos_m, head_rad);
        let prev = self.prev_index(next);

        let start_m = self.waypoints[prev].position_m;
        let seg = self.waypoints[next].position_m - start_m;
        let seg_len_m = seg.norm();

        // Signed distance along the segment of the projection
        let along_m = (pos_m - start_m).dot(&seg) / seg_len_m;
        let proj_m = start_m + seg * (along_m / seg_len_m);

        let mut d_m = nalgebra::distance(pos_m, &proj_m);
        if nalgebra::distance(&self.sign_ref_m, pos_m)
            <= nalgebra::distance(&self.sign_ref_m, &proj_m)
        {
            d_m = -d_m;
        }

        let s_m = wrap(
            self.waypoints[0].s_m + self.arc_s_m[prev] + along_m,
            self.max_s_m,
        );

        RoadPoint { s_m, d_m }
    }

    /// Convert a road frame point into a world position.
    ///
    /// Progress is wrapped into one lap first. Progress before the first waypoint lies on the
    /// closing segment from the last waypoint back to the first. Past the end of a segment the
    /// position is extrapolated along it, with reduced accuracy.
    pub fn to_cartesian(&self, point: &RoadPoint) -> Point2<f64> {
        let s_m = wrap(point.s_m, self.max_s_m);

        let last = self.waypoints.len() - 1;
        let (prev, seg_s_m) = if s_m < self.waypoints[0].s_m {
            (last, s_m + self.max_s_m - self.waypoints[last].s_m)
        } else {
            // At least one waypoint has s <= s_m here, so the index is at least 1
            let prev = self.waypoints.partition_point(|wp| wp.s_m <= s_m) - 1;
            (prev, s_m - self.waypoints[prev].s_m)
        };
        let next = self.next_index(prev);

        let start_m = self.waypoints[prev].position_m;
        let seg = self.waypoints[next].position_m - start_m;
        let head_rad = seg.y.atan2(seg.x);

        let centre_m = start_m + seg.normalize() * seg_s_m;

        // Offset to the right of the direction of travel
        let perp_rad = head_rad - FRAC_PI_2;

        Point2::new(
            centre_m.x + point.d_m * perp_rad.cos(),
            centre_m.y + point.d_m * perp_rad.sin(),
        )
    }

    /// Heading of the segment starting at the given waypoint.
    pub fn segment_head_rad(&self, index: usize) -> f64 {
        let seg = self.waypoints[self.next_index(index)].position_m
            - self.waypoints[index].position_m;
        seg.y.atan2(seg.x)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::road::test_util::{circle_map, shifted_circle_map};
    use crate::road::{Lanes, Waypoint};
    use nalgebra::Vector2;
    use util::maths::signed_wrapped_diff;

    #[test]
    fn test_waypoint_round_trip() {
        let map = circle_map().unwrap();

        for (i, wp) in map.waypoints().iter().enumerate() {
            let rp = map.to_road_frame(&wp.position_m, map.segment_head_rad(i));

            assert!(
                signed_wrapped_diff(rp.s_m, wp.s_m, map.max_s_m()).abs() < 1e-6,
                "waypoint {}: s = {}, expected {}",
                i,
                rp.s_m,
                wp.s_m
            );
            assert!(rp.d_m.abs() < 1e-6, "waypoint {}: d = {}", i, rp.d_m);

            let pos_m = map.to_cartesian(&RoadPoint::new(wp.s_m, 0.0));
            assert!(nalgebra::distance(&pos_m, &wp.position_m) < 1e-6);
        }
    }

    #[test]
    fn test_lane_containment() {
        let map = circle_map().unwrap();
        let lanes = Lanes {
            width_m: 4.0,
            num_lanes: 3,
        };

        for lane in 0..lanes.num_lanes {
            let mut s_m = 0.0;
            while s_m < map.max_s_m() {
                let rp_in = RoadPoint::new(s_m, lanes.centre_d_m(lane));
                let pos_m = map.to_cartesian(&rp_in);
                let index = map.closest_waypoint(&pos_m);

                let rp = map.to_road_frame(&pos_m, map.segment_head_rad(index));

                assert_eq!(
                    lanes.lane_of(rp.d_m),
                    Some(lane),
                    "s = {}, d = {} maps back to d = {}",
                    s_m,
                    rp_in.d_m,
                    rp.d_m
                );
                assert!(signed_wrapped_diff(rp.s_m, s_m, map.max_s_m()).abs() < 0.5);

                s_m += 7.3;
            }
        }
    }

    #[test]
    fn test_sign_convention() {
        let map = circle_map().unwrap();

        // Points on the sign reference side of the centreline are negative
        let rp = map.to_road_frame(&Point2::new(1490.0, 2000.0), std::f64::consts::FRAC_PI_2);
        assert!((rp.d_m + 10.0).abs() < 0.1, "d = {}", rp.d_m);

        let rp = map.to_road_frame(&Point2::new(1510.0, 2000.0), std::f64::consts::FRAC_PI_2);
        assert!((rp.d_m - 10.0).abs() < 0.1, "d = {}", rp.d_m);
    }

    #[test]
    fn test_next_waypoint() {
        let map = circle_map().unwrap();
        let wp_5 = map.waypoints()[5].position_m;
        let head_rad = map.segment_head_rad(5);

        // Sitting just behind waypoint 5, it's ahead
        let behind = wp_5 - (map.waypoints()[6].position_m - wp_5) * 0.1;
        assert_eq!(map.next_waypoint(&behind, head_rad), 5);

        // Sitting just past waypoint 5, the next one is 6
        let past = wp_5 + (map.waypoints()[6].position_m - wp_5) * 0.1;
        assert_eq!(map.next_waypoint(&past, head_rad), 6);

        // Wraps at the end of the lap
        let last = map.len() - 1;
        let wp_last = map.waypoints()[last].position_m;
        let past = wp_last + (map.waypoints()[0].position_m - wp_last) * 0.1;
        assert_eq!(map.next_waypoint(&past, map.segment_head_rad(last)), 0);
    }

    #[test]
    fn test_to_cartesian_wrap() {
        let map = circle_map().unwrap();
        let rp = RoadPoint::new(100.0, 6.0);

        let a = map.to_cartesian(&rp);
        let b = map.to_cartesian(&RoadPoint::new(100.0 + map.max_s_m(), 6.0));
        let c = map.to_cartesian(&RoadPoint::new(100.0 - map.max_s_m(), 6.0));

        assert!(nalgebra::distance(&a, &b) < 1e-6);
        assert!(nalgebra::distance(&a, &c) < 1e-6);

        // Progress on the closing segment continues smoothly into the first segment
        let before_seam = map.to_cartesian(&RoadPoint::new(map.max_s_m() - 0.5, 0.0));
        let after_seam = map.to_cartesian(&RoadPoint::new(0.5, 0.0));
        assert!((nalgebra::distance(&before_seam, &after_seam) - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_closest_waypoint_tie() {
        let wp = |x: f64, y: f64, s: f64| Waypoint {
            position_m: Point2::new(x, y),
            s_m: s,
            normal: Vector2::new(0.0, -1.0),
        };
        let map = RoadMap::new(
            vec![wp(0.0, 0.0, 0.0), wp(10.0, 0.0, 10.0), wp(10.0, 10.0, 20.0)],
            34.14,
            Point2::new(5.0, 5.0),
        )
        .unwrap();

        // Halfway between waypoints 0 and 1
        assert_eq!(map.closest_waypoint(&Point2::new(5.0, 0.0)), 0);

        // Halfway between waypoints 1 and 2
        assert_eq!(map.closest_waypoint(&Point2::new(10.0, 5.0)), 1);
    }

    #[test]
    fn test_to_cartesian_before_first_waypoint() {
        let chord_m = map_chord_m();
        let start_s_m = 0.4 * chord_m;
        let map = shifted_circle_map(start_s_m).unwrap();

        let last = map.len() - 1;
        let wp_last = map.waypoints()[last].position_m;
        let wp_first = map.waypoints()[0].position_m;

        // Progress below the first waypoint lies on the closing segment, 0.7 chords past the last
        // waypoint
        let s_m = 0.1 * chord_m;
        let pos_m = map.to_cartesian(&RoadPoint::new(s_m, 0.0));
        let expected_m = wp_last + (wp_first - wp_last).normalize() * (0.7 * chord_m);
        assert!(
            nalgebra::distance(&pos_m, &expected_m) < 1e-6,
            "{} != {}",
            pos_m,
            expected_m
        );

        // And maps back to the same road point, on and off the centreline
        for d_m in [0.0, 2.0, -2.0].iter() {
            let pos_m = map.to_cartesian(&RoadPoint::new(s_m, *d_m));
            let rp = map.to_road_frame(&pos_m, map.segment_head_rad(last));

            assert!(
                signed_wrapped_diff(rp.s_m, s_m, map.max_s_m()).abs() < 1e-6,
                "s = {}, expected {}",
                rp.s_m,
                s_m
            );
            assert!((rp.d_m - d_m).abs() < 1e-6, "d = {}, expected {}", rp.d_m, d_m);
        }
    }

    fn map_chord_m() -> f64 {
        let map = circle_map().unwrap();
        nalgebra::distance(&map.waypoints()[0].position_m, &map.waypoints()[1].position_m)
    }
}
