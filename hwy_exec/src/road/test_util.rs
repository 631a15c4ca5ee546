//! Synthetic road maps, used by the unit tests and benchmarks.

use nalgebra::{Point2, Vector2};

use super::{RoadMap, RoadMapError, Waypoint};

/// Centre of the synthetic circular road, also used as its sign reference point.
pub const CIRCLE_CENTRE_M: [f64; 2] = [1000.0, 2000.0];

/// Radius of the default circular road.
pub const CIRCLE_RADIUS_M: f64 = 500.0;

/// Number of waypoints on the default circular road.
pub const CIRCLE_NUM_WAYPOINTS: usize = 200;

/// The default circular test road.
pub fn circle_map() -> Result<RoadMap, RoadMapError> {
    circle_map_with(CIRCLE_RADIUS_M, CIRCLE_NUM_WAYPOINTS)
}

/// A counter-clockwise circular road around [`CIRCLE_CENTRE_M`].
///
/// Progress is the cumulative chord length, starting at 0 on the positive X side of the centre,
/// and the lap length is the perimeter of the polygon. Lanes lie on the outside of the circle.
pub fn circle_map_with(radius_m: f64, num_waypoints: usize) -> Result<RoadMap, RoadMapError> {
    circle_map_from(radius_m, num_waypoints, 0.0)
}

/// The default circular road, with the first waypoint at progress `start_s_m` instead of 0.
///
/// `start_s_m` must be less than one chord so the last waypoint stays within the lap.
pub fn shifted_circle_map(start_s_m: f64) -> Result<RoadMap, RoadMapError> {
    circle_map_from(CIRCLE_RADIUS_M, CIRCLE_NUM_WAYPOINTS, start_s_m)
}

fn circle_map_from(
    radius_m: f64,
    num_waypoints: usize,
    start_s_m: f64,
) -> Result<RoadMap, RoadMapError> {
    let centre = Point2::new(CIRCLE_CENTRE_M[0], CIRCLE_CENTRE_M[1]);
    let step_rad = std::f64::consts::TAU / num_waypoints as f64;
    let chord_m = 2.0 * radius_m * (0.5 * step_rad).sin();

    let waypoints = (0..num_waypoints)
        .map(|i| {
            let ang = step_rad * i as f64;
            let normal = Vector2::new(ang.cos(), ang.sin());

            Waypoint {
                position_m: centre + normal * radius_m,
                s_m: start_s_m + chord_m * i as f64,
                normal,
            }
        })
        .collect();

    RoadMap::new(waypoints, chord_m * num_waypoints as f64, centre)
}
