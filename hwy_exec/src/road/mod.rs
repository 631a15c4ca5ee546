//! # Road Map
//!
//! The road is described by a fixed, closed polyline of centreline waypoints. Each waypoint
//! carries its progress along the road (`s`) and the lateral unit normal pointing toward the
//! outside lanes. The map is loaded once at startup, validated, and then shared read-only between
//! any number of planners.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod frame;
mod lanes;
pub mod test_util;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use nalgebra::{Point2, Vector2};
use serde::Deserialize;
use std::path::Path;

pub use frame::*;
pub use lanes::*;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Deviation between a waypoint's stated progress and the measured polyline length above which a
/// warning is raised when loading a map.
const PROGRESS_DEVIATION_WARN_M: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single road centreline waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Position in the world frame.
    ///
    /// Units: meters
    pub position_m: Point2<f64>,

    /// Progress along the road at this waypoint.
    ///
    /// Units: meters
    pub s_m: f64,

    /// Lateral unit normal, pointing toward increasing `d`.
    pub normal: Vector2<f64>,
}

/// The road map, an immutable closed polyline of waypoints.
#[derive(Debug, Clone)]
pub struct RoadMap {
    waypoints: Vec<Waypoint>,

    /// Cumulative polyline length from the first waypoint to each waypoint.
    arc_s_m: Vec<f64>,

    /// Total length of one lap.
    max_s_m: f64,

    /// Point used to decide the sign of lateral offsets.
    sign_ref_m: Point2<f64>,
}

/// One record of the road map file, `x y s dx dy`.
#[derive(Debug, Deserialize)]
struct WaypointRecord {
    x: f64,
    y: f64,
    s: f64,
    dx: f64,
    dy: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which make a road map unusable.
#[derive(Debug, thiserror::Error)]
pub enum RoadMapError {
    #[error("The road map must contain at least 2 waypoints, found {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoint {index} has progress {s_m} m, which is less than the previous waypoint's")]
    NotSorted { index: usize, s_m: f64 },

    #[error("Waypoint {0} contains a non-finite value")]
    NonFinite(usize),

    #[error("Waypoint {0} is at the same position as the following waypoint")]
    CoincidentWaypoints(usize),

    #[error("The lap length ({max_s_m} m) must be greater than the last waypoint's progress ({last_s_m} m)")]
    InvalidMaxS { max_s_m: f64, last_s_m: f64 },

    #[error("The software root environment variable (HWY_PLANNER_ROOT) is not set")]
    SwRootNotSet,

    #[error("Could not read the road map file: {0}")]
    FileError(csv::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoadMap {
    /// Build a new map from the given waypoints.
    ///
    /// The waypoints must describe one lap, sorted by non-decreasing progress, with no two
    /// consecutive waypoints (including the last and first) at the same position.
    pub fn new(
        waypoints: Vec<Waypoint>,
        max_s_m: f64,
        sign_ref_m: Point2<f64>,
    ) -> Result<Self, RoadMapError> {
        if waypoints.len() < 2 {
            return Err(RoadMapError::TooFewWaypoints(waypoints.len()));
        }

        for (i, wp) in waypoints.iter().enumerate() {
            let finite = wp.position_m.coords.iter().all(|v| v.is_finite())
                && wp.normal.iter().all(|v| v.is_finite())
                && wp.s_m.is_finite();
            if !finite {
                return Err(RoadMapError::NonFinite(i));
            }
        }

        for i in 1..waypoints.len() {
            if waypoints[i].s_m < waypoints[i - 1].s_m {
                return Err(RoadMapError::NotSorted {
                    index: i,
                    s_m: waypoints[i].s_m,
                });
            }
        }

        let last_s_m = waypoints[waypoints.len() - 1].s_m;
        if !max_s_m.is_finite() || max_s_m <= last_s_m {
            return Err(RoadMapError::InvalidMaxS { max_s_m, last_s_m });
        }

        // Measure the polyline, checking for zero length segments on the way
        let mut arc_s_m = Vec::with_capacity(waypoints.len());
        let mut s = 0.0;
        for i in 0..waypoints.len() {
            arc_s_m.push(s);

            let next = (i + 1) % waypoints.len();
            let seg_len = (waypoints[next].position_m - waypoints[i].position_m).norm();
            if seg_len == 0.0 {
                return Err(RoadMapError::CoincidentWaypoints(i));
            }
            s += seg_len;
        }

        let map = Self {
            waypoints,
            arc_s_m,
            max_s_m,
            sign_ref_m,
        };

        map.check_progress();

        Ok(map)
    }

    /// Load the map from a waypoint file.
    ///
    /// The file contains one `x y s dx dy` record per line, single-space delimited, with no
    /// header.
    pub fn load_csv<P: AsRef<Path>>(
        path: P,
        max_s_m: f64,
        sign_ref_m: Point2<f64>,
    ) -> Result<Self, RoadMapError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(RoadMapError::FileError)?;

        let mut waypoints = Vec::new();

        for record in reader.deserialize() {
            let rec: WaypointRecord = record.map_err(RoadMapError::FileError)?;
            waypoints.push(Waypoint {
                position_m: Point2::new(rec.x, rec.y),
                s_m: rec.s,
                normal: Vector2::new(rec.dx, rec.dy),
            });
        }

        debug!("Read {} waypoints from the road map file", waypoints.len());

        Self::new(waypoints, max_s_m, sign_ref_m)
    }

    /// Load the map from a path relative to the software root.
    pub fn load_from_sw_root(
        map_path: &str,
        max_s_m: f64,
        sign_ref_m: Point2<f64>,
    ) -> Result<Self, RoadMapError> {
        let mut path = util::host::get_sw_root().map_err(|_| RoadMapError::SwRootNotSet)?;
        path.push(map_path);

        Self::load_csv(path, max_s_m, sign_ref_m)
    }

    /// All waypoints, in order of increasing progress.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints in the map.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false, a valid map has at least 2 waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Total length of one lap.
    pub fn max_s_m(&self) -> f64 {
        self.max_s_m
    }

    /// Index of the waypoint following `index`, wrapping at the end of the lap.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    /// Index of the waypoint preceding `index`, wrapping at the start of the lap.
    pub fn prev_index(&self, index: usize) -> usize {
        if index == 0 {
            self.waypoints.len() - 1
        } else {
            index - 1
        }
    }

    /// Warn if the stated progress of the waypoints drifts from the measured polyline length.
    fn check_progress(&self) {
        let s_0 = self.waypoints[0].s_m;
        let worst = self
            .waypoints
            .iter()
            .zip(self.arc_s_m.iter())
            .map(|(wp, arc)| ((wp.s_m - s_0) - arc).abs())
            .fold(0.0, f64::max);

        if worst > PROGRESS_DEVIATION_WARN_M {
            warn!(
                "Road map progress deviates from the polyline length by up to {:.3} m",
                worst
            );
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn wp(x: f64, y: f64, s: f64) -> Waypoint {
        Waypoint {
            position_m: Point2::new(x, y),
            s_m: s,
            normal: Vector2::new(0.0, -1.0),
        }
    }

    #[test]
    fn test_validation() {
        let origin = Point2::new(0.0, 100.0);

        match RoadMap::new(vec![wp(0.0, 0.0, 0.0)], 10.0, origin) {
            Err(RoadMapError::TooFewWaypoints(1)) => (),
            r => panic!("Expected too few waypoints, got {:?}", r),
        }

        match RoadMap::new(
            vec![wp(0.0, 0.0, 5.0), wp(10.0, 0.0, 1.0)],
            20.0,
            origin,
        ) {
            Err(RoadMapError::NotSorted { index: 1, .. }) => (),
            r => panic!("Expected unsorted, got {:?}", r),
        }

        match RoadMap::new(
            vec![wp(0.0, 0.0, 0.0), wp(0.0, 0.0, 1.0), wp(10.0, 0.0, 2.0)],
            20.0,
            origin,
        ) {
            Err(RoadMapError::CoincidentWaypoints(0)) => (),
            r => panic!("Expected coincident waypoints, got {:?}", r),
        }

        match RoadMap::new(
            vec![wp(0.0, 0.0, 0.0), wp(10.0, 0.0, 10.0)],
            10.0,
            origin,
        ) {
            Err(RoadMapError::InvalidMaxS { .. }) => (),
            r => panic!("Expected invalid lap length, got {:?}", r),
        }

        match RoadMap::new(
            vec![wp(0.0, 0.0, 0.0), wp(10.0, std::f64::NAN, 10.0)],
            20.0,
            origin,
        ) {
            Err(RoadMapError::NonFinite(1)) => (),
            r => panic!("Expected non-finite, got {:?}", r),
        }

        let map = RoadMap::new(
            vec![wp(0.0, 0.0, 0.0), wp(10.0, 0.0, 10.0), wp(10.0, 10.0, 20.0)],
            34.14,
            origin,
        )
        .unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.arc_s_m[2], 20.0);
        assert_eq!(map.prev_index(0), 2);
        assert_eq!(map.next_index(2), 0);
    }

    #[test]
    fn test_load_csv() {
        let path = std::env::temp_dir().join(format!("hwy_road_map_{}.csv", std::process::id()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "784.6001 1135.571 0 -0.02359831 -0.9997216").unwrap();
            writeln!(f, "815.2679 1134.93 30.6744785308838 -0.01099479 -0.9999396").unwrap();
            writeln!(f, "844.6398 1134.911 60.0463714599609 -0.002048373 -0.9999979").unwrap();
        }

        let map = RoadMap::load_csv(&path, 6945.554, Point2::new(1000.0, 2000.0)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(map.len(), 3);
        assert_eq!(map.waypoints()[1].s_m, 30.6744785308838);
        assert_eq!(map.waypoints()[2].normal, Vector2::new(-0.002048373, -0.9999979));
    }
}
