//! # Telemetry Replay
//!
//! Runs the planner offline over a recorded telemetry log. The log holds one telemetry packet in
//! JSON per line. Blank lines and lines starting with `#` are skipped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use std::path::Path;

use comms_if::ctrl::PlanResponse;
use util::session::Session;

use crate::{
    data_store::DataStore,
    planner_ctrl::PlannerCtrl,
    planner_server::{handle_request, Request},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A loaded telemetry log.
#[derive(Debug, Clone, Default)]
pub struct TlmReplay {
    requests: Vec<String>,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub num_requests: usize,
    pub num_rejected: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TlmReplayError {
    #[error("Could not read the telemetry log: {0}")]
    FileError(std::io::Error),

    #[error("The telemetry log contains no packets")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TlmReplay {
    /// Load a telemetry log from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TlmReplayError> {
        let log_str = std::fs::read_to_string(path).map_err(TlmReplayError::FileError)?;

        let replay = Self::parse(&log_str);

        if replay.is_empty() {
            Err(TlmReplayError::Empty)
        } else {
            Ok(replay)
        }
    }

    /// Split a telemetry log into packets. Packets are not decoded until they are replayed.
    pub fn parse(log_str: &str) -> Self {
        Self {
            requests: log_str
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Feed every packet through the planner in order.
    ///
    /// If a session is given each response is saved into it as `replay/response_<n>.json`.
    pub fn run(
        &self,
        planner: &mut PlannerCtrl,
        ds: &mut DataStore,
        session: Option<&Session>,
    ) -> ReplaySummary {
        let mut summary = ReplaySummary::default();

        for (i, raw) in self.requests.iter().enumerate() {
            let response = handle_request(planner, ds, session, &Request::Tlm(raw.clone()));

            summary.num_requests += 1;
            if let PlanResponse::CycleRejected { .. } = response {
                summary.num_rejected += 1;
            }

            if let Some(s) = session {
                s.save(format!("replay/response_{:08}.json", i), response);
            }
        }

        info!(
            "Replayed {} packets, {} rejected",
            summary.num_requests, summary.num_rejected
        );

        summary
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{planner_ctrl::Params, road::test_util::circle_map};
    use std::sync::Arc;

    #[test]
    fn test_parse() {
        let replay = TlmReplay::parse("# header\n{\"a\": 1}\n\n  {\"b\": 2}  \n");
        assert_eq!(replay.len(), 2);
        assert_eq!(replay.requests[1], "{\"b\": 2}");
    }

    #[test]
    fn test_load_empty() {
        let path = std::env::temp_dir().join(format!("hwy_replay_{}.jsonl", std::process::id()));
        std::fs::write(&path, "# nothing here\n").unwrap();

        let result = TlmReplay::load(&path);
        std::fs::remove_file(&path).ok();

        match result {
            Err(TlmReplayError::Empty) => (),
            r => panic!("Expected an empty log error, got {:?}", r),
        }
    }

    #[test]
    fn test_run() {
        let params: Params =
            util::params::from_str(include_str!("../../params/planner_ctrl.toml")).unwrap();
        let map = Arc::new(circle_map().unwrap());
        let mut planner = PlannerCtrl::new(params, map.clone(), None).unwrap();
        let mut ds = DataStore::default();

        // A valid packet near the start of the lap, then a broken one
        let pos = map.to_cartesian(&crate::road::RoadPoint::new(10.0, 6.0));
        let head_deg = map
            .segment_head_rad(map.closest_waypoint(&pos))
            .to_degrees();
        let log = format!(
            "{{\"x\": {}, \"y\": {}, \"s\": 10.0, \"d\": 6.0, \"yaw\": {}, \"speed\": 0.0, \
             \"previous_path_x\": [], \"previous_path_y\": [], \"end_path_s\": 0.0, \
             \"end_path_d\": 0.0, \"sensor_fusion\": []}}\n{{\"x\": 0.0}}\n",
            pos.x, pos.y, head_deg
        );

        let summary = TlmReplay::parse(&log).run(&mut planner, &mut ds, None);

        assert_eq!(
            summary,
            ReplaySummary {
                num_requests: 2,
                num_rejected: 1
            }
        );
        assert_eq!(planner.num_cycles(), 1);
    }
}
