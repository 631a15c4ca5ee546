//! # Planner Server
//!
//! Receives telemetry from the vehicle on a REP socket and answers each packet with exactly one
//! [`PlanResponse`]. Requests which can't be planned on are answered with
//! [`PlanResponse::CycleRejected`], and the offending telemetry is saved into the session.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::Serialize;

use comms_if::{
    ctrl::PlanResponse,
    net::{create_socket, zmq, NetParams, SocketError, SocketOptions},
    tlm::TelemetryMsg,
};
use util::{module::State, session::Session};

use crate::{data_store::DataStore, planner_ctrl::PlannerCtrl};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Planner server
pub struct PlannerServer {
    socket: zmq::Socket,
}

/// A rejected cycle, saved into the session for later inspection.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedCycle {
    pub cycle: u64,
    pub reason: String,

    /// The raw request, if it was valid text.
    pub request: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A request received by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// A text request, expected to be a telemetry packet in JSON.
    Tlm(String),

    /// A request which wasn't valid UTF-8.
    NonUtf8,
}

#[derive(Debug, thiserror::Error)]
pub enum PlannerServerError {
    #[error("Socket error: {0}")]
    SocketError(SocketError),

    #[error("Could not receive a request: {0}")]
    RecvError(zmq::Error),

    #[error("Could not send the response: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlannerServer {
    /// Create a new instance of the planner server, bound to the planner endpoint.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, PlannerServerError> {
        let socket = create_socket(
            ctx,
            zmq::REP,
            &SocketOptions::server(params),
            &params.planner_endpoint,
        )
        .map_err(PlannerServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Wait for the next request.
    ///
    /// Returns `Ok(None)` if no request arrived before the receive timeout.
    pub fn recv_request(&self) -> Result<Option<Request>, PlannerServerError> {
        match self.socket.recv_string(0) {
            Ok(Ok(s)) => Ok(Some(Request::Tlm(s))),
            Ok(Err(_)) => Ok(Some(Request::NonUtf8)),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(e) => Err(PlannerServerError::RecvError(e)),
        }
    }

    /// Send the response to the last request.
    pub fn send_response(&self, response: &PlanResponse) -> Result<(), PlannerServerError> {
        let response_str =
            serde_json::to_string(response).map_err(PlannerServerError::SerializationError)?;

        self.socket
            .send(&response_str, 0)
            .map_err(PlannerServerError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run one planning cycle for the given request and build the response.
///
/// The outcome is recorded in the data store. Rejected requests are saved into the session if
/// one is given.
pub fn handle_request(
    planner: &mut PlannerCtrl,
    ds: &mut DataStore,
    session: Option<&Session>,
    request: &Request,
) -> PlanResponse {
    let raw = match request {
        Request::Tlm(s) => s,
        Request::NonUtf8 => {
            return reject(ds, session, "Request is not valid UTF-8".into(), None);
        }
    };

    let tlm = match TelemetryMsg::from_json(raw) {
        Ok(t) => t,
        Err(e) => return reject(ds, session, e.to_string(), Some(raw.clone())),
    };

    match planner.proc(&tlm) {
        Ok((ctrl, rpt)) => {
            ds.cycle_succeeded(&rpt);
            PlanResponse::Trajectory(ctrl)
        }
        Err(e) => reject(ds, session, e.to_string(), Some(raw.clone())),
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn reject(
    ds: &mut DataStore,
    session: Option<&Session>,
    reason: String,
    request: Option<String>,
) -> PlanResponse {
    ds.cycle_rejected(&reason);
    warn!("Cycle {} rejected: {}", ds.num_cycles, reason);

    if let Some(s) = session {
        s.save(
            format!("rejected/cycle_{:08}.json", ds.num_cycles),
            RejectedCycle {
                cycle: ds.num_cycles,
                reason: reason.clone(),
                request,
            },
        );
    }

    PlanResponse::CycleRejected { reason }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        planner_ctrl::Params,
        road::{test_util::circle_map, RoadPoint},
    };
    use std::sync::Arc;

    fn planner() -> PlannerCtrl {
        let params: Params =
            util::params::from_str(include_str!("../../params/planner_ctrl.toml")).unwrap();
        PlannerCtrl::new(params, Arc::new(circle_map().unwrap()), None).unwrap()
    }

    fn tlm_json(planner: &PlannerCtrl, s_m: f64) -> String {
        let map = planner.map();
        let pos = map.to_cartesian(&RoadPoint::new(s_m, 6.0));
        let head = map.segment_head_rad(map.closest_waypoint(&pos));

        format!(
            r#"{{"x": {}, "y": {}, "s": {}, "d": 6.0, "yaw": {}, "speed": 0.0,
                "previous_path_x": [], "previous_path_y": [],
                "end_path_s": 0.0, "end_path_d": 0.0,
                "sensor_fusion": [[3, 0.0, 0.0, 10.0, 0.0, {}, 2.0]]}}"#,
            pos.x,
            pos.y,
            s_m,
            head.to_degrees(),
            s_m + 100.0
        )
    }

    #[test]
    fn test_handle_request() {
        let mut planner = planner();
        let mut ds = DataStore::default();

        let req = Request::Tlm(tlm_json(&planner, 10.0));
        match handle_request(&mut planner, &mut ds, None, &req) {
            PlanResponse::Trajectory(ctrl) => {
                assert_eq!(ctrl.len(), planner.params().traj_gen.horizon)
            }
            r => panic!("Expected a trajectory, got {:?}", r),
        }

        let state = planner.state();

        for req in [
            Request::Tlm("not json".into()),
            Request::Tlm(r#"{"x": 1.0}"#.into()),
            Request::NonUtf8,
        ]
        .iter()
        {
            match handle_request(&mut planner, &mut ds, None, req) {
                PlanResponse::CycleRejected { .. } => (),
                r => panic!("Expected a rejection, got {:?}", r),
            }
        }

        assert_eq!(planner.state(), state);
        assert_eq!(ds.num_cycles, 4);
        assert_eq!(ds.num_rejected_cycles, 3);
        assert!(ds.last_status_rpt.is_some());
    }

    #[test]
    fn test_server_round_trip() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            planner_endpoint: "inproc://planner_server_test".into(),
            recv_timeout_ms: 1000,
            send_timeout_ms: 1000,
            linger_ms: 0,
        };

        let server = PlannerServer::new(&ctx, &params).unwrap();
        let client = create_socket(
            &ctx,
            zmq::REQ,
            &SocketOptions {
                linger: 0,
                recv_timeout: 1000,
                ..Default::default()
            },
            &params.planner_endpoint,
        )
        .unwrap();

        let mut planner = planner();
        let mut ds = DataStore::default();

        client.send(tlm_json(&planner, 500.0).as_str(), 0).unwrap();

        let req = server.recv_request().unwrap().unwrap();
        let resp = handle_request(&mut planner, &mut ds, None, &req);
        server.send_response(&resp).unwrap();

        let reply = client.recv_string(0).unwrap().unwrap();
        match serde_json::from_str::<PlanResponse>(&reply).unwrap() {
            PlanResponse::Trajectory(ctrl) => assert_eq!(ctrl.len(), resp_len(&resp)),
            r => panic!("Expected a trajectory, got {:?}", r),
        }
        assert_eq!(ds.num_rejected_cycles, 0);
    }

    fn resp_len(resp: &PlanResponse) -> usize {
        match resp {
            PlanResponse::Trajectory(ctrl) => ctrl.len(),
            PlanResponse::CycleRejected { .. } => 0,
        }
    }
}
