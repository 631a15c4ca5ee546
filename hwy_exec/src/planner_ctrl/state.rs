//! Planner control module state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlMsg;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::wrap,
    module::State,
    params,
    session::{self, Session},
};

use super::*;
use crate::{
    behav::{BehavInput, BehavPlanner, PlannerState},
    traffic::Traffic,
    traj_gen::{TrajGen, TrajGenInput},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Session-relative path of the status report archive.
const ARCHIVE_PATH: &str = "planner_ctrl/status_report.csv";

/// Leftover steps shorter than this don't give a usable heading.
///
/// Units: meters
const MIN_STEP_M: f64 = 1e-3;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct PlannerCtrl {
    params: Params,

    map: Arc<RoadMap>,

    behav: BehavPlanner,

    traj_gen: TrajGen,

    /// Lane and speed committed at the end of the last successful cycle
    state: PlannerState,

    /// Number of successful cycles
    num_cycles: u64,

    report: StatusReport,

    archiver: Option<Archiver>,
}

/// Data required to initialise planner control.
#[derive(Debug, Clone)]
pub struct InitData {
    /// Name of the parameter file, relative to the parameters directory.
    pub params_file: String,

    pub map: Arc<RoadMap>,
}

/// The status report of a single planning cycle.
///
/// This is archived once per successful cycle, so it must stay flat.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Session time at the end of the cycle.
    pub time_s: f64,

    /// Number of this cycle among the successful ones.
    pub cycle: u64,

    pub lane: usize,

    pub ref_speed_ms: f64,

    pub ego_speed_ms: f64,

    pub ego_s_m: f64,

    pub ego_d_m: f64,

    /// Progress the behaviour decision and anchors were based on.
    pub planning_s_m: f64,

    pub too_close: bool,

    pub left_free: bool,

    pub right_free: bool,

    pub lane_changed: bool,

    pub closest_ahead_m: Option<f64>,

    pub num_objects: usize,

    pub num_leftover: usize,

    pub num_new: usize,

    /// Time taken by the cycle, including the archive write. The archived row itself can only
    /// hold the time up to the write.
    pub cycle_duration_s: f64,

    /// The cycle took longer than the step time.
    pub overrun: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl State for PlannerCtrl {
    type InitData = InitData;
    type InitError = InitError;

    type InputData = TelemetryMsg;
    type OutputData = ControlMsg;
    type StatusReport = StatusReport;
    type ProcError = PlannerCtrlError;

    /// Initialise the PlannerCtrl module.
    ///
    /// The parameters are loaded from the file named in the init data.
    fn init(init_data: Self::InitData, session: Option<&Session>) -> Result<Self, Self::InitError> {
        let params: Params =
            params::load(&init_data.params_file).map_err(InitError::ParamLoadError)?;

        Self::new(params, init_data.map, session)
    }

    /// Run one planning cycle.
    ///
    /// On error nothing about the planner's persistent state changes, so the vehicle can keep
    /// following its previous trajectory and the next cycle starts from the same decision.
    fn proc(
        &mut self,
        tlm: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let cycle_start = Instant::now();

        // ---- INGESTION ----

        tlm.validate().map_err(PlannerCtrlError::InvalidTelemetry)?;

        let ego = EgoState::from_tlm(tlm, &self.map);
        let traffic = Traffic::from_msgs(&tlm.sensor_fusion);

        let horizon = self.params.traj_gen.horizon;
        let num_leftover = ego.leftover_m.len().min(horizon);
        let planning_s_m = if ego.leftover_m.len() > horizon {
            // The tail past the horizon is dropped, so end_path_s is beyond the kept points
            self.leftover_end_s_m(&ego.leftover_m[..horizon], ego.head_rad)
        } else if num_leftover > 0 {
            wrap(ego.end_path.s_m, self.map.max_s_m())
        } else {
            ego.road_pos.s_m
        };

        // ---- BEHAVIOUR ----

        let behav_input = BehavInput {
            ego_s_m: planning_s_m,
            time_to_path_end_s: num_leftover as f64 * self.params.step_time_s,
            traffic: &traffic,
        };
        let (new_state, behav_rpt) = self
            .behav
            .plan(&behav_input, &self.state)
            .map_err(PlannerCtrlError::BehavError)?;

        // ---- TRAJECTORY ----

        let traj_input = TrajGenInput {
            ego_position_m: ego.position_m,
            ego_head_rad: ego.head_rad,
            planning_s_m,
            leftover_m: &ego.leftover_m,
            lane: new_state.lane,
            ref_speed_ms: new_state.ref_speed_ms,
        };
        let (traj, traj_rpt) = self
            .traj_gen
            .generate(&traj_input)
            .map_err(PlannerCtrlError::TrajGenError)?;

        // ---- COMMIT ----

        if let Some(change) = behav_rpt.lane_change {
            info!("Lane change {} -> {}", change.from, change.to);
        }
        self.state = new_state;
        self.num_cycles += 1;

        let cycle_duration_s = cycle_start.elapsed().as_secs_f64();

        self.report = StatusReport {
            time_s: session::get_elapsed_seconds(),
            cycle: self.num_cycles,
            lane: self.state.lane,
            ref_speed_ms: self.state.ref_speed_ms,
            ego_speed_ms: ego.speed_ms,
            ego_s_m: ego.road_pos.s_m,
            ego_d_m: ego.road_pos.d_m,
            planning_s_m,
            too_close: behav_rpt.too_close,
            left_free: behav_rpt.left_free,
            right_free: behav_rpt.right_free,
            lane_changed: behav_rpt.lane_change.is_some(),
            closest_ahead_m: behav_rpt.closest_ahead_m,
            num_objects: traffic.len(),
            num_leftover: traj_rpt.num_leftover,
            num_new: traj_rpt.num_new,
            cycle_duration_s,
            overrun: cycle_duration_s > self.params.step_time_s,
        };

        debug!(
            "Cycle {}: lane {}, speed {:.3} m/s, {} leftover + {} new points",
            self.num_cycles,
            self.state.lane,
            self.state.ref_speed_ms,
            traj_rpt.num_leftover,
            traj_rpt.num_new
        );

        if let Err(e) = self.write() {
            warn!("Could not archive the planner status: {}", e);
        }

        // Final timing includes the archive write
        self.report.cycle_duration_s = cycle_start.elapsed().as_secs_f64();
        self.report.overrun = self.report.cycle_duration_s > self.params.step_time_s;
        if self.report.overrun {
            warn!(
                "Cycle {} overran: {:.6} s (step time {:.6} s)",
                self.num_cycles, self.report.cycle_duration_s, self.params.step_time_s
            );
        }

        Ok((traj.to_ctrl_msg(), self.report))
    }
}

impl Archived for PlannerCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.archiver {
            Some(ref mut a) => a.serialise(&self.report),
            None => Ok(()),
        }
    }
}

impl PlannerCtrl {
    /// Create planner control from already loaded parameters.
    ///
    /// If a session is given the status reports are archived into it.
    pub fn new(
        params: Params,
        map: Arc<RoadMap>,
        session: Option<&Session>,
    ) -> Result<Self, InitError> {
        params.validate().map_err(InitError::InvalidParams)?;

        let archiver = match session {
            Some(s) => {
                Some(Archiver::from_path(s, ARCHIVE_PATH).map_err(InitError::ArchiveError)?)
            }
            None => None,
        };

        let behav = BehavPlanner::new(params.behav.clone(), params.lanes, map.max_s_m());
        let traj_gen = TrajGen::new(
            params.traj_gen.clone(),
            params.lanes,
            params.step_time_s,
            map.clone(),
        );

        let state = PlannerState {
            lane: params.initial_lane,
            ref_speed_ms: params.initial_speed_ms,
        };

        Ok(Self {
            params,
            map,
            behav,
            traj_gen,
            state,
            num_cycles: 0,
            report: StatusReport::default(),
            archiver,
        })
    }

    /// The lane and speed committed by the last successful cycle.
    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn map(&self) -> &Arc<RoadMap> {
        &self.map
    }

    /// Number of successful cycles so far.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Progress at the last of the given leftover points.
    ///
    /// The heading of the final leftover step locates the point on the road, falling back to the
    /// ego heading if the path has stopped.
    fn leftover_end_s_m(&self, leftover_m: &[Point2<f64>], ego_head_rad: f64) -> f64 {
        let n = leftover_m.len();
        let end_m = leftover_m[n - 1];

        let head_rad = if n >= 2 {
            let step = end_m - leftover_m[n - 2];
            if step.norm() > MIN_STEP_M {
                step.y.atan2(step.x)
            } else {
                ego_head_rad
            }
        } else {
            ego_head_rad
        };

        self.map.to_road_frame(&end_m, head_rad).s_m
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
