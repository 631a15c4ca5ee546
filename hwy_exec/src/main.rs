//! Highway planner executable entry point.
//!
//! # Architecture
//!
//! The executable runs in one of two modes:
//!
//!     - Server: bind the planner server and answer every telemetry packet from the vehicle with
//!       a trajectory, forever.
//!     - Replay: feed a recorded telemetry log through the planner, saving every response into
//!       the session, then exit.
//!
//! In both modes each packet is handled by one planning cycle of `PlannerCtrl`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use nalgebra::Point2;
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

// Internal
use hwy_lib::{
    data_store::DataStore,
    params::HwyExecParams,
    planner_ctrl::{InitData, PlannerCtrl},
    planner_server::{handle_request, PlannerServer},
    road::RoadMap,
    tlm_replay::TlmReplay,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of idle receive timeouts between two "waiting" messages.
const IDLE_LOG_PERIOD: u64 = 50;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "hwy_exec", about = "Highway motion planner")]
struct Cli {
    /// Replay a telemetry log (one JSON packet per line) instead of serving the vehicle.
    #[structopt(long, parse(from_os_str))]
    replay: Option<PathBuf>,

    /// Log at debug level, even if the exec params ask for less.
    #[structopt(short, long)]
    debug: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let cli = Cli::from_args();

    // Initialise session
    let session = Session::new("hwy_exec", "sessions").wrap_err("Failed to create the session")?;

    // ---- LOAD PARAMETERS ----

    let exec_params: HwyExecParams =
        util::params::load("hwy_exec.toml").wrap_err("Could not load exec params")?;

    // Initialise logger
    let (mut min_level, module_levels) = exec_params
        .log_levels()
        .wrap_err("Invalid log levels in the exec params")?;
    if cli.debug && min_level < LevelFilter::Debug {
        min_level = LevelFilter::Debug;
    }
    logger_init(min_level, &module_levels, &session).wrap_err("Failed to initialise logging")?;

    info!("Highway Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", cli);

    info!("Exec parameters loaded");

    // ---- LOAD MAP ----

    let map = Arc::new(
        RoadMap::load_from_sw_root(
            &exec_params.map_path,
            exec_params.max_s_m,
            Point2::new(exec_params.sign_ref_m[0], exec_params.sign_ref_m[1]),
        )
        .wrap_err("Failed to load the road map")?,
    );

    info!(
        "Road map loaded: {} waypoints, {:.3} m per lap",
        map.len(),
        map.max_s_m()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let mut planner = PlannerCtrl::init(
        InitData {
            params_file: exec_params.planner_ctrl_params.clone(),
            map,
        },
        Some(&session),
    )
    .wrap_err("Failed to initialise PlannerCtrl")?;
    info!("PlannerCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- REPLAY MODE ----

    if let Some(path) = cli.replay {
        info!("Loading telemetry log from {:?}", path);

        let replay = TlmReplay::load(&path).wrap_err("Failed to load the telemetry log")?;
        info!("Loaded {} telemetry packets\n", replay.len());

        let summary = replay.run(&mut planner, &mut ds, Some(&session));

        info!(
            "Replay complete: {} successful cycles, {} rejected, {} overruns",
            ds.num_successful_cycles(),
            summary.num_rejected,
            ds.num_overrun_cycles
        );

        session.exit();

        return Ok(());
    }

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let server = PlannerServer::new(&zmq_ctx, &exec_params.net_params())
        .wrap_err("Failed to initialise the PlannerServer")?;

    info!(
        "PlannerServer listening on {}\n",
        exec_params.planner_endpoint
    );

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut num_idle: u64 = 0;

    loop {
        let request = match server.recv_request() {
            Ok(Some(r)) => r,
            Ok(None) => {
                num_idle += 1;
                if num_idle % IDLE_LOG_PERIOD == 0 {
                    debug!("Waiting for telemetry");
                }
                continue;
            }
            Err(e) => {
                session.exit();
                return Err(eyre!("Planner server failed: {}", e));
            }
        };

        num_idle = 0;

        let response = handle_request(&mut planner, &mut ds, Some(&session), &request);

        // A REP socket must answer before it can receive again, so a failed send is fatal.
        if let Err(e) = server.send_response(&response) {
            warn!("Could not answer cycle {}", ds.num_cycles);
            session.exit();
            return Err(eyre!("Planner server failed: {}", e));
        }
    }
}
