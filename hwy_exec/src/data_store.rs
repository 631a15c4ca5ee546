//! # Data Store

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use crate::planner_ctrl::StatusReport;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of consecutive overruns after which a warning is raised. Repeated every time this many
/// more consecutive overruns occur.
const CONSEC_OVERRUN_WARN_LIMIT: u64 = 50;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles executed, including rejected ones
    pub num_cycles: u64,

    /// Number of cycles which were rejected
    pub num_rejected_cycles: u64,

    /// Status of the last successful cycle
    pub last_status_rpt: Option<StatusReport>,

    /// Reason the last rejected cycle was rejected
    pub last_rejection: Option<String>,

    // Monitoring Counters
    /// Total number of cycle overruns
    pub num_overrun_cycles: u64,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    /// Record the outcome of a successful cycle.
    pub fn cycle_succeeded(&mut self, rpt: &StatusReport) {
        self.num_cycles += 1;
        self.last_status_rpt = Some(*rpt);

        if rpt.overrun {
            self.num_overrun_cycles += 1;
            self.num_consec_cycle_overruns += 1;

            if self.num_consec_cycle_overruns % CONSEC_OVERRUN_WARN_LIMIT == 0 {
                warn!(
                    "{} consecutive cycle overruns",
                    self.num_consec_cycle_overruns
                );
            }
        } else {
            self.num_consec_cycle_overruns = 0;
        }
    }

    /// Record a rejected cycle.
    pub fn cycle_rejected(&mut self, reason: &str) {
        self.num_cycles += 1;
        self.num_rejected_cycles += 1;
        self.last_rejection = Some(reason.to_string());
    }

    /// Number of cycles which produced a trajectory.
    pub fn num_successful_cycles(&self) -> u64 {
        self.num_cycles - self.num_rejected_cycles
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
