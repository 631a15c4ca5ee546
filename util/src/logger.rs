//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("`{0}` is not a log level, expected one of off, error, warn, info, debug or trace")]
    UnknownLevel(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a log level name, as written in a parameter file. Names are case insensitive.
pub fn parse_level(name: &str) -> Result<LevelFilter, LoggerInitError> {
    name.trim()
        .parse()
        .map_err(|_| LoggerInitError::UnknownLevel(name.to_string()))
}

/// Check that a level is allowed as the minimum level of the logger.
///
/// Levels quieter than `info` are rejected so lifecycle messages always reach the session log.
pub fn check_min_level(level: LevelFilter) -> Result<(), LoggerInitError> {
    if level < log::Level::Info {
        Err(LoggerInitError::InvalidMinLogLevel(level))
    } else {
        Ok(())
    }
}

/// Initialise the logger for this execution.
///
/// Records are written to stdout and to the session's log file, stamped with the number of
/// seconds since the session started.
///
/// `module_levels` override `min_level` for individual modules, for example to silence the
/// per-cycle debug output of `hwy_lib::traj_gen` while debugging something else.
///
/// # Notes
///
/// - `min_level` must be at least `log::Level::Info`. Module overrides may be anything.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    module_levels: &[(String, LevelFilter)],
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    check_min_level(min_level)?;

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            // Debug and trace records are noisy, so include the target to make them traceable
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level)
        .level_for("zmq", LevelFilter::Info);

    let dispatch = module_levels
        .iter()
        .fold(dispatch, |d, (module, level)| d.level_for(module.clone(), *level));

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    for (module, level) in module_levels {
        info!("    Log level for {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
