//! # Logging
//!
//! Sets up the `log` facade for an executable. Every record is written to stdout and to the
//! session log file, prefixed with the seconds elapsed since the session started.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level, Record};

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which are too chatty below `INFO`, along with the level they are capped at.
const CAPPED_TARGETS: [(&str, LevelFilter); 1] = [("zmq", LevelFilter::Info)];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must be INFO or more verbose, got {0}")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise logging to stdout and the session's log file.
///
/// `min_level` must be at least as verbose as `INFO`. A process may only set its logger once, so
/// any call after the first successful one fails with `FernInitError`.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{} {}", prefix(record), message))
        })
        .level(min_level);

    for (target, level) in CAPPED_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging to {:?} at {:?} and above", session.log_file_path, min_level);
    if let Ok(epoch) = session::get_epoch() {
        info!("Session epoch is {}", epoch);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the `[elapsed LVL]` prefix for a record. The target is added for DEBUG and TRACE.
fn prefix(record: &Record) -> String {
    let elapsed_s = session::get_elapsed_seconds();
    let tag = level_tag(record.level());

    match record.level() {
        Level::Debug | Level::Trace => format!("[{:10.6} {}] {}:", elapsed_s, tag, record.target()),
        _ => format!("[{:10.6} {}]", elapsed_s, tag),
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prefix() {
        // No session in this test, so the elapsed time is NAN. Colouring may be disabled when
        // not attached to a terminal but the tag text is always present.
        let info = Record::builder()
            .level(Level::Info)
            .target("wp_lib::control_loop")
            .build();
        let p = prefix(&info);
        assert!(p.contains("INF"));
        assert!(!p.contains("wp_lib::control_loop"));

        let trace = Record::builder()
            .level(Level::Trace)
            .target("wp_lib::control_loop")
            .build();
        let p = prefix(&trace);
        assert!(p.contains("TRC"));
        assert!(p.ends_with("wp_lib::control_loop:"));
    }
}
