//! # Waypoint updater module
//!
//! Cyclic module which turns a snapshot of the latest pose and stop request into the lookahead
//! window of waypoints the motion controller should track.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during WaypointUpdater operation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WaypointUpdaterError {
    #[error("Invalid parameter {0}: {1}")]
    InvalidParams(&'static str, String),
}
