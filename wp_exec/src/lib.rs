//! # Waypoint updater library.
//!
//! This library allows other crates in the workspace, and the benches, to access items defined
//! inside the waypoint updater crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message bus interface - handler and sink traits decoupling the updater from the transport
pub mod bus;

/// Bus client - ZeroMQ subscriber and publisher for the bus
pub mod bus_client;

/// Control loop - runs the updater at a fixed rate
pub mod control_loop;

/// Shared inputs - latest pose, stop request and path written by the handlers
pub mod inputs;

/// Localisation - finds the first path point ahead of the vehicle
pub mod loc;

/// Path - waypoints and the spatial index over them
pub mod path;

/// Speed profile - deceleration towards a stop line
pub mod speed_profile;

/// Window - slices the lookahead window from the path
pub mod window;

/// Waypoint updater module - combines the above into one cycle of processing
pub mod wp_updater;
