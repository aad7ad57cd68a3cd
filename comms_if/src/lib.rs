//! # Communications interface crate.
//!
//! Provides the message definitions and network abstractions shared between the waypoint updater
//! and the processes it talks to.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Typed message definitions and their wire encoding
pub mod msg;

/// Network module
pub mod net;
