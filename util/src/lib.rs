//! Utility library for the waypoint updater software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod kdtree;
pub mod logger;
pub mod module;
pub mod params;
pub mod session;
pub mod time;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software checkout. Parameter files and
/// session directories are resolved relative to this.
pub const SW_ROOT_ENV_VAR: &str = "WPU_SW_ROOT";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<std::path::PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(std::path::PathBuf::from)
}
