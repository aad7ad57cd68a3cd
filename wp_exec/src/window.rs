//! # Lookahead window

use crate::path::Waypoint;

/// Copy at most `n` waypoints starting at `start`.
///
/// The window is truncated at the end of the path and never wraps back to the start, so it is
/// shorter than `n` on the final approach and empty if `start` is past the end.
pub fn slice(waypoints: &[Waypoint], start: usize, n: usize) -> Vec<Waypoint> {
    if start >= waypoints.len() {
        return Vec::new();
    }

    let end = start.saturating_add(n).min(waypoints.len());

    waypoints[start..end].to_vec()
}
