//! # Speed profile
//!
//! Reshapes the target speeds in a lookahead window so the vehicle comes to a stop a few points
//! before a stop line, decelerating at no more than a fixed rate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::convert::TryFrom;

use comms_if::msg::StopLineMsg;

use crate::{path::Waypoint, wp_updater::Params};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// The stop the vehicle has been asked to make, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// No stop line is active
    None,

    /// Stop before the path point with this index
    Line(usize),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StopRequestError {
    #[error("Stop line index {0} is negative and is not the \"no stop\" value (-1)")]
    InvalidIndex(i32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StopRequest {
    fn default() -> Self {
        StopRequest::None
    }
}

impl TryFrom<&StopLineMsg> for StopRequest {
    type Error = StopRequestError;

    fn try_from(msg: &StopLineMsg) -> Result<Self, Self::Error> {
        match msg.index {
            -1 => Ok(StopRequest::None),
            i if i >= 0 => Ok(StopRequest::Line(i as usize)),
            i => Err(StopRequestError::InvalidIndex(i)),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the offset within the window the vehicle should be stopped at.
///
/// Returns `None` if there is no stop or the stop line lies at or beyond the end of the window.
/// Otherwise the offset is `stop_buffer_wps` points before the stop line, clamped to the start
/// of the window. A stop line behind the window start therefore gives offset 0.
pub fn target_stop_offset(
    stop: StopRequest,
    start: usize,
    window_len: usize,
    stop_buffer_wps: usize,
) -> Option<usize> {
    match stop {
        StopRequest::Line(line) if line < start.saturating_add(window_len) => {
            Some(line.saturating_sub(start).saturating_sub(stop_buffer_wps))
        }
        _ => None,
    }
}

/// Path distance from the point at offset `from` to the point at offset `to`.
///
/// This is the sum of the segment lengths between consecutive points. If `from` is after `to`
/// there are no segments to sum and the distance is zero.
pub fn arc_length(waypoints: &[Waypoint], from: usize, to: usize) -> f64 {
    if from > to || to >= waypoints.len() {
        return 0.0;
    }

    waypoints[from..=to]
        .windows(2)
        .map(|w| (w[1].position_m - w[0].position_m).norm())
        .sum()
}

/// Reshape the speeds of `window`, which starts at path index `start`, for the given stop.
///
/// If no stop is needed within the window the waypoints are returned unchanged. Otherwise each
/// point gets the speed `sqrt(2 * max_decel * d)`, where `d` is the distance to the target stop
/// offset, snapped to zero below the velocity floor and never above the point's original speed.
pub fn reshape(window: &[Waypoint], stop: StopRequest, start: usize, params: &Params) -> Vec<Waypoint> {
    let target = match target_stop_offset(stop, start, window.len(), params.stop_buffer_wps) {
        Some(t) => t,
        None => return window.to_vec(),
    };

    window
        .iter()
        .enumerate()
        .map(|(i, wp)| {
            let dist_m = arc_length(window, i, target);

            let mut speed_ms = (2.0 * params.max_decel_mss * dist_m).sqrt();
            if speed_ms < params.velocity_floor_ms {
                speed_ms = 0.0;
            }

            Waypoint {
                speed_ms: speed_ms.min(wp.speed_ms),
                ..*wp
            }
        })
        .collect()
}
