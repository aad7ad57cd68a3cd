//! # Path
//!
//! This module defines the static reference path the vehicle follows, along with the spatial
//! index used to find the path point closest to a position.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use comms_if::msg::{LaneMsg, PoseMsg, WaypointMsg};
use util::kdtree::KdTree;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Quaternions with a norm below this are treated as invalid
pub const MIN_QUATERNION_NORM: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point on the path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position in the map frame
    pub position_m: Vector3<f64>,

    /// Attitude in the map frame
    pub attitude_q: UnitQuaternion<f64>,

    /// Target speed at this point
    pub speed_ms: f64,
}

/// The static path along with a k-d tree over the (x, y) position of each point.
///
/// Entries in the tree correspond one to one with the waypoints, and the path is never empty.
#[derive(Debug, Clone)]
pub struct PathIndex {
    waypoints: Vec<Waypoint>,
    tree: KdTree,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathError {
    #[error("Attempted to create a path from an empty sequence")]
    EmptyPath,

    #[error("Waypoint {0} has a non-finite position or speed, or a zero attitude quaternion")]
    InvalidWaypoint(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    /// Create a waypoint with identity attitude.
    pub fn new(position_m: Vector3<f64>, speed_ms: f64) -> Self {
        Self {
            position_m,
            attitude_q: UnitQuaternion::identity(),
            speed_ms,
        }
    }

    /// Position projected onto the XY plane
    pub fn position2(&self) -> Vector2<f64> {
        self.position_m.xy()
    }

    /// Convert from a message, returning `None` if the message holds invalid values.
    pub fn from_msg(msg: &WaypointMsg) -> Option<Self> {
        if !msg.speed_ms.is_finite() {
            return None;
        }

        let (position_m, attitude_q) = pose_from_msg(&msg.pose)?;

        Some(Self {
            position_m,
            attitude_q,
            speed_ms: msg.speed_ms,
        })
    }
}

impl From<&Waypoint> for WaypointMsg {
    fn from(wp: &Waypoint) -> Self {
        WaypointMsg {
            pose: pose_to_msg(&wp.position_m, &wp.attitude_q),
            speed_ms: wp.speed_ms,
        }
    }
}

impl PathIndex {
    /// Build the index over the given path.
    pub fn build(waypoints: Vec<Waypoint>) -> Result<Self, PathError> {
        if waypoints.is_empty() {
            return Err(PathError::EmptyPath);
        }

        let points: Vec<Vector2<f64>> = waypoints.iter().map(Waypoint::position2).collect();
        let tree = KdTree::build(&points);

        Ok(Self { waypoints, tree })
    }

    /// Validate every waypoint in the lane and build the index over them.
    pub fn from_lane(lane: &LaneMsg) -> Result<Self, PathError> {
        let waypoints = lane
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, m)| Waypoint::from_msg(m).ok_or(PathError::InvalidWaypoint(i)))
            .collect::<Result<Vec<_>, _>>()?;

        Self::build(waypoints)
    }

    /// Get the number of points in the path
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false, an empty path cannot be indexed
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Return the index of the path point whose (x, y) is closest to `position_m`.
    pub fn nearest(&self, position_m: &Vector2<f64>) -> usize {
        // The tree is never empty so a neighbour always exists
        self.tree.nearest(position_m).map(|n| n.item).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a pose message into a position and attitude.
///
/// Returns `None` if any element is non-finite or the quaternion is zero.
pub(crate) fn pose_from_msg(msg: &PoseMsg) -> Option<(Vector3<f64>, UnitQuaternion<f64>)> {
    if msg.position_m.iter().chain(msg.attitude_q.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let [i, j, k, w] = msg.attitude_q;
    let attitude_q = UnitQuaternion::try_new(Quaternion::new(w, i, j, k), MIN_QUATERNION_NORM)?;

    Some((Vector3::from(msg.position_m), attitude_q))
}

pub(crate) fn pose_to_msg(position_m: &Vector3<f64>, attitude_q: &UnitQuaternion<f64>) -> PoseMsg {
    // Quaternion coordinates are stored as [i, j, k, w]
    let q = &attitude_q.quaternion().coords;

    PoseMsg {
        position_m: [position_m[0], position_m[1], position_m[2]],
        attitude_q: [q[0], q[1], q[2], q[3]],
    }
}
