//! # Localisation module
//!
//! Holds the vehicle pose and finds where the vehicle is along the path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::convert::TryFrom;

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::path::{pose_from_msg, PathIndex};
use comms_if::msg::PoseMsg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and attitude in the map frame) of the vehicle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the map frame
    pub position_m: Vector3<f64>,

    /// The attitude of the vehicle in the map frame
    pub attitude_q: UnitQuaternion<f64>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LocError {
    #[error("The pose contains non-finite values or a zero attitude quaternion: {0:?}")]
    InvalidPose(PoseMsg),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Create a pose at the given position with identity attitude.
    pub fn at(position_m: Vector3<f64>) -> Self {
        Self {
            position_m,
            attitude_q: UnitQuaternion::identity(),
        }
    }

    /// Position projected onto the XY plane
    pub fn position2(&self) -> Vector2<f64> {
        self.position_m.xy()
    }

    /// Return the heading (angle to the positive X axis) of the vehicle in radians.
    pub fn get_heading(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }
}

impl TryFrom<&PoseMsg> for Pose {
    type Error = LocError;

    fn try_from(msg: &PoseMsg) -> Result<Self, Self::Error> {
        let (position_m, attitude_q) = pose_from_msg(msg).ok_or(LocError::InvalidPose(*msg))?;

        Ok(Self {
            position_m,
            attitude_q,
        })
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the index of the first path point at or ahead of the vehicle.
///
/// The nearest point may be behind the vehicle. If the vehicle has passed it, meaning the vector
/// from the nearest point to the vehicle points along the segment arriving at the nearest point,
/// the next point is used instead. The previous point of index 0 is the last point of the path,
/// and advancing from the last point gives index 0.
pub fn closest_ahead_index(pose: &Pose, path: &PathIndex) -> usize {
    closest_ahead_from(pose, path, path.nearest(&pose.position2()))
}

/// As [`closest_ahead_index`], for callers which have already looked up the index of the
/// nearest point.
pub fn closest_ahead_from(pose: &Pose, path: &PathIndex, closest: usize) -> usize {
    let position_m = pose.position2();

    // A single point has no segment to test against
    let num_points = path.len();
    if num_points < 2 {
        return closest;
    }

    let waypoints = path.waypoints();
    let prev = if closest == 0 { num_points - 1 } else { closest - 1 };

    let closest_m = waypoints[closest].position2();
    let prev_m = waypoints[prev].position2();

    let seg_vec = closest_m - prev_m;
    let pos_vec = position_m - closest_m;

    if seg_vec.dot(&pos_vec) > 0.0 {
        (closest + 1) % num_points
    } else {
        closest
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::{test::straight_path, Waypoint};

    #[test]
    fn test_at_point() {
        let path = straight_path(10, 1.0, 5.0);

        for k in 0..10 {
            let pose = Pose::at(Vector3::new(k as f64, 0.0, 0.0));
            assert_eq!(closest_ahead_index(&pose, &path), k);
        }
    }

    #[test]
    fn test_between_points() {
        let path = straight_path(10, 1.0, 5.0);

        // Just past k, nearest is k but it is behind
        for k in 1..8 {
            let pose = Pose::at(Vector3::new(k as f64 + 0.2, 0.3, 0.0));
            assert_eq!(closest_ahead_index(&pose, &path), k + 1);
        }

        // Just before k, nearest is k and ahead
        for k in 1..9 {
            let pose = Pose::at(Vector3::new(k as f64 - 0.2, -0.3, 0.0));
            assert_eq!(closest_ahead_index(&pose, &path), k);
        }

        // Halfway resolves ahead regardless of which neighbour is nearest
        let pose = Pose::at(Vector3::new(1.5, 0.0, 0.0));
        assert_eq!(closest_ahead_index(&pose, &path), 2);
    }

    #[test]
    fn test_path_ends() {
        let path = straight_path(10, 1.0, 5.0);

        // Past the last point wraps around to the start
        let pose = Pose::at(Vector3::new(9.5, 0.0, 0.0));
        assert_eq!(closest_ahead_index(&pose, &path), 0);

        // The first point is tested against the segment arriving from the last point, which on
        // an open path points backwards along the x axis
        let pose = Pose::at(Vector3::new(0.2, 0.3, 0.0));
        assert_eq!(closest_ahead_index(&pose, &path), 0);
        let pose = Pose::at(Vector3::new(-0.5, 0.0, 0.0));
        assert_eq!(closest_ahead_index(&pose, &path), 1);
    }

    #[test]
    fn test_precomputed_nearest() {
        let path = straight_path(20, 1.0, 5.0);

        for x in [-1.0, 0.0, 3.4, 3.5, 7.9, 19.0, 25.0].iter() {
            let pose = Pose::at(Vector3::new(*x, 0.4, 0.0));
            let nearest = path.nearest(&pose.position2());

            assert_eq!(
                closest_ahead_from(&pose, &path, nearest),
                closest_ahead_index(&pose, &path)
            );
        }
    }

    #[test]
    fn test_single_point_path() {
        let path = PathIndex::build(vec![Waypoint::new(Vector3::new(3.0, 4.0, 0.0), 1.0)]).unwrap();
        let pose = Pose::at(Vector3::new(10.0, 10.0, 0.0));

        assert_eq!(closest_ahead_index(&pose, &path), 0);
    }

    #[test]
    fn test_pose_validation() {
        let msg = PoseMsg {
            position_m: [1.0, 2.0, 0.5],
            attitude_q: [0.0, 0.0, 0.0, 2.0],
        };
        let pose = Pose::try_from(&msg).unwrap();
        assert_eq!(pose.position_m, Vector3::new(1.0, 2.0, 0.5));
        assert!(pose.get_heading().abs() < 1e-12);

        let bad = PoseMsg {
            position_m: [std::f64::INFINITY, 0.0, 0.0],
            ..msg
        };
        assert_eq!(Pose::try_from(&bad), Err(LocError::InvalidPose(bad)));

        let zero_q = PoseMsg {
            attitude_q: [0.0; 4],
            ..msg
        };
        assert!(Pose::try_from(&zero_q).is_err());
    }
}
