//! # Message Definitions
//!
//! All messages exchanged on the waypoint bus. Each message travels as a single string frame of
//! the form `"<topic> <json payload>"`, so that subscribers can filter on the topic prefix.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt, str::FromStr};

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position and attitude of the vehicle, or of a point on a path.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct PoseMsg {
    /// Position in the map frame
    pub position_m: [f64; 3],

    /// Attitude quaternion in the map frame, ordered `[i, j, k, w]`.
    pub attitude_q: [f64; 4],
}

/// A single point on a lane along with the target speed at that point.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct WaypointMsg {
    pub pose: PoseMsg,

    /// Target speed at this point in meters/second
    pub speed_ms: f64,
}

/// An ordered list of waypoints.
///
/// Used for the static base path, the obstacle stream and the published lookahead window.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LaneMsg {
    /// Sequence number of this lane from its publisher
    pub seq: u64,

    /// UTC time the lane was produced
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub waypoints: Vec<WaypointMsg>,
}

/// The index of the stop line in the base path the vehicle should stop at, or `-1` for no stop.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct StopLineMsg {
    pub index: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Topics on the waypoint bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Latest vehicle pose
    CurrentPose,

    /// The static reference path
    BaseWaypoints,

    /// Stop line index from the traffic light detector
    TrafficWaypoint,

    /// Obstacle waypoints, currently unused by the updater
    ObstacleWaypoint,

    /// The lookahead window published by the updater
    FinalWaypoints,
}

/// Any message that can be sent on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusMsg {
    CurrentPose(PoseMsg),
    BaseWaypoints(LaneMsg),
    TrafficWaypoint(StopLineMsg),
    ObstacleWaypoint(LaneMsg),
    FinalWaypoints(LaneMsg),
}

#[derive(Debug, thiserror::Error)]
pub enum MsgError {
    #[error("The frame has no payload after the topic")]
    MissingPayload,

    #[error("Unknown topic \"{0}\"")]
    UnknownTopic(String),

    #[error("Could not serialize the {0} message: {1}")]
    SerializationError(Topic, serde_json::Error),

    #[error("Could not deserialize the {0} payload: {1}")]
    DeserializeError(Topic, serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Topic {
    /// All topics the waypoint updater subscribes to.
    pub const INBOUND: [Topic; 4] = [
        Topic::CurrentPose,
        Topic::BaseWaypoints,
        Topic::TrafficWaypoint,
        Topic::ObstacleWaypoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::CurrentPose => "current_pose",
            Topic::BaseWaypoints => "base_waypoints",
            Topic::TrafficWaypoint => "traffic_waypoint",
            Topic::ObstacleWaypoint => "obstacle_waypoint",
            Topic::FinalWaypoints => "final_waypoints",
        }
    }

    /// The prefix to subscribe to in order to receive only this topic.
    ///
    /// Includes the trailing separator so that no topic matches another's prefix.
    pub fn subscription(&self) -> String {
        format!("{} ", self.as_str())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = MsgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current_pose" => Ok(Topic::CurrentPose),
            "base_waypoints" => Ok(Topic::BaseWaypoints),
            "traffic_waypoint" => Ok(Topic::TrafficWaypoint),
            "obstacle_waypoint" => Ok(Topic::ObstacleWaypoint),
            "final_waypoints" => Ok(Topic::FinalWaypoints),
            other => Err(MsgError::UnknownTopic(other.into())),
        }
    }
}

impl LaneMsg {
    /// Create a new lane stamped with the current time.
    pub fn new(seq: u64, waypoints: Vec<WaypointMsg>) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            waypoints,
        }
    }
}

impl BusMsg {
    pub fn topic(&self) -> Topic {
        match self {
            BusMsg::CurrentPose(_) => Topic::CurrentPose,
            BusMsg::BaseWaypoints(_) => Topic::BaseWaypoints,
            BusMsg::TrafficWaypoint(_) => Topic::TrafficWaypoint,
            BusMsg::ObstacleWaypoint(_) => Topic::ObstacleWaypoint,
            BusMsg::FinalWaypoints(_) => Topic::FinalWaypoints,
        }
    }

    /// Encode the message into a `"<topic> <json>"` frame.
    pub fn to_wire(&self) -> Result<String, MsgError> {
        let topic = self.topic();

        let payload = match self {
            BusMsg::CurrentPose(m) => serde_json::to_string(m),
            BusMsg::BaseWaypoints(m) | BusMsg::ObstacleWaypoint(m) | BusMsg::FinalWaypoints(m) => {
                serde_json::to_string(m)
            }
            BusMsg::TrafficWaypoint(m) => serde_json::to_string(m),
        }
        .map_err(|e| MsgError::SerializationError(topic, e))?;

        Ok(format!("{} {}", topic, payload))
    }

    /// Decode a message from a `"<topic> <json>"` frame.
    pub fn from_wire(frame: &str) -> Result<Self, MsgError> {
        let mut parts = frame.splitn(2, ' ');

        // splitn always yields at least one item
        let topic: Topic = parts.next().unwrap_or("").parse()?;
        let payload = parts.next().ok_or(MsgError::MissingPayload)?;

        let de_err = |e| MsgError::DeserializeError(topic, e);

        Ok(match topic {
            Topic::CurrentPose => BusMsg::CurrentPose(serde_json::from_str(payload).map_err(de_err)?),
            Topic::BaseWaypoints => {
                BusMsg::BaseWaypoints(serde_json::from_str(payload).map_err(de_err)?)
            }
            Topic::TrafficWaypoint => {
                BusMsg::TrafficWaypoint(serde_json::from_str(payload).map_err(de_err)?)
            }
            Topic::ObstacleWaypoint => {
                BusMsg::ObstacleWaypoint(serde_json::from_str(payload).map_err(de_err)?)
            }
            Topic::FinalWaypoints => {
                BusMsg::FinalWaypoints(serde_json::from_str(payload).map_err(de_err)?)
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_stop_line_frame() {
        let frame = BusMsg::TrafficWaypoint(StopLineMsg { index: -1 }).to_wire().unwrap();
        assert_eq!(frame, "traffic_waypoint {\"index\":-1}");

        match BusMsg::from_wire("traffic_waypoint {\"index\":292}").unwrap() {
            BusMsg::TrafficWaypoint(m) => assert_eq!(m.index, 292),
            m => panic!("Wrong message decoded: {:?}", m),
        }
    }

    #[test]
    fn test_lane_frame() {
        let lane = LaneMsg::new(
            7,
            vec![WaypointMsg {
                pose: PoseMsg {
                    position_m: [1.0, 2.0, 0.0],
                    attitude_q: [0.0, 0.0, 0.0, 1.0],
                },
                speed_ms: 11.1,
            }],
        );

        let frame = BusMsg::FinalWaypoints(lane.clone()).to_wire().unwrap();
        assert!(frame.starts_with("final_waypoints {"));

        // Timestamps only survive to millisecond precision
        match BusMsg::from_wire(&frame).unwrap() {
            BusMsg::FinalWaypoints(m) => {
                assert_eq!(m.seq, 7);
                assert_eq!(m.waypoints, lane.waypoints);
                assert_eq!(m.timestamp.timestamp_millis(), lane.timestamp.timestamp_millis());
            }
            m => panic!("Wrong message decoded: {:?}", m),
        }
    }

    #[test]
    fn test_bad_frames() {
        assert!(matches!(
            BusMsg::from_wire("steering_cmd {}"),
            Err(MsgError::UnknownTopic(t)) if t == "steering_cmd"
        ));
        assert!(matches!(
            BusMsg::from_wire("current_pose"),
            Err(MsgError::MissingPayload)
        ));
        assert!(matches!(
            BusMsg::from_wire("current_pose {\"position_m\": [1.0]}"),
            Err(MsgError::DeserializeError(Topic::CurrentPose, _))
        ));
    }

    #[test]
    fn test_subscriptions_are_distinct() {
        for a in Topic::INBOUND.iter() {
            for b in Topic::INBOUND.iter() {
                if a != b {
                    assert!(!a.subscription().starts_with(&b.subscription()));
                }
            }
            assert_eq!(a.as_str().parse::<Topic>().unwrap(), *a);
        }
    }
}
