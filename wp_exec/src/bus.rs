//! # Message bus interface
//!
//! Decouples the updater from the transport. Inbound messages are dispatched to a
//! [`WaypointHandlers`] object and outbound windows are handed to a [`LaneSink`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Display;

use log::trace;

use crate::path::Waypoint;
use comms_if::msg::{BusMsg, LaneMsg, PoseMsg, StopLineMsg};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Handlers for each inbound message type.
///
/// Handlers may be called from a different thread to the control loop and must not block.
pub trait WaypointHandlers: Send + Sync {
    /// A new vehicle pose has arrived.
    fn on_pose(&self, msg: &PoseMsg);

    /// The static path has been delivered, possibly not for the first time.
    fn on_path(&self, msg: &LaneMsg);

    /// The stop line index has been updated.
    fn on_stop(&self, msg: &StopLineMsg);

    /// An obstacle lane has arrived.
    fn on_obstacle(&self, msg: &LaneMsg);
}

/// Destination for the windows produced by the control loop.
pub trait LaneSink {
    type Error: Display;

    fn publish(&mut self, waypoints: &[Waypoint]) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

/// Collects every window, used for testing the loop without a network.
impl LaneSink for Vec<Vec<Waypoint>> {
    type Error = std::convert::Infallible;

    fn publish(&mut self, waypoints: &[Waypoint]) -> Result<(), Self::Error> {
        self.push(waypoints.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Route a decoded message to the matching handler.
///
/// Outbound messages are ignored, they are only seen if a subscriber is pointed at our own
/// publisher.
pub fn dispatch(handlers: &dyn WaypointHandlers, msg: &BusMsg) {
    match msg {
        BusMsg::CurrentPose(m) => handlers.on_pose(m),
        BusMsg::BaseWaypoints(m) => handlers.on_path(m),
        BusMsg::TrafficWaypoint(m) => handlers.on_stop(m),
        BusMsg::ObstacleWaypoint(m) => handlers.on_obstacle(m),
        BusMsg::FinalWaypoints(_) => trace!("Ignoring inbound final_waypoints message"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl WaypointHandlers for Recorder {
        fn on_pose(&self, _: &PoseMsg) {
            self.0.lock().unwrap().push("pose");
        }
        fn on_path(&self, _: &LaneMsg) {
            self.0.lock().unwrap().push("path");
        }
        fn on_stop(&self, _: &StopLineMsg) {
            self.0.lock().unwrap().push("stop");
        }
        fn on_obstacle(&self, _: &LaneMsg) {
            self.0.lock().unwrap().push("obstacle");
        }
    }

    #[test]
    fn test_dispatch() {
        let rec = Recorder::default();
        let pose = PoseMsg {
            position_m: [0.0; 3],
            attitude_q: [0.0, 0.0, 0.0, 1.0],
        };

        let msgs = vec![
            BusMsg::CurrentPose(pose),
            BusMsg::BaseWaypoints(LaneMsg::new(0, vec![])),
            BusMsg::TrafficWaypoint(StopLineMsg { index: -1 }),
            BusMsg::ObstacleWaypoint(LaneMsg::new(0, vec![])),
            BusMsg::FinalWaypoints(LaneMsg::new(0, vec![])),
        ];

        for m in msgs.iter() {
            dispatch(&rec, m);
        }

        assert_eq!(*rec.0.lock().unwrap(), vec!["pose", "path", "stop", "obstacle"]);
    }
}
