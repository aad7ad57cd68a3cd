//! # Bus client
//!
//! ZeroMQ transport for the updater. The [`BusClient`] subscribes to the inbound topics and
//! dispatches each message to the handlers on a background thread. The [`LanePublisher`]
//! publishes each lookahead window on the `final_waypoints` topic.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{debug, error, warn};

use crate::{
    bus::{dispatch, LaneSink, WaypointHandlers},
    path::Waypoint,
};
use comms_if::{
    msg::{BusMsg, LaneMsg, MsgError, Topic, WaypointMsg},
    net::{open_socket, zmq, NetError, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Subscribes to the inbound topics and feeds them to a set of handlers.
///
/// The background thread is stopped and joined when the client is dropped.
pub struct BusClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
}

/// Publishes lookahead windows as `final_waypoints` messages.
pub struct LanePublisher {
    socket: zmq::Socket,
    seq: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BusClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] NetError),

    #[error("Could not subscribe to {0}: {1}")]
    SubscribeError(Topic, zmq::Error),

    #[error("Could not encode the message: {0}")]
    MsgError(#[from] MsgError),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusClient {
    /// Connect to the bus at `endpoint` and start dispatching messages to `handlers`.
    pub fn start(
        ctx: &zmq::Context,
        endpoint: &str,
        handlers: Arc<dyn WaypointHandlers>,
    ) -> Result<Self, BusClientError> {
        let socket_options = SocketOptions {
            linger: 0,
            recv_timeout: 10,
            ..Default::default()
        };

        let socket = open_socket(ctx, zmq::SUB, &socket_options, endpoint)?;

        for topic in Topic::INBOUND.iter() {
            socket
                .set_subscribe(topic.subscription().as_bytes())
                .map_err(|e| BusClientError::SubscribeError(*topic, e))?;
        }

        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        let bg_jh = Some(thread::spawn(move || bg_thread(socket, bg_run_clone, handlers)));

        debug!("BusClient subscribed to {}", endpoint);

        Ok(Self { bg_jh, bg_run })
    }

    /// True while the background thread is running.
    pub fn is_running(&self) -> bool {
        self.bg_run.load(Ordering::Relaxed)
    }

    /// Flag which stays set while the background thread is running. It is cleared when the
    /// thread exits on an error or the client is dropped.
    pub fn liveness(&self) -> Arc<AtomicBool> {
        self.bg_run.clone()
    }
}

impl Drop for BusClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("BusClient background thread panicked");
            }
        }
    }
}

impl LanePublisher {
    /// Bind a publisher to `endpoint`.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, BusClientError> {
        // Only the newest window is worth delivering
        let socket_options = SocketOptions {
            bind: true,
            linger: 0,
            send_timeout: 10,
            send_hwm: 1,
            ..Default::default()
        };

        let socket = open_socket(ctx, zmq::PUB, &socket_options, endpoint)?;

        debug!("LanePublisher bound to {}", endpoint);

        Ok(Self { socket, seq: 0 })
    }

    /// Sequence number that will be given to the next published lane.
    pub fn next_seq(&self) -> u64 {
        self.seq
    }
}

impl LaneSink for LanePublisher {
    type Error = BusClientError;

    fn publish(&mut self, waypoints: &[Waypoint]) -> Result<(), Self::Error> {
        let lane = LaneMsg::new(self.seq, waypoints.iter().map(WaypointMsg::from).collect());
        let frame = BusMsg::FinalWaypoints(lane).to_wire()?;

        self.socket
            .send(frame.as_bytes(), 0)
            .map_err(BusClientError::SendError)?;

        self.seq += 1;

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, receives frames from the bus and dispatches them to the handlers.
fn bg_thread(socket: zmq::Socket, run: Arc<AtomicBool>, handlers: Arc<dyn WaypointHandlers>) {
    while run.load(Ordering::Relaxed) {
        let frame = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message on the bus");
                continue;
            }
            Err(zmq::Error::EAGAIN) | Err(zmq::Error::EINTR) => continue,
            Err(e) => {
                error!("Error receiving message from the bus, BusClient stopping: {}", e);
                break;
            }
        };

        match BusMsg::from_wire(&frame) {
            Ok(msg) => dispatch(handlers.as_ref(), &msg),
            Err(e) => warn!("Could not decode bus message: {}", e),
        }
    }

    run.store(false, Ordering::Relaxed);
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::msg::{PoseMsg, StopLineMsg};
    use nalgebra::Vector3;
    use std::{sync::Mutex, time::Duration};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<BusMsg>>);

    impl WaypointHandlers for Recorder {
        fn on_pose(&self, m: &PoseMsg) {
            self.0.lock().unwrap().push(BusMsg::CurrentPose(*m));
        }
        fn on_path(&self, m: &LaneMsg) {
            self.0.lock().unwrap().push(BusMsg::BaseWaypoints(m.clone()));
        }
        fn on_stop(&self, m: &StopLineMsg) {
            self.0.lock().unwrap().push(BusMsg::TrafficWaypoint(*m));
        }
        fn on_obstacle(&self, m: &LaneMsg) {
            self.0.lock().unwrap().push(BusMsg::ObstacleWaypoint(m.clone()));
        }
    }

    #[test]
    fn test_client_dispatches() {
        let ctx = zmq::Context::new();
        let publisher = open_socket(
            &ctx,
            zmq::PUB,
            &SocketOptions {
                bind: true,
                linger: 0,
                ..Default::default()
            },
            "inproc://bus_client_test",
        )
        .unwrap();

        let recorder = Arc::new(Recorder::default());
        let client = BusClient::start(&ctx, "inproc://bus_client_test", recorder.clone()).unwrap();

        let stop = BusMsg::TrafficWaypoint(StopLineMsg { index: 42 }).to_wire().unwrap();

        // Keep publishing until the subscription has propagated
        for _ in 0..200 {
            publisher.send("not_a_topic {}", 0).unwrap();
            publisher.send(stop.as_str(), 0).unwrap();
            if !recorder.0.lock().unwrap().is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert!(client.is_running());
        drop(client);

        let received = recorder.0.lock().unwrap();
        assert!(!received.is_empty());
        assert!(received
            .iter()
            .all(|m| *m == BusMsg::TrafficWaypoint(StopLineMsg { index: 42 })));
    }

    #[test]
    fn test_publisher_sequence() {
        let ctx = zmq::Context::new();
        let mut publisher = LanePublisher::new(&ctx, "inproc://lane_publisher_test").unwrap();

        let subscriber = open_socket(
            &ctx,
            zmq::SUB,
            &SocketOptions {
                linger: 0,
                recv_timeout: 10,
                ..Default::default()
            },
            "inproc://lane_publisher_test",
        )
        .unwrap();
        subscriber
            .set_subscribe(Topic::FinalWaypoints.subscription().as_bytes())
            .unwrap();

        let window = vec![
            Waypoint::new(Vector3::new(1.0, 2.0, 0.0), 3.0),
            Waypoint::new(Vector3::new(2.0, 2.0, 0.0), 0.0),
        ];

        let mut lanes = Vec::new();
        for _ in 0..200 {
            publisher.publish(&window).unwrap();
            if let Ok(Ok(s)) = subscriber.recv_string(0) {
                match BusMsg::from_wire(&s).unwrap() {
                    BusMsg::FinalWaypoints(l) => lanes.push(l),
                    m => panic!("Unexpected message {:?}", m),
                }
                if lanes.len() == 2 {
                    break;
                }
            }
        }

        assert_eq!(lanes.len(), 2);
        assert!(lanes[1].seq > lanes[0].seq);
        assert_eq!(lanes[0].waypoints.len(), 2);
        assert_eq!(lanes[0].waypoints[0].pose.position_m, [1.0, 2.0, 0.0]);
        assert_eq!(lanes[0].waypoints[1].speed_ms, 0.0);
        assert!(publisher.next_seq() > lanes[1].seq);
    }
}
