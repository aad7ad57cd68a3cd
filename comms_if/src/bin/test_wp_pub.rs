//! Synthetic feed for the waypoint updater.
//!
//! Publishes a straight base path, a pose moving along it, and a stop line near the end of the
//! path. The base path is republished every second so late subscribers still receive it.
//!
//! Usage: `test_wp_pub [endpoint]`, the endpoint defaults to `tcp://*:5010`.

use comms_if::{
    msg::{BusMsg, LaneMsg, PoseMsg, StopLineMsg, WaypointMsg},
    net::{open_socket, zmq, SocketOptions},
};

const NUM_POINTS: usize = 200;
const POINT_SEP_M: f64 = 1.0;
const SPEED_MS: f64 = 11.1;
const STOP_LINE_INDEX: i32 = 150;
const PERIOD_S: f64 = 0.1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::args().nth(1).unwrap_or_else(|| "tcp://*:5010".into());

    let ctx = zmq::Context::new();

    let socket = open_socket(
        &ctx,
        zmq::PUB,
        &SocketOptions {
            bind: true,
            linger: 0,
            ..Default::default()
        },
        &endpoint,
    )?;

    println!("Synthetic feed publishing on {}", endpoint);

    let base = LaneMsg::new(
        0,
        (0..NUM_POINTS)
            .map(|i| WaypointMsg {
                pose: PoseMsg {
                    position_m: [i as f64 * POINT_SEP_M, 0.0, 0.0],
                    attitude_q: [0.0, 0.0, 0.0, 1.0],
                },
                speed_ms: SPEED_MS,
            })
            .collect(),
    );
    let base_frame = BusMsg::BaseWaypoints(base).to_wire()?;

    let mut x_m = 0.0;
    let mut cycle: u64 = 0;

    loop {
        if cycle % 10 == 0 {
            socket.send(base_frame.as_str(), 0)?;
        }

        let pose = BusMsg::CurrentPose(PoseMsg {
            position_m: [x_m, 0.2, 0.0],
            attitude_q: [0.0, 0.0, 0.0, 1.0],
        });
        socket.send(pose.to_wire()?.as_str(), 0)?;

        // Show the stop line once the vehicle is within 60 m of it
        let stop_dist_m = STOP_LINE_INDEX as f64 * POINT_SEP_M - x_m;
        let index = if stop_dist_m < 60.0 { STOP_LINE_INDEX } else { -1 };
        socket.send(BusMsg::TrafficWaypoint(StopLineMsg { index }).to_wire()?.as_str(), 0)?;

        // Creep forward, slowing as the stop line approaches, then loop back to the start
        x_m += (stop_dist_m.max(0.0) * 0.05).min(SPEED_MS) * PERIOD_S + 0.01;
        if x_m >= (NUM_POINTS - 1) as f64 * POINT_SEP_M {
            x_m = 0.0;
        }

        cycle += 1;
        std::thread::sleep(std::time::Duration::from_secs_f64(PERIOD_S));
    }
}
