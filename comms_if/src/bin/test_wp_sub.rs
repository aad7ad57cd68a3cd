//! Prints the final waypoints published by the waypoint updater.
//!
//! Usage: `test_wp_sub [endpoint]`, the endpoint defaults to `tcp://localhost:5011`.

use comms_if::{
    msg::{BusMsg, Topic},
    net::{open_socket, zmq, SocketOptions},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tcp://localhost:5011".into());

    let ctx = zmq::Context::new();

    let socket = open_socket(&ctx, zmq::SUB, &SocketOptions::default(), &endpoint)?;
    socket.set_subscribe(Topic::FinalWaypoints.subscription().as_bytes())?;

    println!("Listening for final waypoints on {}", endpoint);

    loop {
        let frame = match socket.recv_string(0)? {
            Ok(s) => s,
            Err(_) => {
                println!("Got non UTF-8 frame");
                continue;
            }
        };

        match BusMsg::from_wire(&frame) {
            Ok(BusMsg::FinalWaypoints(lane)) => {
                let first = lane.waypoints.first().map(|w| w.pose.position_m[0]);
                let speeds: Vec<String> = lane
                    .waypoints
                    .iter()
                    .take(10)
                    .map(|w| format!("{:.2}", w.speed_ms))
                    .collect();
                println!(
                    "#{} {} waypoints from x = {:?}, speeds [{}, ...]",
                    lane.seq,
                    lane.waypoints.len(),
                    first,
                    speeds.join(", ")
                );
            }
            Ok(m) => println!("Unexpected message on {}", m.topic()),
            Err(e) => println!("Could not decode frame: {}", e),
        }
    }
}
