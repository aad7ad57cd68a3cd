//! # Network
//!
//! Socket helpers over ZeroMQ. Every message on the bus is a single string frame, so the
//! helpers only deal with opening and configuring sockets.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Endpoint of the publisher providing pose, base path, stop line and obstacle messages.
    pub bus_endpoint: String,

    /// Endpoint the updater binds to publish the final waypoints on.
    pub final_waypoints_endpoint: String,
}

/// Represents options which can be set on a socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Publishers should have this
    /// value set as `true`, subscribers should have it set as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_SNDHWM`: High water mark for outbound messages
    pub send_hwm: i32,

    /// `ZMQ_RCVHWM`: High water mark for inbound messages
    pub recv_hwm: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Could not create the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect or bind the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout),
            (set_sndhwm, self.send_hwm),
            (set_rcvhwm, self.recv_hwm)
        );

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // libzmq defaults
        Self {
            bind: false,
            linger: 30_000,
            reconnect_ivl: 100,
            recv_timeout: -1,
            send_timeout: -1,
            send_hwm: 1000,
            recv_hwm: 1000,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Open a socket of `socket_type`, configure it and then bind or connect it to `endpoint`
/// depending on `socket_options.bind`.
pub fn open_socket(
    ctx: &Context,
    socket_type: SocketType,
    socket_options: &SocketOptions,
    endpoint: &str,
) -> Result<Socket, NetError> {
    let socket = ctx.socket(socket_type).map_err(NetError::CreateSocketError)?;

    socket_options.set(&socket)?;

    match socket_options.bind {
        false => socket.connect(endpoint),
        true => socket.bind(endpoint),
    }
    .map_err(|e| NetError::CouldNotConnect(endpoint.into(), e))?;

    Ok(socket)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_inproc_pub_sub() {
        let ctx = Context::new();

        let publisher = open_socket(
            &ctx,
            zmq::PUB,
            &SocketOptions {
                bind: true,
                linger: 0,
                ..Default::default()
            },
            "inproc://net_test",
        )
        .unwrap();

        let subscriber = open_socket(
            &ctx,
            zmq::SUB,
            &SocketOptions {
                linger: 0,
                recv_timeout: 50,
                ..Default::default()
            },
            "inproc://net_test",
        )
        .unwrap();
        subscriber.set_subscribe(b"current_pose ").unwrap();

        // Subscriptions take a moment to propagate, so keep publishing until one arrives
        let mut received = None;
        for _ in 0..100 {
            publisher.send("obstacle_waypoint {}", 0).unwrap();
            publisher.send("current_pose {}", 0).unwrap();
            if let Ok(Ok(s)) = subscriber.recv_string(0) {
                received = Some(s);
                break;
            }
        }

        assert_eq!(received.as_deref(), Some("current_pose {}"));
    }

    #[test]
    fn test_bad_endpoint() {
        let ctx = Context::new();
        assert!(matches!(
            open_socket(&ctx, zmq::SUB, &SocketOptions::default(), "not-an-endpoint"),
            Err(NetError::CouldNotConnect(_, _))
        ));
    }
}
