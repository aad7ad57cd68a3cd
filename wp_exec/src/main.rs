//! Main waypoint updater executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Load parameters and initialise the updater
//!     - Start the bus client, which writes pose, path and stop line updates into the shared
//!       inputs from a background thread
//!     - Main loop, at a fixed rate:
//!         - Snapshot the shared inputs
//!         - Localise on the path, slice the lookahead window and reshape its speeds
//!         - Publish the window as `final_waypoints`
//!     - Exit on Ctrl-C

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::info;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

// Internal
use comms_if::net::{zmq, NetParams};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};
use wp_lib::{
    bus_client::{BusClient, LanePublisher},
    control_loop::ControlLoop,
    inputs::SharedInputs,
    wp_updater::{Params, WaypointUpdater},
};

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("wp_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Waypoint Updater Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let wp_params: Params =
        util::params::load("wp_updater.toml").wrap_err("Could not load waypoint updater params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let updater = WaypointUpdater::init(wp_params).wrap_err("Failed to initialise WaypointUpdater")?;
    info!("WaypointUpdater init complete: {:?}", updater.params());

    // ---- INITIALISE SHUTDOWN HANDLER ----

    let run = Arc::new(AtomicBool::new(true));
    {
        let run = run.clone();
        ctrlc::set_handler(move || {
            run.store(false, Ordering::Relaxed);
        })
        .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();
    let inputs = Arc::new(SharedInputs::new());

    let bus_client = BusClient::start(&zmq_ctx, &net_params.bus_endpoint, inputs.clone())
        .wrap_err("Failed to initialise the BusClient")?;
    info!("BusClient subscribed to {}", net_params.bus_endpoint);

    let publisher = LanePublisher::new(&zmq_ctx, &net_params.final_waypoints_endpoint)
        .wrap_err("Failed to initialise the LanePublisher")?;
    info!("LanePublisher bound to {}", net_params.final_waypoints_endpoint);

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    let mut control_loop = ControlLoop::new(updater, inputs, publisher, run)
        .wrap_err("Failed to create the control loop")?
        .with_input_liveness(bus_client.liveness());

    info!("Waiting for pose and path\n");

    control_loop.run();

    // ---- SHUTDOWN ----

    if !bus_client.is_running() {
        return Err(eyre!("The BusClient stopped unexpectedly"));
    }
    drop(bus_client);

    info!("End of execution");

    Ok(())
}
