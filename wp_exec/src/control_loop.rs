//! # Control loop
//!
//! Runs the [`WaypointUpdater`] at a fixed rate, reading a snapshot of the shared inputs at the
//! start of each cycle and handing the resulting window to a [`LaneSink`].
//!
//! Cycles where the pose or path is not yet known are skipped without output. The loop exits at
//! the next cycle boundary once the run flag is cleared.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use log::{error, info, trace, warn};

use crate::{
    bus::LaneSink,
    inputs::SharedInputs,
    wp_updater::{StatusReport, WaypointUpdater, WaypointUpdaterError},
};
use util::module::State;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

pub struct ControlLoop<S: LaneSink> {
    period: Duration,
    run: Arc<AtomicBool>,

    inputs: Arc<SharedInputs>,
    updater: WaypointUpdater,
    sink: S,

    /// Cleared by the input source when it stops delivering messages
    input_alive: Option<Arc<AtomicBool>>,

    /// True if the last cycle produced a window
    ready: bool,

    num_cycles: u64,
    num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Result of a single cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// A window was produced and handed to the sink
    Published(StatusReport),

    /// The pose or path was missing so nothing was produced
    Skipped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S: LaneSink> ControlLoop<S> {
    /// Create a new loop. The cycle period comes from the updater's `tick_rate_hz` and the loop
    /// runs until `run` is cleared.
    pub fn new(
        updater: WaypointUpdater,
        inputs: Arc<SharedInputs>,
        sink: S,
        run: Arc<AtomicBool>,
    ) -> Result<Self, WaypointUpdaterError> {
        let tick_rate_hz = updater.params().tick_rate_hz;
        let period = util::time::rate_to_period(tick_rate_hz).ok_or_else(|| {
            WaypointUpdaterError::InvalidParams(
                "tick_rate_hz",
                format!("cannot derive a period from {}", tick_rate_hz),
            )
        })?;

        Ok(Self {
            period,
            run,
            inputs,
            updater,
            sink,
            input_alive: None,
            ready: false,
            num_cycles: 0,
            num_consec_cycle_overruns: 0,
        })
    }

    /// Watch a flag which the input source clears when it stops. Once it is cleared no further
    /// windows are published, since the held pose would never be updated again.
    pub fn with_input_liveness(mut self, input_alive: Arc<AtomicBool>) -> Self {
        self.input_alive = Some(input_alive);
        self
    }

    /// False once the watched input source has stopped.
    pub fn inputs_alive(&self) -> bool {
        self.input_alive
            .as_ref()
            .map_or(true, |a| a.load(Ordering::Relaxed))
    }

    /// Perform one cycle.
    ///
    /// A failure to publish is logged and does not stop the loop.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.inputs_alive() {
            if self.ready {
                error!("Input source has stopped, output halted");
                self.ready = false;
            }
            return TickOutcome::Skipped;
        }

        let snapshot = match self.inputs.snapshot() {
            Some(s) => s,
            None => {
                if self.ready {
                    info!("Pose or path no longer available, output paused");
                    self.ready = false;
                }
                return TickOutcome::Skipped;
            }
        };

        if !self.ready {
            info!("Pose and path available, publishing final waypoints");
            self.ready = true;
        }

        let (window, report) = match self.updater.proc(&snapshot) {
            Ok(o) => o,
            Err(e) => match e {},
        };

        if let Err(e) = self.sink.publish(&window) {
            warn!("Could not publish final waypoints: {}", e);
        }

        TickOutcome::Published(report)
    }

    /// Run cycles at the fixed rate until the run flag is cleared.
    pub fn run(&mut self) {
        info!(
            "Control loop running at {:.01} Hz",
            self.updater.params().tick_rate_hz
        );

        while self.run.load(Ordering::Relaxed) && self.inputs_alive() {
            let cycle_start_instant = Instant::now();

            if let TickOutcome::Published(report) = self.tick() {
                trace!("Cycle {}: {:?}", self.num_cycles, report);
            }

            self.num_cycles += 1;

            let cycle_dur = cycle_start_instant.elapsed();

            match self.period.checked_sub(cycle_dur) {
                Some(d) => {
                    self.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    self.num_consec_cycle_overruns += 1;
                    warn!(
                        "Cycle overran by {:.06} s ({} consecutive)",
                        (cycle_dur - self.period).as_secs_f64(),
                        self.num_consec_cycle_overruns
                    );
                }
            }
        }

        if !self.inputs_alive() {
            error!("Input source has stopped, control loop exiting");
        }

        info!("Control loop stopped after {} cycles", self.num_cycles);
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn num_consec_cycle_overruns(&self) -> u64 {
        self.num_consec_cycle_overruns
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
