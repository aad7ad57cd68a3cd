//! Implementations for the WaypointUpdater state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Params, WaypointUpdaterError};
use crate::{
    inputs::Snapshot,
    loc,
    path::Waypoint,
    speed_profile::{self, StopRequest},
    window,
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Waypoint updater module state
#[derive(Debug)]
pub struct WaypointUpdater {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
}

/// Status report for WaypointUpdater processing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    /// Index of the path point nearest the vehicle
    pub nearest_index: usize,

    /// Index of the first path point ahead of the vehicle, where the window starts
    pub start_index: usize,

    /// Number of waypoints in the emitted window
    pub window_len: usize,

    /// Stop line index in effect for this cycle, if any
    pub stop_index: Option<usize>,

    /// True if the speed profile was reshaped for a stop
    pub reshaped: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            nearest_index: 0,
            start_index: 0,
            window_len: 0,
            stop_index: None,
            reshaped: false,
        }
    }
}

impl WaypointUpdater {
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The report from the most recent call to `proc`.
    pub fn last_report(&self) -> StatusReport {
        self.report
    }
}

impl State for WaypointUpdater {
    type InitData = Params;
    type InitError = WaypointUpdaterError;

    type InputData = Snapshot;
    type OutputData = Vec<Waypoint>;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the WaypointUpdater module from already loaded parameters.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        init_data.validate()?;

        Ok(Self {
            params: init_data,
            report: StatusReport::default(),
        })
    }

    /// Compute the lookahead window for one cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let path = &input_data.path;

        let nearest_index = path.nearest(&input_data.pose.position2());
        let start_index = loc::closest_ahead_from(&input_data.pose, path, nearest_index);

        let window = window::slice(path.waypoints(), start_index, self.params.lookahead_wps);

        let reshaped = speed_profile::target_stop_offset(
            input_data.stop,
            start_index,
            window.len(),
            self.params.stop_buffer_wps,
        )
        .is_some();

        let output = speed_profile::reshape(&window, input_data.stop, start_index, &self.params);

        self.report = StatusReport {
            nearest_index,
            start_index,
            window_len: output.len(),
            stop_index: match input_data.stop {
                StopRequest::Line(i) => Some(i),
                StopRequest::None => None,
            },
            reshaped,
        };

        trace!("WaypointUpdater status: {:?}", self.report);

        Ok((output, self.report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{loc::Pose, path::test::straight_path};
    use nalgebra::Vector3;
    use std::sync::Arc;

    fn snapshot(x: f64, stop: StopRequest, len: usize) -> Snapshot {
        Snapshot {
            pose: Pose::at(Vector3::new(x, 0.0, 0.0)),
            stop,
            path: Arc::new(straight_path(len, 1.0, 5.0)),
        }
    }

    fn speeds(wps: &[Waypoint]) -> Vec<f64> {
        wps.iter().map(|w| w.speed_ms).collect()
    }

    #[test]
    fn test_init_rejects_invalid_params() {
        assert!(WaypointUpdater::init(Params {
            lookahead_wps: 0,
            ..Default::default()
        })
        .is_err());
        assert!(WaypointUpdater::init(Params::default()).is_ok());
    }

    #[test]
    fn test_end_to_end_five_points() {
        let mut wu = WaypointUpdater::init(Params::default()).unwrap();

        // Vehicle between points 1 and 2, stop line at 3
        let (output, report) = wu.proc(&snapshot(1.5, StopRequest::Line(3), 5)).unwrap();

        assert_eq!(report.start_index, 2);
        assert_eq!(report.window_len, 3);
        assert_eq!(report.stop_index, Some(3));
        assert!(report.reshaped);

        let xs: Vec<f64> = output.iter().map(|w| w.position_m.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(speeds(&output), vec![0.0, 0.0, 0.0]);

        // No stop passes the path speeds straight through
        let (output, report) = wu.proc(&snapshot(1.5, StopRequest::None, 5)).unwrap();
        assert!(!report.reshaped);
        assert_eq!(speeds(&output), vec![5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_window_truncated_at_path_end() {
        let mut wu = WaypointUpdater::init(Params::default()).unwrap();

        for x in [10.0, 60.0, 95.0, 99.0].iter() {
            let snap = snapshot(*x, StopRequest::None, 100);
            let (output, report) = wu.proc(&snap).unwrap();

            assert_eq!(report.start_index, *x as usize);
            assert_eq!(output.len(), 50.min(100 - report.start_index));
            assert_eq!(output[0].position_m.x, *x);
            assert_eq!(wu.last_report(), report);
        }
    }

    #[test]
    fn test_stored_path_untouched() {
        let mut wu = WaypointUpdater::init(Params::default()).unwrap();
        let snap = snapshot(10.0, StopRequest::Line(30), 100);

        let (output, report) = wu.proc(&snap).unwrap();

        assert!(report.reshaped);
        assert_eq!(output[18].speed_ms, 0.0);
        assert!(snap.path.waypoints().iter().all(|w| w.speed_ms == 5.0));
    }

    #[test]
    fn test_report_indices() {
        let mut wu = WaypointUpdater::init(Params::default()).unwrap();

        for x in [0.0, 4.2, 4.8, 50.5, 99.0].iter() {
            let snap = snapshot(*x, StopRequest::None, 100);
            let (_, report) = wu.proc(&snap).unwrap();

            assert_eq!(report.nearest_index, snap.path.nearest(&snap.pose.position2()));
            assert_eq!(
                report.start_index,
                loc::closest_ahead_index(&snap.pose, &snap.path)
            );
        }
    }

    #[test]
    fn test_distant_stop_passes_through() {
        let mut wu = WaypointUpdater::init(Params {
            lookahead_wps: 10,
            ..Default::default()
        })
        .unwrap();

        let (output, report) = wu.proc(&snapshot(10.0, StopRequest::Line(20), 100)).unwrap();

        assert_eq!(report.window_len, 10);
        assert!(!report.reshaped);
        assert!(output.iter().all(|w| w.speed_ms == 5.0));
    }
}
