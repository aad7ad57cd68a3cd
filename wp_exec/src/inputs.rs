//! # Shared inputs
//!
//! Latest observed values written by the message handlers and read once per cycle by the
//! control loop.
//!
//! The pose and stop request share a single mutex so a cycle always sees a consistent pair. The
//! path index is built once and never changes, so it lives in a write-once cell which needs no
//! locking to read.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    convert::TryFrom,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use conquer_once::OnceCell;
use log::{info, trace, warn};

use crate::{
    bus::WaypointHandlers,
    loc::Pose,
    path::PathIndex,
    speed_profile::StopRequest,
};
use comms_if::msg::{LaneMsg, PoseMsg, StopLineMsg};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Inputs shared between the message handlers and the control loop.
pub struct SharedInputs {
    latest: Mutex<Latest>,
    path: OnceCell<Arc<PathIndex>>,
}

#[derive(Debug, Default)]
struct Latest {
    pose: Option<Pose>,
    stop: StopRequest,
}

/// A consistent view of the inputs for a single cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub pose: Pose,
    pub stop: StopRequest,
    pub path: Arc<PathIndex>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SharedInputs {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(Latest::default()),
            path: OnceCell::uninit(),
        }
    }

    /// Overwrite the held pose.
    pub fn set_pose(&self, pose: Pose) {
        self.lock().pose = Some(pose);
    }

    /// Overwrite the held stop request.
    pub fn set_stop(&self, stop: StopRequest) {
        self.lock().stop = stop;
    }

    /// Set the path if it has not already been set.
    ///
    /// Returns `true` if this call set the path. Later calls, including concurrent ones, leave
    /// the first path in place.
    pub fn set_path(&self, path: PathIndex) -> bool {
        self.path.try_init_once(|| Arc::new(path)).is_ok()
    }

    /// True once a path has been set.
    pub fn path_ready(&self) -> bool {
        self.path.is_initialized()
    }

    /// Get the inputs for a cycle, or `None` if the pose or path is still missing.
    pub fn snapshot(&self) -> Option<Snapshot> {
        let path = self.path.get()?.clone();

        let latest = self.lock();

        Some(Snapshot {
            pose: latest.pose?,
            stop: latest.stop,
            path,
        })
    }

    /// A poisoned lock only means a writer panicked mid-assignment of plain values, so the data
    /// is still usable.
    fn lock(&self) -> MutexGuard<'_, Latest> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedInputs {
    fn default() -> Self {
        Self::new()
    }
}

impl WaypointHandlers for SharedInputs {
    fn on_pose(&self, msg: &PoseMsg) {
        match Pose::try_from(msg) {
            Ok(p) => self.set_pose(p),
            Err(e) => warn!("Dropping pose: {}", e),
        }
    }

    fn on_path(&self, msg: &LaneMsg) {
        if self.path_ready() {
            trace!("Path already loaded, ignoring base_waypoints seq {}", msg.seq);
            return;
        }

        match PathIndex::from_lane(msg) {
            Ok(path) => {
                let len = path.len();
                if self.set_path(path) {
                    info!("Loaded base path with {} waypoints", len);
                }
            }
            Err(e) => warn!("Dropping base_waypoints seq {}: {}", msg.seq, e),
        }
    }

    fn on_stop(&self, msg: &StopLineMsg) {
        match StopRequest::try_from(msg) {
            Ok(s) => self.set_stop(s),
            Err(e) => warn!("Dropping stop line: {}", e),
        }
    }

    fn on_obstacle(&self, msg: &LaneMsg) {
        trace!("Obstacle lane with {} waypoints received", msg.waypoints.len());
    }
}
