//! Parameters structure for the WaypointUpdater

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::WaypointUpdaterError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the WaypointUpdater.
///
/// Any value missing from the parameter file takes its default.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    // ---- WINDOW ----
    /// Maximum number of waypoints published in each lookahead window.
    pub lookahead_wps: usize,

    // ---- SPEED PROFILE ----
    /// Maximum deceleration used when building a stopping profile.
    ///
    /// Units: meters/second^2
    pub max_decel_mss: f64,

    /// Number of waypoints before the stop line at which the vehicle should be stationary.
    pub stop_buffer_wps: usize,

    /// Profile speeds below this value are set to zero.
    ///
    /// Units: meters/second
    pub velocity_floor_ms: f64,

    // ---- TIMING ----
    /// Rate at which windows are computed and published.
    ///
    /// Units: Hertz
    pub tick_rate_hz: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            lookahead_wps: 50,
            max_decel_mss: 0.5,
            stop_buffer_wps: 2,
            velocity_floor_ms: 1.0,
            tick_rate_hz: 50.0,
        }
    }
}

impl Params {
    /// Check the parameters are usable, returning the first problem found.
    pub fn validate(&self) -> Result<(), WaypointUpdaterError> {
        if self.lookahead_wps < 1 {
            return Err(WaypointUpdaterError::InvalidParams(
                "lookahead_wps",
                "must be at least 1".into(),
            ));
        }

        if !(self.max_decel_mss > 0.0) || !self.max_decel_mss.is_finite() {
            return Err(WaypointUpdaterError::InvalidParams(
                "max_decel_mss",
                format!("must be positive and finite, got {}", self.max_decel_mss),
            ));
        }

        if !(self.velocity_floor_ms >= 0.0) || !self.velocity_floor_ms.is_finite() {
            return Err(WaypointUpdaterError::InvalidParams(
                "velocity_floor_ms",
                format!("must be non-negative and finite, got {}", self.velocity_floor_ms),
            ));
        }

        if !(self.tick_rate_hz > 0.0) || !self.tick_rate_hz.is_finite() {
            return Err(WaypointUpdaterError::InvalidParams(
                "tick_rate_hz",
                format!("must be positive and finite, got {}", self.tick_rate_hz),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let params: Params = util::params::from_str("lookahead_wps = 20\ntick_rate_hz = 10.0").unwrap();

        assert_eq!(params.lookahead_wps, 20);
        assert_eq!(params.tick_rate_hz, 10.0);
        assert_eq!(params.max_decel_mss, 0.5);
        assert_eq!(params.stop_buffer_wps, 2);
        assert_eq!(params.velocity_floor_ms, 1.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(Params::default().validate().is_ok());

        let bad = [
            Params {
                lookahead_wps: 0,
                ..Default::default()
            },
            Params {
                max_decel_mss: 0.0,
                ..Default::default()
            },
            Params {
                max_decel_mss: f64::NAN,
                ..Default::default()
            },
            Params {
                velocity_floor_ms: -0.1,
                ..Default::default()
            },
            Params {
                tick_rate_hz: f64::INFINITY,
                ..Default::default()
            },
        ];

        for p in bad.iter() {
            assert!(
                matches!(p.validate(), Err(WaypointUpdaterError::InvalidParams(_, _))),
                "{:?} should be invalid",
                p
            );
        }

        // A zero floor disables snapping, which is allowed
        assert!(Params {
            velocity_floor_ms: 0.0,
            ..Default::default()
        }
        .validate()
        .is_ok());
    }
}
