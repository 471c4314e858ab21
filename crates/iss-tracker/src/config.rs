//! Tracker configuration
//!
//! Defaults, then an optional JSON file, then environment variables.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ISS_TRACKER_HORIZON_MINUTES` | `prediction_horizon_minutes` |
//! | `ISS_TRACKER_HOME_ID` | `home_catalog_id` |
//! | `ISS_TRACKER_DRAG_DIVISOR` | `drag_divisor` |

use std::fs;
use std::path::Path;
use std::str::FromStr;

use orbital_mechanics::SUN_DISTANCE_M;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{NodeId, Result, TrackerError};

pub const ENV_HORIZON_MINUTES: &str = "ISS_TRACKER_HORIZON_MINUTES";
pub const ENV_HOME_ID: &str = "ISS_TRACKER_HOME_ID";
pub const ENV_DRAG_DIVISOR: &str = "ISS_TRACKER_DRAG_DIVISOR";

/// One low-orbit period
pub const DEFAULT_HORIZON_MINUTES: u32 = 92;
/// One week
pub const MAX_HORIZON_MINUTES: u32 = 10_080;
pub const DEFAULT_DRAG_DIVISOR: f64 = 2.0;
pub const DEFAULT_HOME_CATALOG_ID: NodeId = 25544;
pub const DEFAULT_DEBUG_TIME_WARP: f64 = 600.0;

/// A named playback speed the scrubber snaps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedMarker {
    pub label: String,
    pub multiplier: f64,
}

impl SpeedMarker {
    pub fn new(label: impl Into<String>, multiplier: f64) -> Self {
        Self {
            label: label.into(),
            multiplier,
        }
    }
}

pub fn default_speed_markers() -> Vec<SpeedMarker> {
    vec![
        SpeedMarker::new("reverse 150×", -150.0),
        SpeedMarker::new("real-time 1×", 1.0),
        SpeedMarker::new("50×", 50.0),
        SpeedMarker::new("200×", 200.0),
        SpeedMarker::new("350×", 350.0),
        SpeedMarker::new("500×", 500.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Prediction path length for the focused node, one point per minute
    pub prediction_horizon_minutes: u32,
    /// Ordered snap targets for drag release
    pub speed_markers: Vec<SpeedMarker>,
    /// Pointer pixels per unit of speed multiplier while dragging
    pub drag_divisor: f64,
    /// The satellite that can never be removed
    pub home_catalog_id: NodeId,
    /// Multiplier applied by the debug warp
    pub debug_time_warp: f64,
    /// Render radius of the Sun
    pub sun_distance_m: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            prediction_horizon_minutes: DEFAULT_HORIZON_MINUTES,
            speed_markers: default_speed_markers(),
            drag_divisor: DEFAULT_DRAG_DIVISOR,
            home_catalog_id: DEFAULT_HOME_CATALOG_ID,
            debug_time_warp: DEFAULT_DEBUG_TIME_WARP,
            sun_distance_m: SUN_DISTANCE_M,
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prediction_horizon_minutes(mut self, minutes: u32) -> Self {
        self.prediction_horizon_minutes = minutes;
        self
    }

    pub fn speed_markers(mut self, markers: Vec<SpeedMarker>) -> Self {
        self.speed_markers = markers;
        self
    }

    pub fn drag_divisor(mut self, divisor: f64) -> Self {
        self.drag_divisor = divisor;
        self
    }

    pub fn home_catalog_id(mut self, id: NodeId) -> Self {
        self.home_catalog_id = id;
        self
    }

    pub fn debug_time_warp(mut self, warp: f64) -> Self {
        self.debug_time_warp = warp;
        self
    }

    /// Load a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading tracker config from {:?}", path);

        let text = fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ISS_TRACKER_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_HORIZON_MINUTES)? {
            self.prediction_horizon_minutes = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_HOME_ID)? {
            self.home_catalog_id = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_DRAG_DIVISOR)? {
            self.drag_divisor = v;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HORIZON_MINUTES).contains(&self.prediction_horizon_minutes) {
            return Err(TrackerError::Config(format!(
                "prediction_horizon_minutes must be between 1 and {}, got {}",
                MAX_HORIZON_MINUTES, self.prediction_horizon_minutes
            )));
        }
        if self.speed_markers.is_empty() {
            return Err(TrackerError::Config("speed_markers is empty".into()));
        }
        if let Some(bad) = self.speed_markers.iter().find(|m| !m.multiplier.is_finite()) {
            return Err(TrackerError::Config(format!(
                "speed marker {:?} has non-finite multiplier",
                bad.label
            )));
        }
        if !self.drag_divisor.is_finite() || self.drag_divisor == 0.0 {
            return Err(TrackerError::Config(format!(
                "drag_divisor must be finite and non-zero, got {}",
                self.drag_divisor
            )));
        }
        if !self.debug_time_warp.is_finite() {
            return Err(TrackerError::Config("debug_time_warp must be finite".into()));
        }
        if !(self.sun_distance_m.is_finite() && self.sun_distance_m > 0.0) {
            return Err(TrackerError::Config("sun_distance_m must be positive".into()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TrackerError::Config(format!("{}={:?} is not a valid value", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.prediction_horizon_minutes, 92);
        assert_eq!(config.home_catalog_id, 25544);
        assert_eq!(config.drag_divisor, 2.0);
        assert_eq!(config.speed_markers.len(), 6);
        assert_eq!(config.speed_markers[0].multiplier, -150.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = TrackerConfig::default()
            .with_overrides_from(lookup(&[
                (ENV_HORIZON_MINUTES, "120"),
                (ENV_HOME_ID, " 48209 "),
                (ENV_DRAG_DIVISOR, "4.5"),
            ]))
            .unwrap();
        assert_eq!(config.prediction_horizon_minutes, 120);
        assert_eq!(config.home_catalog_id, 48209);
        assert_eq!(config.drag_divisor, 4.5);
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let result =
            TrackerConfig::default().with_overrides_from(lookup(&[(ENV_HORIZON_MINUTES, "lots")]));
        assert!(matches!(result, Err(TrackerError::Config(_))));

        let result = TrackerConfig::default()
            .with_overrides_from(lookup(&[(ENV_HORIZON_MINUTES, "4000000000")]));
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(TrackerConfig::new().prediction_horizon_minutes(0).validate().is_err());
        assert!(TrackerConfig::new()
            .prediction_horizon_minutes(MAX_HORIZON_MINUTES + 1)
            .validate()
            .is_err());
        assert!(TrackerConfig::new()
            .prediction_horizon_minutes(MAX_HORIZON_MINUTES)
            .validate()
            .is_ok());
        assert!(TrackerConfig::new().speed_markers(vec![]).validate().is_err());
        assert!(TrackerConfig::new().drag_divisor(0.0).validate().is_err());
        assert!(TrackerConfig::new().drag_divisor(f64::NAN).validate().is_err());
        assert!(TrackerConfig::new()
            .speed_markers(vec![SpeedMarker::new("broken", f64::INFINITY)])
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "prediction_horizon_minutes": 45, "debug_time_warp": 60.0 }}"#).unwrap();

        let config = TrackerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.prediction_horizon_minutes, 45);
        assert_eq!(config.debug_time_warp, 60.0);
        assert_eq!(config.home_catalog_id, DEFAULT_HOME_CATALOG_ID);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            TrackerConfig::from_file("/nonexistent/tracker.json"),
            Err(TrackerError::Io(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            TrackerConfig::from_file(file.path()),
            Err(TrackerError::Json(_))
        ));
    }
}
