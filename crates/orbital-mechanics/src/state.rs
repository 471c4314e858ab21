//! Geodetic satellite state at one instant

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::propagation::StateVector;
use crate::scene::{to_scene_vector, SceneVector, EARTH_RADIUS_M};

/// Latitude/longitude in degrees, altitude in km above the ellipsoid and
/// inertial velocity in km/s.
///
/// A state whose latitude or longitude is NaN is *crashed*: the model had no
/// answer for that instant. Crashed states carry NaN position and a zero
/// velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteState {
    at: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    altitude_km: f64,
    velocity: Vector3<f64>,
}

impl SatelliteState {
    pub fn new(
        at: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        altitude_km: f64,
        velocity: Vector3<f64>,
    ) -> Self {
        Self {
            at,
            latitude,
            longitude,
            altitude_km,
            velocity,
        }
    }

    pub fn crashed_at(at: DateTime<Utc>) -> Self {
        Self::new(at, f64::NAN, f64::NAN, f64::NAN, Vector3::zeros())
    }

    /// Geodetic state from an inertial state vector. A vector that does not
    /// convert to a finite position yields a crashed state.
    pub fn from_state_vector(vector: &StateVector) -> Self {
        let geodetic = vector.to_geodetic();
        if !geodetic.is_finite() {
            return Self::crashed_at(vector.epoch);
        }

        Self::new(
            vector.epoch,
            geodetic.latitude,
            geodetic.longitude,
            geodetic.altitude_km,
            vector.velocity(),
        )
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude_km(&self) -> f64 {
        self.altitude_km
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    pub fn is_crashed(&self) -> bool {
        self.latitude.is_nan() || self.longitude.is_nan()
    }

    /// Scene radius: mean equatorial radius plus altitude.
    pub fn distance_to_earth_center_m(&self) -> f64 {
        EARTH_RADIUS_M + self.altitude_km * 1000.0
    }

    pub fn speed_kmh(&self) -> f64 {
        self.velocity.norm() * 3600.0
    }

    pub fn scene_vector(&self) -> SceneVector {
        to_scene_vector(self.latitude, self.longitude, self.distance_to_earth_center_m())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use fuzz_harness::prelude::*;

    proptest! {
        #[test]
        fn fuzz_scene_radius_tracks_altitude(
            lat in latitude_deg(),
            lon in longitude_deg(),
            alt in altitude_km(),
        ) {
            let state = SatelliteState::new(Utc::now(), lat, lon, alt, Vector3::zeros());
            let radius = EARTH_RADIUS_M + alt * 1000.0;

            prop_assert!(!state.is_crashed());
            prop_assert_eq!(state.distance_to_earth_center_m(), radius);
            prop_assert!((state.scene_vector().length() - radius).abs() / radius < 1e-9);
        }
    }
}
