//! Orbital Mechanics Library
//!
//! SGP4 propagation, coordinate transforms and a low-precision Sun/Moon
//! ephemeris for the ISS tracker.
//!
//! # Frames
//!
//! | Frame | Origin | Axes | Units |
//! |-------|--------|------|-------|
//! | TEME (propagator output) | Earth center | Z = pole, X = mean equinox | km, km/s |
//! | Geodetic | ellipsoid | latitude, longitude, height | deg, deg, km |
//! | Scene | Earth center | Y = pole, X/Z = equator (longitude + 90°) | m |

use thiserror::Error;

pub mod celestial;
pub mod elements;
pub mod propagation;
pub mod scene;
pub mod state;
pub mod transforms;

pub use celestial::{
    moon_position, moon_scene_vector, solar_array_rotation, sun_position, sun_scene_vector,
    MoonPosition, SunPosition, SUN_DISTANCE_M,
};
pub use elements::OrbitalElementSet;
pub use propagation::{state_at, Propagator, Sgp4Propagator, StateVector};
pub use scene::{
    euler_xyz, from_scene_vector, heading_from, to_scene_vector, Orientation, SceneVector,
    EARTH_RADIUS_M,
};
pub use state::SatelliteState;
pub use transforms::GeodeticPosition;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Invalid TLE format: {0}")]
    InvalidTle(String),
    #[error("Propagation failed: {0}")]
    PropagationFailed(String),
    #[error("Orbit of {catalog_id} decayed {minutes_since_epoch:.1} min after epoch")]
    DecayedOrbit {
        catalog_id: u32,
        minutes_since_epoch: f64,
    },
}

pub type Result<T> = std::result::Result<T, OrbitalError>;
