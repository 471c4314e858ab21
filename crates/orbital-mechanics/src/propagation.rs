//! Propagation of element sets to inertial state vectors

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::elements::OrbitalElementSet;
use crate::state::SatelliteState;
use crate::transforms::{self, GeodeticPosition};
use crate::{OrbitalError, Result};

/// Inertial (TEME) position in km and velocity in km/s at `epoch`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateVector {
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,
    pub epoch: DateTime<Utc>,
}

impl StateVector {
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.position_x, self.position_y, self.position_z)
    }

    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.velocity_x, self.velocity_y, self.velocity_z)
    }

    pub fn is_finite(&self) -> bool {
        self.position().iter().chain(self.velocity().iter()).all(|c| c.is_finite())
    }

    /// Sub-satellite point and height at `epoch`.
    pub fn to_geodetic(&self) -> GeodeticPosition {
        transforms::eci_to_geodetic(
            self.position_x,
            self.position_y,
            self.position_z,
            transforms::gmst(self.epoch),
        )
    }
}

/// Turns an element set and an instant into an inertial state.
///
/// Implementations must be pure: the same set and instant always give the
/// same answer. An instant the model cannot represent (the object has
/// re-entered) is reported as [`OrbitalError::DecayedOrbit`].
pub trait Propagator {
    fn propagate(&self, elements: &OrbitalElementSet, at: DateTime<Utc>) -> Result<StateVector>;
}

/// Simplified general perturbations (SGP4/SDP4) via the `sgp4` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator;

impl Propagator for Sgp4Propagator {
    fn propagate(&self, elements: &OrbitalElementSet, at: DateTime<Utc>) -> Result<StateVector> {
        let minutes_since_epoch = elements.minutes_since_epoch(at);

        let prediction = elements
            .constants()
            .propagate(minutes_since_epoch)
            .map_err(|e| {
                trace!(catalog_id = elements.catalog_id(), error = ?e, "sgp4 rejected instant");
                OrbitalError::DecayedOrbit {
                    catalog_id: elements.catalog_id(),
                    minutes_since_epoch,
                }
            })?;

        let state = StateVector {
            position_x: prediction.position[0],
            position_y: prediction.position[1],
            position_z: prediction.position[2],
            velocity_x: prediction.velocity[0],
            velocity_y: prediction.velocity[1],
            velocity_z: prediction.velocity[2],
            epoch: at,
        };

        if !state.is_finite() {
            return Err(OrbitalError::DecayedOrbit {
                catalog_id: elements.catalog_id(),
                minutes_since_epoch,
            });
        }

        Ok(state)
    }
}

impl<P: Propagator + ?Sized> Propagator for &P {
    fn propagate(&self, elements: &OrbitalElementSet, at: DateTime<Utc>) -> Result<StateVector> {
        (**self).propagate(elements, at)
    }
}

/// Geodetic state of `elements` at `at`. Propagation failures never escape:
/// they come back as a crashed state.
pub fn state_at<P: Propagator + ?Sized>(
    propagator: &P,
    elements: &OrbitalElementSet,
    at: DateTime<Utc>,
) -> SatelliteState {
    match propagator.propagate(elements, at) {
        Ok(vector) => SatelliteState::from_state_vector(&vector),
        Err(e) => {
            trace!(catalog_id = elements.catalog_id(), error = %e, "state unavailable, crashed");
            SatelliteState::crashed_at(at)
        }
    }
}
