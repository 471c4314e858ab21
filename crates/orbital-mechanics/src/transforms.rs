//! Inertial / geodetic conversion

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// WGS-84 semi-major axis
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
/// Semi-minor axis used by the geodetic solver
pub const EARTH_POLAR_RADIUS_KM: f64 = 6356.7523142;

const GEODETIC_MAX_ITERATIONS: usize = 20;
const TWO_PI: f64 = 2.0 * PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

impl GeodeticPosition {
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.altitude_km.is_finite()
    }
}

fn flattening() -> f64 {
    (EARTH_EQUATORIAL_RADIUS_KM - EARTH_POLAR_RADIUS_KM) / EARTH_EQUATORIAL_RADIUS_KM
}

fn eccentricity_squared() -> f64 {
    let f = flattening();
    2.0 * f - f * f
}

fn julian_date(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + 2_440_587.5
}

/// Greenwich mean sidereal time (IAU-82) in radians, normalised to [0, 2π).
pub fn gmst(at: DateTime<Utc>) -> f64 {
    // Julian centuries from J2000.0
    let t = (julian_date(at) - 2_451_545.0) / 36_525.0;

    // GMST in seconds
    let gmst_sec = 67_310.548_41
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * t
        + 0.093_104 * t * t
        - 6.2e-6 * t * t * t;

    (gmst_sec / 240.0).to_radians().rem_euclid(TWO_PI)
}

/// Wrap an angle in radians to [-π, π].
fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TWO_PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Convert an inertial (TEME) position in km to geodetic degrees/km, given the
/// sidereal angle of the same instant.
pub fn eci_to_geodetic(x: f64, y: f64, z: f64, gmst_rad: f64) -> GeodeticPosition {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let e2 = eccentricity_squared();
    let r = (x * x + y * y).sqrt();

    let longitude = wrap_pi(y.atan2(x) - gmst_rad);

    let mut latitude = z.atan2(r);
    let mut c = 1.0;
    for _ in 0..GEODETIC_MAX_ITERATIONS {
        c = 1.0 / (1.0 - e2 * latitude.sin().powi(2)).sqrt();
        latitude = (z + a * c * e2 * latitude.sin()).atan2(r);
    }
    let altitude_km = r / latitude.cos() - a * c;

    GeodeticPosition {
        latitude: latitude.to_degrees(),
        longitude: longitude.to_degrees(),
        altitude_km,
    }
}

/// Geodetic degrees/km to Earth-fixed Cartesian km.
pub fn geodetic_to_ecef(pos: &GeodeticPosition) -> (f64, f64, f64) {
    let lat = pos.latitude.to_radians();
    let lon = pos.longitude.to_radians();
    let alt = pos.altitude_km;
    let e2 = eccentricity_squared();

    // Radius of curvature in prime vertical
    let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();

    let x = (n + alt) * lat.cos() * lon.cos();
    let y = (n + alt) * lat.cos() * lon.sin();
    let z = (n * (1.0 - e2) + alt) * lat.sin();

    (x, y, z)
}

/// Rotate Earth-fixed coordinates into the inertial frame by the sidereal angle.
pub fn ecef_to_eci(ecef: (f64, f64, f64), gmst_rad: f64) -> (f64, f64, f64) {
    let (x, y, z) = ecef;
    let (sin_g, cos_g) = gmst_rad.sin_cos();
    (cos_g * x - sin_g * y, sin_g * x + cos_g * y, z)
}
