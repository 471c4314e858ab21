//! Low-precision Sun and Moon ephemeris
//!
//! | Body | Model | Precision |
//! |------|-------|-----------|
//! | Sun  | mean longitude + equation of centre, obliquity drift | arc-minutes |
//! | Moon | mean longitude, anomaly and node terms | about a degree |
//!
//! Both bodies are reduced to a sub-body ground point (latitude/longitude as
//! if the body were directly overhead) so they share the scene mapping used
//! for satellites.

use std::f64::consts::{FRAC_PI_2, PI};

use chrono::{DateTime, Utc};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::scene::{euler_xyz, to_scene_vector, Orientation, SceneVector, EARTH_RADIUS_M};
use crate::state::SatelliteState;

/// Render distance of the Sun from Earth's centre
pub const SUN_DISTANCE_M: f64 = 151_840_000_000.0;

/// 2000-01-01T12:00:00Z in Unix milliseconds
const J2000_UNIX_MS: f64 = 946_728_000_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_CENTURY: f64 = MS_PER_DAY * 36_525.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const TWO_PI: f64 = 2.0 * PI;

/// Mean obliquity used for the lunar ecliptic-to-equatorial step
const LUNAR_OBLIQUITY_DEG: f64 = 23.4397;

/// Radius of the virtual sphere the Sun is placed on for array tracking
const ARRAY_SUN_RADIUS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// Apparent ecliptic longitude, degrees in [0, 360)
    pub ecliptic_longitude: f64,
    /// Right ascension, radians in (-π, π]
    pub right_ascension: f64,
    /// Sub-solar latitude (= declination), degrees
    pub latitude: f64,
    /// Sub-solar longitude, degrees in [-180, 180)
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPosition {
    /// Geocentric ecliptic longitude, degrees in [0, 360)
    pub ecliptic_longitude: f64,
    /// Geocentric ecliptic latitude, degrees
    pub ecliptic_latitude: f64,
    /// Sub-lunar latitude (= declination), degrees
    pub latitude: f64,
    /// Sub-lunar longitude, degrees in [-180, 180)
    pub longitude: f64,
    /// Distance from Earth's centre in metres
    pub distance_m: f64,
}

fn millis(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64
}

/// Angle reduced to [0, 2π)
fn rev(angle: f64) -> f64 {
    angle - (angle / TWO_PI).floor() * TWO_PI
}

/// Fractional part in [0, 1)
fn fraction(value: f64) -> f64 {
    value - value.floor()
}

fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Sidereal angle of the ephemeris, in radians.
///
/// GMST at 0h UT from the cubic polynomial in Julian centuries, plus the
/// elapsed UT of the day at the sidereal rate of one turn per 24h.
fn sidereal_angle(at: DateTime<Utc>) -> f64 {
    let ms = millis(at);
    let t = (ms - J2000_UNIX_MS) / MS_PER_CENTURY;

    let gmst0_deg = 100.460_618_37
        + 36_000.770_053_608 * t
        + 3.879_33e-4 * t * t
        + t * t * t / 38_710_000.0;

    let ut_ms = ms.rem_euclid(MS_PER_DAY);
    let ut = ut_ms / 3_600_000.0 / 12.0 * PI;

    rev(rev(gmst0_deg.to_radians()) + ut)
}

pub fn sun_position(at: DateTime<Utc>) -> SunPosition {
    let n = (millis(at) - J2000_UNIX_MS) / MS_PER_DAY;

    let mean_longitude = 280.460 + 0.985_647_4 * n;
    let mean_anomaly = (357.528 + 0.985_600_3 * n).to_radians();
    let lambda_deg =
        mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin();
    let lambda = lambda_deg.to_radians();

    let obliquity = (23.4393 - 3.563e-7 * n).to_radians();

    let right_ascension = (obliquity.cos() * lambda.sin()).atan2(lambda.cos());
    let declination = (obliquity.sin() * lambda.sin()).asin();

    SunPosition {
        ecliptic_longitude: lambda_deg.rem_euclid(360.0),
        right_ascension,
        latitude: declination.to_degrees(),
        longitude: wrap_degrees((right_ascension - sidereal_angle(at)).to_degrees()),
    }
}

/// Sun placed at `distance_m` above its sub-solar point.
pub fn sun_scene_vector(at: DateTime<Utc>, distance_m: f64) -> SceneVector {
    let sun = sun_position(at);
    to_scene_vector(sun.latitude, sun.longitude, distance_m)
}

pub fn moon_position(at: DateTime<Utc>) -> MoonPosition {
    let jd = millis(at) / MS_PER_DAY + UNIX_EPOCH_JD;

    // Age (synodic phase), anomaly, node and mean longitude
    let phase = TWO_PI * fraction((jd - 2_451_550.1) / 29.530_588_853);
    let anomaly = TWO_PI * fraction((jd - 2_451_562.2) / 27.554_549_88);
    let node = TWO_PI * fraction((jd - 2_451_565.2) / 27.212_220_817);
    let sidereal = fraction((jd - 2_451_555.8) / 27.321_582_241);

    let distance_er = 60.4
        - 3.3 * anomaly.cos()
        - 0.6 * (2.0 * phase - anomaly).cos()
        - 0.5 * (2.0 * phase).cos();

    let ecliptic_latitude = 5.1 * node.sin();
    let ecliptic_longitude = 360.0 * sidereal
        + 6.3 * anomaly.sin()
        + 1.3 * (2.0 * phase - anomaly).sin()
        + 0.7 * (2.0 * phase).sin();

    let (right_ascension, declination) =
        ecliptic_to_equatorial(ecliptic_longitude.to_radians(), ecliptic_latitude.to_radians());

    MoonPosition {
        ecliptic_longitude: ecliptic_longitude.rem_euclid(360.0),
        ecliptic_latitude,
        latitude: declination.to_degrees(),
        longitude: wrap_degrees((right_ascension - sidereal_angle(at)).to_degrees()),
        distance_m: distance_er * EARTH_RADIUS_M,
    }
}

/// Moon placed at its modelled distance above its sub-lunar point.
pub fn moon_scene_vector(at: DateTime<Utc>) -> SceneVector {
    let moon = moon_position(at);
    to_scene_vector(moon.latitude, moon.longitude, moon.distance_m)
}

fn ecliptic_to_equatorial(lambda: f64, beta: f64) -> (f64, f64) {
    let e = LUNAR_OBLIQUITY_DEG.to_radians();
    let ra = (lambda.sin() * e.cos() - beta.tan() * e.sin()).atan2(lambda.cos());
    let dec = (beta.sin() * e.cos() + beta.cos() * e.sin() * lambda.sin()).asin();
    (ra, dec)
}

/// Unit direction for a yaw/pitch pair in degrees, yaw measured from -Z.
fn direction_from_yaw_pitch(yaw_deg: f64, pitch_deg: f64) -> Vector3<f64> {
    let (sin_p, cos_p) = pitch_deg.to_radians().sin_cos();
    let (sin_y, cos_y) = yaw_deg.to_radians().sin_cos();
    Vector3::new(-cos_p * sin_y, sin_p, -cos_p * cos_y)
}

/// Yaw/pitch look vector from the origin towards `target`.
fn look_vector(target: &Vector3<f64>) -> Vector3<f64> {
    let distance_xz = (target.x * target.x + target.z * target.z).sqrt();
    let distance = (distance_xz * distance_xz + target.y * target.y).sqrt();

    let mut yaw = (target.x / distance_xz).acos().to_degrees();
    let pitch = (target.y / distance).acos().to_degrees() - 90.0;

    if target.z < 0.0 {
        yaw += (180.0 - yaw).abs() * 2.0;
    }

    direction_from_yaw_pitch(yaw - 90.0, pitch)
}

/// Orientation of a sun-tracking solar array mounted on a body in `state`.
///
/// The Sun is expressed in the body's local frame (Earth rotated so the body
/// sits on top), then turned into a look vector. Two-axis arrays pitch and
/// roll, single-axis arrays only rotate about X. Crashed bodies and other
/// degenerate geometry give the identity.
pub fn solar_array_rotation(
    at: DateTime<Utc>,
    state: &SatelliteState,
    two_axis_tracking: bool,
) -> Orientation {
    if state.is_crashed() {
        return Orientation::identity();
    }

    let sun = sun_position(at);
    let sun_local = to_scene_vector(
        sun.latitude,
        sun.longitude - state.longitude() + 90.0,
        ARRAY_SUN_RADIUS,
    );

    let earth_tilt =
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), (90.0 - state.latitude()).to_radians());
    let sun_local = earth_tilt * sun_local.to_vector3();

    let look = look_vector(&sun_local);
    if !look.iter().all(|c| c.is_finite()) {
        return Orientation::identity();
    }

    if two_axis_tracking {
        euler_xyz(-look.x - FRAC_PI_2, -look.z, 0.0)
    } else {
        euler_xyz(-look.x, 0.0, 0.0)
    }
}
