//! Scene-space coordinates
//!
//! The renderer works in a Y-up Cartesian frame centred on Earth. Geodetic
//! longitude is shifted by +90° so that longitude 0 lies on +X.
//!
//! ```text
//! colatitude = 90° - latitude
//! x = sin(colatitude) · sin(longitude + 90°) · r
//! y = cos(colatitude) · r
//! z = sin(colatitude) · cos(longitude + 90°) · r
//! ```

use std::ops::{Add, Sub};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// WGS-84 equatorial radius in metres
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Offset between the element-set longitude and the scene's forward axis
pub const LONGITUDE_OFFSET_DEG: f64 = 90.0;

/// Below this separation (m) two scene points count as the same point.
const DEGENERATE_EPSILON: f64 = 1e-9;

pub type Orientation = UnitQuaternion<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SceneVector {
    pub const ORIGIN: SceneVector = SceneVector { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        self.to_vector3().norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn distance_to(&self, other: &SceneVector) -> f64 {
        (*other - *self).length()
    }

    pub fn to_vector3(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for SceneVector {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<SceneVector> for Vector3<f64> {
    fn from(v: SceneVector) -> Self {
        v.to_vector3()
    }
}

impl Add for SceneVector {
    type Output = SceneVector;

    fn add(self, rhs: SceneVector) -> SceneVector {
        SceneVector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for SceneVector {
    type Output = SceneVector;

    fn sub(self, rhs: SceneVector) -> SceneVector {
        SceneVector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Map latitude/longitude in degrees and a radius to scene space.
/// NaN inputs give a NaN vector.
pub fn to_scene_vector(latitude_deg: f64, longitude_deg: f64, radius: f64) -> SceneVector {
    let colatitude = (90.0 - latitude_deg).to_radians();
    let longitude = (longitude_deg + LONGITUDE_OFFSET_DEG).to_radians();

    SceneVector {
        x: colatitude.sin() * longitude.sin() * radius,
        y: colatitude.cos() * radius,
        z: colatitude.sin() * longitude.cos() * radius,
    }
}

/// Inverse of [`to_scene_vector`]: (latitude°, longitude° in (-180, 180], radius).
pub fn from_scene_vector(v: &SceneVector) -> (f64, f64, f64) {
    let radius = v.length();
    if radius == 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let colatitude = (v.y / radius).clamp(-1.0, 1.0).acos();
    let latitude = 90.0 - colatitude.to_degrees();

    let mut longitude = v.x.atan2(v.z).to_degrees() - LONGITUDE_OFFSET_DEG;
    if longitude <= -180.0 {
        longitude += 360.0;
    }

    (latitude, longitude, radius)
}

/// Orientation of a body at `current` heading towards `next`, with the local
/// vertical as up. Local +Z faces the direction of travel.
///
/// Falls back to the identity when the two points coincide, when travel is
/// parallel to the vertical, or when either input is not finite.
pub fn heading_from(current: &SceneVector, next: &SceneVector) -> Orientation {
    if !current.is_finite() || !next.is_finite() {
        return Orientation::identity();
    }

    let up = current.to_vector3();
    let dir = next.to_vector3() - up;
    let dir_norm = dir.norm();
    let up_norm = up.norm();

    if dir_norm <= DEGENERATE_EPSILON || up_norm <= DEGENERATE_EPSILON {
        return Orientation::identity();
    }
    if dir.cross(&up).norm() <= DEGENERATE_EPSILON * dir_norm * up_norm {
        return Orientation::identity();
    }

    UnitQuaternion::face_towards(&dir, &up)
}

/// Rotation from Euler angles in radians applied in X, Y, Z order
/// (matrix `Rx · Ry · Rz`).
pub fn euler_xyz(x: f64, y: f64, z: f64) -> Orientation {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x)
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z)
}
