//! Satellite nodes
//!
//! A [`RootNode`] owns an element set and is propagated on its own. Its
//! [`DockedNode`]s never propagate: their pose is the root's pose composed with
//! a local transform that is either a fixed [`Port`] or recomputed every frame
//! by an [`AnimationHook`].
//!
//! ```text
//! world position    = root position + root orientation · local offset
//! world orientation = root orientation · local rotation
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;
use orbital_mechanics::{
    euler_xyz, heading_from, state_at, OrbitalElementSet, Orientation, Propagator,
    SatelliteState, SceneVector,
};
use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Heading is sampled this far ahead of the pose instant.
pub const LOOKAHEAD_SECONDS: i64 = 60;

/// Local offset (model units = metres) and rotation relative to a parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub offset: Vector3<f64>,
    pub rotation: Orientation,
}

impl Transform {
    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), Orientation::identity())
    }

    pub fn new(offset: Vector3<f64>, rotation: Orientation) -> Self {
        Self { offset, rotation }
    }

    /// Offset plus Euler angles in degrees, applied X then Y then Z.
    pub fn from_degrees(offset: [f64; 3], rotation_deg: [f64; 3]) -> Self {
        let [rx, ry, rz] = rotation_deg;
        Self::new(
            Vector3::from(offset),
            euler_xyz(rx.to_radians(), ry.to_radians(), rz.to_radians()),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A named docking location on a parent body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub name: String,
    pub transform: Transform,
}

impl Port {
    pub fn new(name: impl Into<String>, offset: [f64; 3], rotation_deg: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            transform: Transform::from_degrees(offset, rotation_deg),
        }
    }
}

/// Per-frame local transform of a docked node, from the node itself, the
/// simulated instant and the parent's pose at that instant.
pub type AnimationHook = Arc<dyn Fn(&DockedNode, DateTime<Utc>, &Pose) -> Transform + Send + Sync>;

#[derive(Clone)]
pub enum Mount {
    Fixed(Port),
    Animated(AnimationHook),
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mount::Fixed(port) => f.debug_tuple("Fixed").field(&port.name).finish(),
            Mount::Animated(_) => f.write_str("Animated"),
        }
    }
}

/// Request to attach a docked node to a root.
#[derive(Debug, Clone)]
pub struct DockingSpec {
    pub catalog_id: u32,
    pub name: String,
    pub asset: Option<String>,
    pub mount: Mount,
}

impl DockingSpec {
    pub fn fixed(catalog_id: u32, name: impl Into<String>, port: Port) -> Self {
        Self {
            catalog_id,
            name: name.into(),
            asset: None,
            mount: Mount::Fixed(port),
        }
    }

    pub fn animated(catalog_id: u32, name: impl Into<String>, hook: AnimationHook) -> Self {
        Self {
            catalog_id,
            name: name.into(),
            asset: None,
            mount: Mount::Animated(hook),
        }
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct DockedNode {
    catalog_id: u32,
    name: String,
    asset: Option<String>,
    mount: Mount,
}

impl DockedNode {
    pub fn catalog_id(&self) -> u32 {
        self.catalog_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asset(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    pub fn mount(&self) -> &Mount {
        &self.mount
    }

    /// The port's transform, or whatever the hook returns for this frame.
    pub fn local_transform(&self, at: DateTime<Utc>, parent: &Pose) -> Transform {
        match &self.mount {
            Mount::Fixed(port) => port.transform,
            Mount::Animated(hook) => hook(self, at, parent),
        }
    }

    pub fn pose_at(&self, at: DateTime<Utc>, parent: &Pose) -> DockedPose {
        parent.compose(&self.local_transform(at, parent))
    }
}

impl From<DockingSpec> for DockedNode {
    fn from(spec: DockingSpec) -> Self {
        Self {
            catalog_id: spec.catalog_id,
            name: spec.name,
            asset: spec.asset,
            mount: spec.mount,
        }
    }
}

/// Where a root node is, which way it faces and the state both came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub state: SatelliteState,
    pub position: SceneVector,
    pub orientation: Orientation,
}

impl Pose {
    pub fn compose(&self, local: &Transform) -> DockedPose {
        let offset = self.orientation * local.offset;
        DockedPose {
            position: self.position + SceneVector::from(offset),
            orientation: self.orientation * local.rotation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DockedPose {
    pub position: SceneVector,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeLifecycle {
    /// Created, model asset not loaded yet
    Unpropagated,
    /// Loaded and drawn every frame
    Active,
    /// Taken out of the session
    Removed,
}

#[derive(Debug, Clone)]
pub struct RootNode {
    elements: OrbitalElementSet,
    asset: Option<String>,
    docked: Vec<DockedNode>,
    lifecycle: NodeLifecycle,
}

impl RootNode {
    pub fn new(elements: OrbitalElementSet) -> Self {
        Self {
            elements,
            asset: None,
            docked: Vec::new(),
            lifecycle: NodeLifecycle::Unpropagated,
        }
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn dock(&mut self, spec: DockingSpec) -> &mut Self {
        self.docked.push(spec.into());
        self
    }

    pub fn id(&self) -> NodeId {
        self.elements.catalog_id()
    }

    pub fn name(&self) -> &str {
        self.elements.name()
    }

    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    pub fn asset(&self) -> Option<&str> {
        self.asset.as_deref()
    }

    pub fn docked(&self) -> &[DockedNode] {
        &self.docked
    }

    pub fn lifecycle(&self) -> NodeLifecycle {
        self.lifecycle
    }

    pub fn is_loaded(&self) -> bool {
        self.lifecycle == NodeLifecycle::Active
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: NodeLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub fn state_at<P: Propagator + ?Sized>(
        &self,
        propagator: &P,
        at: DateTime<Utc>,
    ) -> SatelliteState {
        state_at(propagator, &self.elements, at)
    }

    /// State `offset` after `at`; crashed when that instant is past the end
    /// of the calendar.
    fn state_after<P: Propagator + ?Sized>(
        &self,
        propagator: &P,
        at: DateTime<Utc>,
        offset: Duration,
    ) -> SatelliteState {
        match at.checked_add_signed(offset) {
            Some(later) => self.state_at(propagator, later),
            None => SatelliteState::crashed_at(at),
        }
    }

    /// State at `at`, its scene position and the heading towards the
    /// position one lookahead later.
    pub fn pose_at<P: Propagator + ?Sized>(&self, propagator: &P, at: DateTime<Utc>) -> Pose {
        let state = self.state_at(propagator, at);
        let ahead = self.state_after(propagator, at, Duration::seconds(LOOKAHEAD_SECONDS));

        let position = state.scene_vector();
        let orientation = heading_from(&position, &ahead.scene_vector());

        Pose {
            state,
            position,
            orientation,
        }
    }

    /// Scene positions at `at`, `at + 1 min`, ... `at + horizon min`
    /// (`horizon + 1` points). Crashed instants give NaN points.
    pub fn prediction_path<P: Propagator + ?Sized>(
        &self,
        propagator: &P,
        at: DateTime<Utc>,
        horizon_minutes: u32,
    ) -> Vec<SceneVector> {
        (0..=i64::from(horizon_minutes))
            .map(|minute| {
                self.state_after(propagator, at, Duration::minutes(minute))
                    .scene_vector()
            })
            .collect()
    }

    /// World pose of every docked node, in docking order.
    pub fn docked_poses(&self, at: DateTime<Utc>, pose: &Pose) -> Vec<DockedPose> {
        self.docked.iter().map(|node| node.pose_at(at, pose)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fuzz_harness::fixtures::{ISS_LINE1, ISS_LINE2, ISS_NAME};
    use orbital_mechanics::{OrbitalError, Sgp4Propagator, StateVector};

    fn iss_node() -> RootNode {
        RootNode::new(OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap())
    }

    fn epoch() -> DateTime<Utc> {
        iss_node().elements().epoch()
    }

    /// Decays everything after `cutoff`.
    struct DecaysAfter(DateTime<Utc>);

    impl Propagator for DecaysAfter {
        fn propagate(
            &self,
            elements: &OrbitalElementSet,
            at: DateTime<Utc>,
        ) -> orbital_mechanics::Result<StateVector> {
            if at > self.0 {
                Err(OrbitalError::DecayedOrbit {
                    catalog_id: elements.catalog_id(),
                    minutes_since_epoch: elements.minutes_since_epoch(at),
                })
            } else {
                Sgp4Propagator.propagate(elements, at)
            }
        }
    }

    #[test]
    fn test_new_node_is_unpropagated() {
        let node = iss_node();
        assert_eq!(node.id(), 25544);
        assert_eq!(node.name(), "ISS (ZARYA)");
        assert_eq!(node.lifecycle(), NodeLifecycle::Unpropagated);
        assert!(!node.is_loaded());
    }

    #[test]
    fn test_pose_faces_lookahead_position() {
        let node = iss_node();
        let at = epoch() + Duration::minutes(17);
        let pose = node.pose_at(&Sgp4Propagator, at);

        let ahead = node
            .state_at(&Sgp4Propagator, at + Duration::seconds(LOOKAHEAD_SECONDS))
            .scene_vector();
        let expected = (ahead.to_vector3() - pose.position.to_vector3()).normalize();
        let forward = pose.orientation * Vector3::z();
        assert!((forward - expected).norm() < 1e-9);

        // ~460 km of travel in a minute
        let travelled = pose.position.distance_to(&ahead);
        assert!(travelled > 400_000.0 && travelled < 500_000.0, "{}", travelled);
    }

    #[test]
    fn test_prediction_path_length_and_order() {
        let node = iss_node();
        let at = epoch() + Duration::hours(3);
        let path = node.prediction_path(&Sgp4Propagator, at, 92);

        assert_eq!(path.len(), 93);
        assert_eq!(path[0], node.state_at(&Sgp4Propagator, at).scene_vector());
        assert_eq!(
            path[92],
            node.state_at(&Sgp4Propagator, at + Duration::minutes(92)).scene_vector()
        );
        for pair in path.windows(2) {
            let step = pair[0].distance_to(&pair[1]);
            assert!(step > 400_000.0 && step < 500_000.0, "step {}", step);
        }
    }

    #[test]
    fn test_prediction_path_is_idempotent() {
        let node = iss_node();
        let at = epoch() + Duration::minutes(5);
        let a = node.prediction_path(&Sgp4Propagator, at, 92);
        let b = node.prediction_path(&Sgp4Propagator, at, 92);
        assert_eq!(a, b);
    }

    #[test]
    fn test_prediction_path_crashes_after_decay() {
        let node = iss_node();
        let at = epoch();
        let propagator = DecaysAfter(at + Duration::minutes(30));
        let path = node.prediction_path(&propagator, at, 92);

        assert_eq!(path.len(), 93);
        assert!(path[..=30].iter().all(|p| p.is_finite()));
        assert!(path[31..].iter().all(|p| !p.is_finite()));
    }

    #[test]
    fn test_crashed_pose_has_identity_heading() {
        let node = iss_node();
        let at = epoch();
        let pose = node.pose_at(&DecaysAfter(at - Duration::minutes(1)), at);
        assert!(pose.state.is_crashed());
        assert_eq!(pose.orientation, Orientation::identity());
    }

    #[test]
    fn test_end_of_calendar_crashes_instead_of_overflowing() {
        let node = iss_node();
        let at = DateTime::<Utc>::MAX_UTC;

        let pose = node.pose_at(&Sgp4Propagator, at);
        assert_eq!(pose.orientation, Orientation::identity());

        let path = node.prediction_path(&Sgp4Propagator, at, 92);
        assert_eq!(path.len(), 93);
        assert!(path[1..].iter().all(|p| !p.is_finite()));
    }

    #[test]
    fn test_fixed_port_follows_parent() {
        let mut node = iss_node();
        node.dock(DockingSpec::fixed(
            25544,
            "Solar Rod",
            Port::new("rod", [0.0, 5.0, 5.0], [0.0, 0.0, 0.0]),
        ));

        for minutes in [0, 13, 47, 200, 1440] {
            let at = epoch() + Duration::minutes(minutes);
            let pose = node.pose_at(&Sgp4Propagator, at);
            let docked = node.docked_poses(at, &pose);
            assert_eq!(docked.len(), 1);

            let expected = pose.orientation * Vector3::new(0.0, 5.0, 5.0);
            let actual = docked[0].position.to_vector3() - pose.position.to_vector3();
            // Positions are ~6.8e6 m, so absolute error is a few nanometres at best
            assert!((actual - expected).norm() < 1e-6, "minute {}", minutes);
            assert!(docked[0].orientation.angle_to(&pose.orientation) < 1e-12);
        }
    }

    #[test]
    fn test_port_rotation_composes_with_parent() {
        let pose = Pose {
            state: SatelliteState::new(epoch(), 0.0, 0.0, 400.0, Vector3::zeros()),
            position: SceneVector::new(10.0, 0.0, 0.0),
            orientation: euler_xyz(0.0, std::f64::consts::FRAC_PI_2, 0.0),
        };
        let port = Port::new("tilted", [0.0, 0.0, 2.0], [0.0, 0.0, 180.0]);
        let docked = pose.compose(&port.transform);

        // Parent yaw of 90° turns local +Z into world +X
        assert!((docked.position.to_vector3() - Vector3::new(12.0, 0.0, 0.0)).norm() < 1e-12);
        let up = docked.orientation * Vector3::y();
        assert!((up - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_animation_hook_replaces_local_transform() {
        let mut node = iss_node();
        let hook: AnimationHook = Arc::new(|docked: &DockedNode, at: DateTime<Utc>, parent: &Pose| {
            assert_eq!(docked.name(), "spinner");
            assert_eq!(parent.state.at(), at);
            let angle = (at.timestamp() % 60) as f64;
            Transform::new(Vector3::new(1.0, 0.0, 0.0), euler_xyz(angle.to_radians(), 0.0, 0.0))
        });
        node.dock(DockingSpec::animated(1, "spinner", hook).with_asset("spinner_model"));
        assert_eq!(node.docked()[0].asset(), Some("spinner_model"));

        let at = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 30).unwrap();
        let pose = node.pose_at(&Sgp4Propagator, at);
        let local = node.docked()[0].local_transform(at, &pose);
        assert_eq!(local.offset, Vector3::new(1.0, 0.0, 0.0));
        assert!((local.rotation.angle() - 30f64.to_radians()).abs() < 1e-12);
    }
}
