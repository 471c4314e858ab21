//! Tracker session: the root nodes, the focus and the simulated clock.
//!
//! The session is the only owner of mutable tracker state. [`TrackerSession::tick`]
//! takes `&self`, so deriving a frame can never change what is tracked.

use chrono::{DateTime, Utc};
use orbital_mechanics::{
    moon_scene_vector, sun_scene_vector, OrbitalElementSet, Propagator, Sgp4Propagator,
};
use tracing::{debug, info, warn};

use crate::catalog::{parse_catalog, to_catalog_text};
use crate::config::TrackerConfig;
use crate::frame::{DockedFrame, EarthAlignment, Focus, FrameResult, NodeFrame, Telemetry};
use crate::iss;
use crate::node::{DockingSpec, NodeLifecycle, RootNode};
use crate::time_control::TimeController;
use crate::{NodeId, Result, TrackerError};

pub struct TrackerSession<P: Propagator = Sgp4Propagator> {
    config: TrackerConfig,
    propagator: P,
    nodes: Vec<RootNode>,
    /// Set by `add_home`; the only node `remove_node` refuses
    home: Option<NodeId>,
    focus: Focus,
    time: TimeController,
}

impl TrackerSession<Sgp4Propagator> {
    /// An empty session with a live clock, focused on Earth.
    pub fn new(config: TrackerConfig, real_now: DateTime<Utc>) -> Result<Self> {
        Self::with_propagator(config, Sgp4Propagator, real_now)
    }
}

impl<P: Propagator> TrackerSession<P> {
    pub fn with_propagator(
        config: TrackerConfig,
        propagator: P,
        real_now: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;
        let time = TimeController::new(&config, real_now);

        Ok(Self {
            config,
            propagator,
            nodes: Vec::new(),
            home: None,
            focus: Focus::Earth,
            time,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Spawn a root node with `docking` attached. The node starts
    /// unpropagated until [`mark_loaded`](Self::mark_loaded).
    pub fn add_node(
        &mut self,
        elements: OrbitalElementSet,
        docking: Vec<DockingSpec>,
        real_now: DateTime<Utc>,
    ) -> Result<NodeId> {
        let mut node = RootNode::new(elements);
        for spec in docking {
            node.dock(spec);
        }
        self.insert(node, real_now)
    }

    /// Parse a three-line record and spawn it. Nothing is added when the
    /// text is not a valid element set.
    pub fn add_node_text(
        &mut self,
        text: &str,
        docking: Vec<DockingSpec>,
        real_now: DateTime<Utc>,
    ) -> Result<NodeId> {
        let elements = OrbitalElementSet::parse(text)?;
        self.add_node(elements, docking, real_now)
    }

    /// Register the home satellite and focus it. The ISS gets its full
    /// assembly.
    pub fn add_home(
        &mut self,
        elements: OrbitalElementSet,
        real_now: DateTime<Utc>,
    ) -> Result<NodeId> {
        let id = elements.catalog_id();
        if id != self.config.home_catalog_id {
            return Err(TrackerError::Config(format!(
                "home satellite is {}, got element set for {}",
                self.config.home_catalog_id, id
            )));
        }

        let node = if id == iss::ISS_CATALOG_ID {
            iss::create_station(elements)
        } else {
            RootNode::new(elements)
        };

        let id = self.insert(node, real_now)?;
        self.home = Some(id);
        self.focus = Focus::Satellite(id);
        info!("Home satellite {} registered", id);
        Ok(id)
    }

    fn insert(&mut self, node: RootNode, real_now: DateTime<Utc>) -> Result<NodeId> {
        let id = node.id();
        if self.node(id).is_some() {
            return Err(TrackerError::DuplicateNode(id));
        }

        let at = self.time.simulated_at(real_now);
        if node.state_at(&self.propagator, at).is_crashed() {
            warn!(id, name = node.name(), "element set has no position at the current time");
        }

        info!(id, name = node.name(), docked = node.docked().len(), "Added satellite");
        self.nodes.push(node);
        Ok(id)
    }

    /// Take a root node (and everything docked to it) out of the session.
    /// Removing the focused node moves the focus to the first remaining node,
    /// or to Earth when none remain.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RootNode> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id() == id)
            .ok_or(TrackerError::NodeNotFound(id))?;
        if self.home == Some(id) {
            return Err(TrackerError::HomeNodeProtected(id));
        }

        let mut node = self.nodes.remove(index);
        node.set_lifecycle(NodeLifecycle::Removed);
        info!(id, name = node.name(), "Removed satellite");

        if self.focus == Focus::Satellite(id) {
            self.focus = Focus::from(self.nodes.first().map(RootNode::id));
            debug!(removed = id, focus = ?self.focus, "focus reassigned");
        }
        Ok(node)
    }

    /// Focus a satellite, or Earth with `None`.
    pub fn set_focus(&mut self, id: Option<NodeId>) -> Result<()> {
        if let Some(id) = id {
            if self.node(id).is_none() {
                return Err(TrackerError::NodeNotFound(id));
            }
        }
        self.focus = Focus::from(id);
        debug!(focus = ?self.focus, "focus changed");
        Ok(())
    }

    /// Catalog number of the registered home satellite.
    pub fn home(&self) -> Option<NodeId> {
        self.home
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn focused_node(&self) -> Option<&RootNode> {
        self.focus.node_id().and_then(|id| self.node(id))
    }

    pub fn node(&self, id: NodeId) -> Option<&RootNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Root nodes in insertion order.
    pub fn nodes(&self) -> &[RootNode] {
        &self.nodes
    }

    /// The external asset loader finished for `id`.
    pub fn mark_loaded(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or(TrackerError::NodeNotFound(id))?;
        node.set_lifecycle(NodeLifecycle::Active);
        debug!(id, "model loaded");
        Ok(())
    }

    pub fn time(&self) -> &TimeController {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut TimeController {
        &mut self.time
    }

    pub fn simulated_now(&self, real_now: DateTime<Utc>) -> DateTime<Utc> {
        self.time.simulated_at(real_now)
    }

    /// Derive everything the renderer draws for `real_now`.
    pub fn tick(&self, real_now: DateTime<Utc>) -> FrameResult {
        let at = self.time.simulated_at(real_now);
        let focus_id = self.focus.node_id();

        let mut prediction_path = None;
        let mut telemetry = None;
        let mut earth = EarthAlignment::for_earth(at);
        let mut frames = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let pose = node.pose_at(&self.propagator, at);
            let focused = focus_id == Some(node.id());

            if focused {
                prediction_path = Some(node.prediction_path(
                    &self.propagator,
                    at,
                    self.config.prediction_horizon_minutes,
                ));
                telemetry = Some(Telemetry::new(node.id(), node.name(), &pose.state));
                if !pose.state.is_crashed() {
                    earth = EarthAlignment::for_satellite(&pose.state);
                }
            }

            let docked = node
                .docked()
                .iter()
                .zip(node.docked_poses(at, &pose))
                .map(|(d, p)| DockedFrame {
                    catalog_id: d.catalog_id(),
                    name: d.name().to_string(),
                    asset: d.asset().map(str::to_string),
                    position: p.position,
                    orientation: p.orientation,
                })
                .collect();

            frames.push(NodeFrame {
                id: node.id(),
                name: node.name().to_string(),
                position: pose.position,
                orientation: pose.orientation,
                state: pose.state,
                loaded: node.is_loaded(),
                focused,
                docked,
            });
        }

        debug!(
            simulated = %at,
            nodes = frames.len(),
            path = prediction_path.as_ref().map_or(0, Vec::len),
            "frame derived"
        );

        FrameResult {
            simulated_at: at,
            speed_multiplier: self.time.speed_multiplier(),
            camera_controls_enabled: self.time.camera_controls_enabled(),
            focus: self.focus,
            nodes: frames,
            prediction_path,
            sun_position: sun_scene_vector(at, self.config.sun_distance_m),
            moon_position: moon_scene_vector(at),
            telemetry,
            earth,
        }
    }

    /// Every root node except the home satellite as catalog text.
    pub fn user_catalog(&self) -> String {
        to_catalog_text(
            self.nodes
                .iter()
                .filter(|n| Some(n.id()) != self.home)
                .map(RootNode::elements),
        )
    }

    /// Spawn every record of a saved user catalog. Returns how many were
    /// added; the home satellite and already tracked ids are skipped.
    pub fn load_user_catalog(&mut self, text: &str, real_now: DateTime<Utc>) -> usize {
        let mut added = 0;
        for elements in parse_catalog(text) {
            let id = elements.catalog_id();
            if self.node(id).is_some() {
                warn!(id, "skipping catalog entry already tracked");
                continue;
            }
            match self.add_node(elements, Vec::new(), real_now) {
                Ok(_) => added += 1,
                Err(e) => warn!(id, error = %e, "failed to add catalog entry"),
            }
        }
        info!("Loaded {} satellites from user catalog", added);
        added
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Duration;
    use fuzz_harness::prelude::*;

    fn session_at(now: DateTime<Utc>) -> TrackerSession {
        let mut session = TrackerSession::new(TrackerConfig::default(), now).unwrap();
        session
            .add_home(
                OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap(),
                now,
            )
            .unwrap();
        session
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn fuzz_tick_is_pure(now in instant_near_fixture_epoch(), elapsed in elapsed_ms()) {
            let session = session_at(now);
            let later = now + Duration::milliseconds(elapsed);

            let a = serde_json::to_string(&session.tick(later)).unwrap();
            let b = serde_json::to_string(&session.tick(later)).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn fuzz_path_starts_at_focused_pose(
            now in instant_near_fixture_epoch(),
            speed in speed_multiplier(),
        ) {
            let mut session = session_at(now);
            session.time_mut().set_speed(speed, now);
            let frame = session.tick(now + Duration::seconds(30));

            let path = frame.prediction_path.unwrap();
            prop_assert_eq!(path.len(), 93);
            prop_assert_eq!(path[0], frame.nodes[0].position);
        }

        #[test]
        fn fuzz_untracked_ids_are_not_found(
            now in instant_near_fixture_epoch(),
            id in norad_id(),
        ) {
            prop_assume!(id != iss::ISS_CATALOG_ID);
            let mut session = session_at(now);
            let not_found =
                |r: Result<()>| matches!(r, Err(TrackerError::NodeNotFound(n)) if n == id);

            prop_assert!(not_found(session.set_focus(Some(id))));
            prop_assert!(not_found(session.remove_node(id).map(|_| ())));
            prop_assert!(not_found(session.mark_loaded(id)));
            prop_assert_eq!(session.focus(), Focus::Satellite(iss::ISS_CATALOG_ID));
        }
    }
}
