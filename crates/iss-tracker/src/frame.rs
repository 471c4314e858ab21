//! Per-frame output handed to the renderer and HUD

use chrono::{DateTime, Utc};
use orbital_mechanics::{euler_xyz, Orientation, SatelliteState, SceneVector};
use serde::Serialize;

use crate::NodeId;

const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    /// Camera follows the planet centre
    Earth,
    Satellite(NodeId),
}

impl Focus {
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Focus::Earth => None,
            Focus::Satellite(id) => Some(*id),
        }
    }
}

impl From<Option<NodeId>> for Focus {
    fn from(id: Option<NodeId>) -> Self {
        id.map_or(Focus::Earth, Focus::Satellite)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DockedFrame {
    pub catalog_id: u32,
    pub name: String,
    pub asset: Option<String>,
    pub position: SceneVector,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeFrame {
    pub id: NodeId,
    pub name: String,
    pub position: SceneVector,
    pub orientation: Orientation,
    pub state: SatelliteState,
    pub loaded: bool,
    pub focused: bool,
    pub docked: Vec<DockedFrame>,
}

/// HUD readout for the focused satellite.
#[derive(Debug, Clone, Serialize)]
pub struct Telemetry {
    pub id: NodeId,
    pub name: String,
    pub speed_kmh: f64,
    pub altitude_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub crashed: bool,
}

impl Telemetry {
    pub fn new(id: NodeId, name: &str, state: &SatelliteState) -> Self {
        Self {
            id,
            name: name.to_string(),
            speed_kmh: state.speed_kmh(),
            altitude_km: state.altitude_km(),
            latitude: state.latitude(),
            longitude: state.longitude(),
            crashed: state.is_crashed(),
        }
    }
}

/// Transform of the Earth group so that the focused body sits at the origin
/// with the local vertical on +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarthAlignment {
    pub rotation_x_deg: f64,
    pub rotation_y_deg: f64,
    /// Translation of the Earth centre along Y
    pub center_offset_y_m: f64,
}

impl EarthAlignment {
    pub fn for_satellite(state: &SatelliteState) -> Self {
        Self {
            rotation_x_deg: 90.0 - state.latitude(),
            rotation_y_deg: 90.0 - state.longitude(),
            center_offset_y_m: -state.distance_to_earth_center_m(),
        }
    }

    /// Earth spinning once per UTC day, centred.
    pub fn for_earth(at: DateTime<Utc>) -> Self {
        let ms_of_day = at.timestamp_millis().rem_euclid(MS_PER_DAY);
        Self {
            rotation_x_deg: 0.0,
            rotation_y_deg: ms_of_day as f64 / MS_PER_DAY as f64 * 360.0,
            center_offset_y_m: 0.0,
        }
    }

    pub fn rotation(&self) -> Orientation {
        euler_xyz(self.rotation_x_deg.to_radians(), self.rotation_y_deg.to_radians(), 0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameResult {
    pub simulated_at: DateTime<Utc>,
    pub speed_multiplier: f64,
    pub camera_controls_enabled: bool,
    pub focus: Focus,
    pub nodes: Vec<NodeFrame>,
    /// Future track of the focused satellite; `None` while Earth is focused
    pub prediction_path: Option<Vec<SceneVector>>,
    pub sun_position: SceneVector,
    pub moon_position: SceneVector,
    pub telemetry: Option<Telemetry>,
    pub earth: EarthAlignment,
}

impl FrameResult {
    pub fn node(&self, id: NodeId) -> Option<&NodeFrame> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn focused_node(&self) -> Option<&NodeFrame> {
        self.focus.node_id().and_then(|id| self.node(id))
    }
}
