//! ISS Tracker Core
//!
//! Owns the satellites being tracked, the simulated clock and the per-frame
//! derivation of everything the renderer and HUD draw.
//!
//! # Tick
//!
//! ```text
//! real now ─► TimeController ─► simulated now
//!                                   │
//!          ┌────────────────────────┼──────────────────────┐
//!          ▼                        ▼                      ▼
//!   RootNode::pose_at      prediction_path (focus)   Sun / Moon vectors
//!   (t and t + 60 s)               │                      │
//!          │                        │                      │
//!          ▼                        ▼                      ▼
//!   docked poses ───────────► FrameResult ◄───── EarthAlignment, Telemetry
//! ```
//!
//! | Module | Role |
//! |--------|------|
//! | `node` | root/docked satellites, ports, animation hooks, poses |
//! | `iss` | the station assembly with sun-tracking arrays |
//! | `time_control` | speed multiplier, drag-to-scrub, marker snapping |
//! | `session` | node collection, focus, frame derivation |
//! | `catalog` | concatenated three-line element text |
//! | `config` | tunables with file and environment overrides |

use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod frame;
pub mod iss;
pub mod node;
pub mod session;
pub mod time_control;

pub use catalog::{parse_catalog, to_catalog_text, CatalogDatabase, CatalogRecord};
pub use config::{SpeedMarker, TrackerConfig};
pub use frame::{DockedFrame, EarthAlignment, Focus, FrameResult, NodeFrame, Telemetry};
pub use node::{
    AnimationHook, DockedNode, DockedPose, DockingSpec, Mount, NodeLifecycle, Pose, Port, RootNode,
    Transform, LOOKAHEAD_SECONDS,
};
pub use session::TrackerSession;
pub use time_control::{DragState, TimeController};

/// Root nodes are identified by their catalog number.
pub type NodeId = u32;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("No valid element set: {0}")]
    InvalidElementSet(#[from] orbital_mechanics::OrbitalError),
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),
    #[error("Node {0} is already tracked")]
    DuplicateNode(NodeId),
    #[error("Node {0} is the home satellite and cannot be removed")]
    HomeNodeProtected(NodeId),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
