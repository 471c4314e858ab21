//! International Space Station assembly
//!
//! Port offsets are model units (metres) from the station's origin; rotations
//! are degrees applied X, Y, Z.
//!
//! | Port | Offset | Rotation |
//! |------|--------|----------|
//! | PMA 3 | (0, 2.13, 16.18) | (0, 180, 0) |
//! | PMA 2 | (0, -0.8, 20.8) | (90, 180, 0) |
//! | MRM 2 | (0, 5.63, -19.9) | (0, 0, 0) |
//! | MRM 1 | (0, -6.55, -6.9) | (0, 0, 180) |
//! | DC 1 | (0, -4.4, -19.9) | (0, 0, 180) |
//! | AFT | (0, 0.4, -32.0) | (90, 0, 180) |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use orbital_mechanics::{solar_array_rotation, OrbitalElementSet};

use crate::node::{AnimationHook, DockedNode, DockingSpec, Pose, Port, RootNode, Transform};
use crate::NodeId;

pub const ISS_CATALOG_ID: NodeId = 25544;
pub const MAIN_ASSET: &str = "main-compressed";

const SOYUZ_PROGRESS_CATALOG_ID: u32 = 46613;
const CREW_DRAGON_CATALOG_ID: u32 = 48209;

/// Top of Node 2
pub fn port_pma_3() -> Port {
    Port::new("PMA 3", [0.0, 2.13, 16.18], [0.0, 180.0, 0.0])
}

/// Former shuttle port
pub fn port_pma_2() -> Port {
    Port::new("PMA 2", [0.0, -0.8, 20.8], [90.0, 180.0, 0.0])
}

pub fn port_mrm_2() -> Port {
    Port::new("MRM 2", [0.0, 5.63, -19.9], [0.0, 0.0, 0.0])
}

pub fn port_mrm_1() -> Port {
    Port::new("MRM 1", [0.0, -6.55, -6.9], [0.0, 0.0, 180.0])
}

pub fn port_dc_1() -> Port {
    Port::new("DC 1", [0.0, -4.4, -19.9], [0.0, 0.0, 180.0])
}

pub fn port_aft() -> Port {
    Port::new("AFT", [0.0, 0.4, -32.0], [90.0, 0.0, 180.0])
}

/// Hook that keeps an array at `offset` and turns it towards the Sun as seen
/// from the station's current position.
pub fn solar_array_hook(offset: Vector3<f64>, two_axis_tracking: bool) -> AnimationHook {
    Arc::new(move |_: &DockedNode, at: DateTime<Utc>, parent: &Pose| {
        Transform::new(offset, solar_array_rotation(at, &parent.state, two_axis_tracking))
    })
}

/// Everything docked to the station: truss, arrays and visiting vehicles.
pub fn docking_specs() -> Vec<DockingSpec> {
    let mut specs = vec![DockingSpec::animated(
        ISS_CATALOG_ID,
        "Solar Rod",
        solar_array_hook(Vector3::new(0.0, 5.0, 5.0), false),
    )
    .with_asset("solar_array_rod")];

    for mirror in [1.0, -1.0] {
        let asset = if mirror > 0.0 {
            "solar_array_left"
        } else {
            "solar_array_right"
        };

        // Outer, then inner
        for x in [50.0, 34.3] {
            specs.push(
                DockingSpec::animated(
                    ISS_CATALOG_ID,
                    "Solar Array",
                    solar_array_hook(Vector3::new(x * mirror, 5.0, 5.0), true),
                )
                .with_asset(asset),
            );
        }
    }

    specs.push(DockingSpec::fixed(SOYUZ_PROGRESS_CATALOG_ID, "Progress 75", port_aft()));
    specs.push(DockingSpec::fixed(SOYUZ_PROGRESS_CATALOG_ID, "Progress 76", port_dc_1()));
    specs.push(DockingSpec::fixed(SOYUZ_PROGRESS_CATALOG_ID, "Soyuz MS-17", port_mrm_1()));
    specs.push(DockingSpec::fixed(CREW_DRAGON_CATALOG_ID, "Crew-2 Dragon", port_pma_3()));

    specs
}

/// The station as a root node with its full assembly docked.
pub fn create_station(elements: OrbitalElementSet) -> RootNode {
    let mut node = RootNode::new(elements).with_asset(MAIN_ASSET);
    for spec in docking_specs() {
        node.dock(spec);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mount;
    use chrono::Duration;
    use fuzz_harness::fixtures::{ISS_LINE1, ISS_LINE2, ISS_NAME};
    use orbital_mechanics::Sgp4Propagator;

    fn station() -> RootNode {
        create_station(OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap())
    }

    #[test]
    fn test_assembly_layout() {
        let node = station();
        assert_eq!(node.asset(), Some(MAIN_ASSET));

        let names: Vec<&str> = node.docked().iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec![
                "Solar Rod",
                "Solar Array",
                "Solar Array",
                "Solar Array",
                "Solar Array",
                "Progress 75",
                "Progress 76",
                "Soyuz MS-17",
                "Crew-2 Dragon",
            ]
        );

        let animated = node
            .docked()
            .iter()
            .filter(|d| matches!(d.mount(), Mount::Animated(_)))
            .count();
        assert_eq!(animated, 5);
        assert_eq!(node.docked()[1].asset(), Some("solar_array_left"));
        assert_eq!(node.docked()[3].asset(), Some("solar_array_right"));
    }

    #[test]
    fn test_visiting_vehicles_use_named_ports() {
        let node = station();
        let ports: Vec<(&str, &str)> = node
            .docked()
            .iter()
            .filter_map(|d| match d.mount() {
                Mount::Fixed(port) => Some((d.name(), port.name.as_str())),
                Mount::Animated(_) => None,
            })
            .collect();
        assert_eq!(
            ports,
            vec![
                ("Progress 75", "AFT"),
                ("Progress 76", "DC 1"),
                ("Soyuz MS-17", "MRM 1"),
                ("Crew-2 Dragon", "PMA 3"),
            ]
        );
    }

    #[test]
    fn test_arrays_keep_their_offsets_and_track_the_sun() {
        let node = station();
        let at = node.elements().epoch() + Duration::minutes(20);
        let later = at + Duration::minutes(25);

        let pose = node.pose_at(&Sgp4Propagator, at);
        let pose_later = node.pose_at(&Sgp4Propagator, later);

        let outer = &node.docked()[1];
        let local = outer.local_transform(at, &pose);
        let local_later = outer.local_transform(later, &pose_later);

        assert_eq!(local.offset, Vector3::new(50.0, 5.0, 5.0));
        assert!(local.rotation.coords.iter().all(|c| c.is_finite()));
        // A quarter orbit moves the Sun across the sky
        assert!(local.rotation.angle_to(&local_later.rotation) > 1e-3);

        let inner_right = &node.docked()[4];
        assert_eq!(
            inner_right.local_transform(at, &pose).offset,
            Vector3::new(-34.3, 5.0, 5.0)
        );
    }

    #[test]
    fn test_rod_tracks_on_one_axis() {
        let node = station();
        let at = node.elements().epoch();
        let pose = node.pose_at(&Sgp4Propagator, at);
        let rod = node.docked()[0].local_transform(at, &pose);
        assert!((rod.rotation * Vector3::x() - Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_spare_ports_accept_vehicles() {
        let mut node = station();
        node.dock(DockingSpec::fixed(CREW_DRAGON_CATALOG_ID, "Crew-3 Dragon", port_pma_2()));
        node.dock(DockingSpec::fixed(SOYUZ_PROGRESS_CATALOG_ID, "Progress 77", port_mrm_2()));
        assert_eq!(node.docked().len(), 11);

        let at = node.elements().epoch();
        let pose = node.pose_at(&Sgp4Propagator, at);
        let poses = node.docked_poses(at, &pose);

        // MRM 2 has no rotation of its own
        let mrm_2 = &poses[10];
        assert!(mrm_2.orientation.angle_to(&pose.orientation) < 1e-12);
        let expected = pose.orientation * Vector3::new(0.0, 5.63, -19.9);
        let relative = mrm_2.position.to_vector3() - pose.position.to_vector3();
        assert!((relative - expected).norm() < 1e-6);

        // PMA 2 points its docking axis along the station's +Y
        let forward = port_pma_2().transform.rotation * Vector3::z();
        assert!((forward - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_aft_port_rotation() {
        let port = port_aft();
        // Rx(90°) · Rz(180°): local +Y ends on world -Z
        let up = port.transform.rotation * Vector3::y();
        assert!((up - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
    }
}
