//! Domain generators for property-based testing
//!
//! Angles are degrees, distances metres unless the name says otherwise.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Geodetic Generators
// ============================================================================

/// Latitude (-90 to 90 deg)
pub fn latitude_deg() -> impl Strategy<Value = f64> {
    -90.0f64..=90.0
}

/// Latitude kept a hair away from the poles, where longitude is undefined
pub fn latitude_deg_off_pole() -> impl Strategy<Value = f64> {
    -89.9f64..=89.9
}

/// Longitude (-180 to 180 deg)
pub fn longitude_deg() -> impl Strategy<Value = f64> {
    -180.0f64..=180.0
}

/// Altitude in km (LEO to GEO)
pub fn altitude_km() -> impl Strategy<Value = f64> {
    200.0f64..=42_000.0
}

/// Distance from Earth's centre in metres, surface up to lunar distance
pub fn scene_radius_m() -> impl Strategy<Value = f64> {
    6_000_000.0f64..=400_000_000.0
}

// ============================================================================
// Time Generators
// ============================================================================

/// Instant between 2000-01-01 and 2040-01-01, millisecond resolution
pub fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800_000i64..2_208_988_800_000i64)
        .prop_filter_map("representable instant", |ms| Utc.timestamp_millis_opt(ms).single())
}

/// Instant within a day of the fixture epoch
pub fn instant_near_fixture_epoch() -> impl Strategy<Value = DateTime<Utc>> {
    let epoch = crate::fixtures::FIXTURE_EPOCH_UNIX_MS;
    (epoch - 86_400_000..epoch + 86_400_000)
        .prop_filter_map("representable instant", |ms| Utc.timestamp_millis_opt(ms).single())
}

/// Elapsed wall time between two ticks, 0 to 10 minutes in ms
pub fn elapsed_ms() -> impl Strategy<Value = i64> {
    0i64..=600_000
}

/// Playback speed multiplier, including reverse and the dead zone
pub fn speed_multiplier() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(1.0),
        Just(0.0),
        -1.0f64..=0.0,
        -1000.0f64..=1000.0,
    ]
}

/// Horizontal pointer coordinate in pixels
pub fn pointer_x() -> impl Strategy<Value = f64> {
    -4000.0f64..=4000.0
}

// ============================================================================
// Catalog Generators
// ============================================================================

/// NORAD ID (5-digit range)
pub fn norad_id() -> impl Strategy<Value = u32> {
    10000u32..99999u32
}

/// Generic satellite name
pub fn sat_name() -> impl Strategy<Value = String> {
    "[A-Z]{1,8}( [A-Z0-9-]{1,6})?".prop_map(|s| s.to_string())
}

/// Docking offset in metres, each axis within a station-sized box
pub fn docking_offset() -> impl Strategy<Value = (f64, f64, f64)> {
    (-60.0f64..=60.0, -20.0f64..=20.0, -40.0f64..=40.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_latitude_bounds(v in latitude_deg()) {
            prop_assert!((-90.0..=90.0).contains(&v));
        }

        #[test]
        fn test_instant_window(t in instant()) {
            prop_assert!(t.timestamp() >= 946_684_800);
            prop_assert!(t.timestamp() < 2_208_988_800);
        }

        #[test]
        fn test_sat_name_non_empty(name in sat_name()) {
            prop_assert!(!name.trim().is_empty());
        }
    }
}
