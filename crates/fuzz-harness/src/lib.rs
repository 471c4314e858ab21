//! ISS Tracker Fuzz Harness
//!
//! Property-test strategies for the tracker's domain values and a small set
//! of known-good element sets shared by the unit tests of every crate.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_fuzz_test(lat in latitude_deg(), lon in longitude_deg()) {
//!         prop_assert!(lat.abs() <= 90.0 && lon.abs() <= 180.0);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
