//! Known-good element sets
//!
//! All three share the 2020-07-12 epoch so that a docked vehicle and the
//! station propagate to nearly the same place.

pub const ISS_NAME: &str = "ISS (ZARYA)";
pub const ISS_LINE1: &str =
    "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
pub const ISS_LINE2: &str =
    "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

pub const PROGRESS_NAME: &str = "PROGRESS-MS 15";
pub const PROGRESS_LINE1: &str =
    "1 46613U 20078A   20194.88612269  .00001264  00000-0  31121-4 0  9990";
pub const PROGRESS_LINE2: &str =
    "2 46613  51.6461 221.2790 0001420  89.1700 280.4600 15.49505000  1235";

pub const DRAGON_NAME: &str = "CREW DRAGON 2";
pub const DRAGON_LINE1: &str =
    "1 48209U 21030A   20194.88612269  .00001264  00000-0  31121-4 0  9992";
pub const DRAGON_LINE2: &str =
    "2 48209  51.6461 221.2790 0001420  89.1700 280.4600 15.49505000  1238";

/// Epoch shared by the fixtures, in Unix milliseconds (2020-07-12T21:16:01Z).
pub const FIXTURE_EPOCH_UNIX_MS: i64 = 1_594_588_561_000;

/// The three-line block for the station.
pub fn iss_tle_text() -> String {
    format!("{}\n{}\n{}", ISS_NAME, ISS_LINE1, ISS_LINE2)
}

/// A catalog text holding every fixture, blank-line separated.
pub fn fixture_catalog_text() -> String {
    format!(
        "{}\n{}\n{}\n\n{}\n{}\n{}\n\n{}\n{}\n{}\n",
        ISS_NAME,
        ISS_LINE1,
        ISS_LINE2,
        PROGRESS_NAME,
        PROGRESS_LINE1,
        PROGRESS_LINE2,
        DRAGON_NAME,
        DRAGON_LINE1,
        DRAGON_LINE2
    )
}
