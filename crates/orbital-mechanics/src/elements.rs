//! Two-line element sets
//!
//! An [`OrbitalElementSet`] is parsed once from the name/line 1/line 2 triple
//! and keeps the initialised SGP4 model next to the raw text, so every later
//! propagation is a pure function of the set and an instant.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{OrbitalError, Result};

const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Clone)]
pub struct OrbitalElementSet {
    catalog_id: u32,
    name: String,
    line1: String,
    line2: String,
    epoch: DateTime<Utc>,
    inclination_deg: f64,
    eccentricity: f64,
    mean_motion_rev_day: f64,
    constants: Arc<sgp4::Constants>,
}

impl OrbitalElementSet {
    /// Parse a named element set. Lines are trimmed; an empty name falls back
    /// to the catalog number.
    pub fn from_lines(name: &str, line1: &str, line2: &str) -> Result<Self> {
        let line1 = line1.trim();
        let line2 = line2.trim();

        if !line1.starts_with('1') || !line2.starts_with('2') {
            return Err(OrbitalError::InvalidTle(format!(
                "expected lines starting with '1' and '2', got {:?} / {:?}",
                line1.chars().next(),
                line2.chars().next()
            )));
        }

        let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| OrbitalError::InvalidTle(format!("{:?}", e)))?;

        let catalog_id = u32::try_from(elements.norad_id).map_err(|_| {
            OrbitalError::InvalidTle(format!("catalog number {} out of range", elements.norad_id))
        })?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| OrbitalError::PropagationFailed(format!("{:?}", e)))?;

        let name = match name.trim() {
            "" => catalog_id.to_string(),
            trimmed => trimmed.to_string(),
        };

        Ok(Self {
            catalog_id,
            name,
            line1: line1.to_string(),
            line2: line2.to_string(),
            epoch: DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc),
            inclination_deg: elements.inclination,
            eccentricity: elements.eccentricity,
            mean_motion_rev_day: elements.mean_motion,
            constants: Arc::new(constants),
        })
    }

    /// Parse a text block of either three lines (name, line 1, line 2) or two
    /// bare element lines.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty())
            .collect();

        match lines.as_slice() {
            [name, line1, line2] => Self::from_lines(name, line1, line2),
            [line1, line2] => Self::from_lines("", line1, line2),
            other => Err(OrbitalError::InvalidTle(format!(
                "expected 2 or 3 non-empty lines, got {}",
                other.len()
            ))),
        }
    }

    pub fn catalog_id(&self) -> u32 {
        self.catalog_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line1(&self) -> &str {
        &self.line1
    }

    pub fn line2(&self) -> &str {
        &self.line2
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn inclination_deg(&self) -> f64 {
        self.inclination_deg
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn mean_motion_rev_day(&self) -> f64 {
        self.mean_motion_rev_day
    }

    /// Nominal orbital period derived from the mean motion.
    pub fn period_minutes(&self) -> f64 {
        MINUTES_PER_DAY / self.mean_motion_rev_day
    }

    /// Signed minutes from the element epoch to `at`, millisecond resolution.
    pub fn minutes_since_epoch(&self, at: DateTime<Utc>) -> f64 {
        at.signed_duration_since(self.epoch).num_milliseconds() as f64 / 60_000.0
    }

    /// The three-line text form (name, line 1, line 2) without trailing newline.
    pub fn to_tle_text(&self) -> String {
        format!("{}\n{}\n{}", self.name, self.line1, self.line2)
    }

    pub(crate) fn constants(&self) -> &sgp4::Constants {
        &self.constants
    }
}

impl fmt::Debug for OrbitalElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElementSet")
            .field("catalog_id", &self.catalog_id)
            .field("name", &self.name)
            .field("epoch", &self.epoch)
            .field("inclination_deg", &self.inclination_deg)
            .field("mean_motion_rev_day", &self.mean_motion_rev_day)
            .finish()
    }
}

impl PartialEq for OrbitalElementSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.line1 == other.line1 && self.line2 == other.line2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fuzz_harness::fixtures::{ISS_LINE1, ISS_LINE2, ISS_NAME};

    #[test]
    fn test_parse_iss() {
        let set = OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap();

        assert_eq!(set.catalog_id(), 25544);
        assert_eq!(set.name(), "ISS (ZARYA)");
        assert!((set.inclination_deg() - 51.6461).abs() < 1e-9);
        assert!((set.eccentricity() - 0.0001413).abs() < 1e-12);

        // 2020 day 194.88612269 = 12 July 21:16:01
        let expected = Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 1).unwrap();
        assert!((set.epoch() - expected).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_period_is_leo() {
        let set = OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap();
        let period = set.period_minutes();
        assert!(period > 92.0 && period < 94.0, "period {}", period);
    }

    #[test]
    fn test_parse_three_line_block_with_crlf() {
        let text = format!("{}\r\n{}\r\n{}\r\n", ISS_NAME, ISS_LINE1, ISS_LINE2);
        let set = OrbitalElementSet::parse(&text).unwrap();
        assert_eq!(set.catalog_id(), 25544);
        assert_eq!(set.line2(), ISS_LINE2);
    }

    #[test]
    fn test_parse_two_line_block_uses_catalog_number() {
        let text = format!("{}\n{}", ISS_LINE1, ISS_LINE2);
        let set = OrbitalElementSet::parse(&text).unwrap();
        assert_eq!(set.name(), "25544");
    }

    #[test]
    fn test_text_round_trip() {
        let set = OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap();
        let reparsed = OrbitalElementSet::parse(&set.to_tle_text()).unwrap();
        assert_eq!(set, reparsed);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            OrbitalElementSet::parse("hello\nworld\n!"),
            Err(OrbitalError::InvalidTle(_))
        ));
        assert!(matches!(
            OrbitalElementSet::parse(ISS_LINE1),
            Err(OrbitalError::InvalidTle(_))
        ));
    }

    #[test]
    fn test_rejects_corrupted_line() {
        // Inclination field overwritten with letters
        let broken = ISS_LINE2.replace("51.6461", "5x.6y61");
        assert!(OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, &broken).is_err());
    }

    #[test]
    fn test_minutes_since_epoch() {
        let set = OrbitalElementSet::from_lines(ISS_NAME, ISS_LINE1, ISS_LINE2).unwrap();
        let later = set.epoch() + chrono::Duration::minutes(90);
        assert!((set.minutes_since_epoch(later) - 90.0).abs() < 1e-9);
        let earlier = set.epoch() - chrono::Duration::seconds(30);
        assert!((set.minutes_since_epoch(earlier) + 0.5).abs() < 1e-9);
    }
}
