//! Element-set catalog text
//!
//! Records are three lines (name, line 1, line 2), concatenated. Blank lines
//! between records are tolerated; a record without a name is dropped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use orbital_mechanics::OrbitalElementSet;
use tracing::{info, warn};

use crate::{NodeId, Result};

/// One raw record, not yet parsed into an element set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl CatalogRecord {
    pub fn to_element_set(&self) -> orbital_mechanics::Result<OrbitalElementSet> {
        OrbitalElementSet::from_lines(&self.name, &self.line1, &self.line2)
    }
}

fn is_line1(line: &str) -> bool {
    line.starts_with("1 ")
}

fn is_line2(line: &str) -> bool {
    line.starts_with("2 ")
}

/// Split catalog text into records without validating the element lines.
pub fn split_records(text: &str) -> Vec<CatalogRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        // Bare element pair with no name line
        if is_line1(lines[i]) && lines.get(i + 1).is_some_and(|l| is_line2(l)) {
            warn!(line = i, "skipping catalog record without a name");
            i += 2;
            continue;
        }

        match (lines.get(i + 1), lines.get(i + 2)) {
            (Some(line1), Some(line2)) => {
                records.push(CatalogRecord {
                    name: lines[i].trim().to_string(),
                    line1: line1.trim().to_string(),
                    line2: line2.trim().to_string(),
                });
                i += 3;
            }
            _ => {
                warn!(line = i, "skipping truncated catalog record");
                break;
            }
        }
    }
    records
}

/// Parse every valid record; malformed ones are skipped with a warning.
pub fn parse_catalog(text: &str) -> Vec<OrbitalElementSet> {
    let mut sets = Vec::new();
    let mut skipped = 0;

    for record in split_records(text) {
        match record.to_element_set() {
            Ok(set) => sets.push(set),
            Err(e) => {
                warn!(name = %record.name, error = %e, "skipping catalog record");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed catalog records", skipped);
    }
    sets
}

/// Serialise element sets back into catalog text, one record per set.
pub fn to_catalog_text<'a>(sets: impl IntoIterator<Item = &'a OrbitalElementSet>) -> String {
    let mut text = String::new();
    for set in sets {
        text.push_str(&set.to_tle_text());
        text.push('\n');
    }
    text
}

/// Element sets indexed by catalog number. A later record for the same
/// number replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct CatalogDatabase {
    by_id: BTreeMap<NodeId, OrbitalElementSet>,
}

impl CatalogDatabase {
    pub fn from_text(text: &str) -> Self {
        let mut db = Self::default();
        for set in parse_catalog(text) {
            db.insert(set);
        }
        db
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let db = Self::from_text(&text);
        info!("Loaded {} element sets from {:?}", db.len(), path);
        Ok(db)
    }

    pub fn insert(&mut self, set: OrbitalElementSet) -> Option<OrbitalElementSet> {
        self.by_id.insert(set.catalog_id(), set)
    }

    pub fn get(&self, id: NodeId) -> Option<&OrbitalElementSet> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrbitalElementSet> {
        self.by_id.values()
    }
}
