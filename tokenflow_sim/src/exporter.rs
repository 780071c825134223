//! JSON exporter for generated event logs.
//!
//! Events are written as flat records keyed by the well-known log keys
//! (`concept:name`, `time:timestamp`, `case:concept:name`, `attr:*`), ready
//! for conversion by downstream log tooling.

use crate::error::SimError;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use tokenflow_core::event::CASE_ID_KEY;
use tokenflow_core::Event;

/// One flattened event.
pub type EventRecord = BTreeMap<String, serde_json::Value>;

/// Complete run export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Generation mode (playout, stream, agents, isolated)
    pub mode: String,

    /// Number of distinct cases
    pub case_count: usize,

    /// All events
    pub events: Vec<EventRecord>,
}

impl LogExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, mode: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            mode: mode.to_string(),
            case_count: 0,
            events: Vec::new(),
        }
    }

    /// Adds events, counting cases by their case id.
    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        self.events.extend(events.into_iter().map(Event::to_record));
        self.case_count = self
            .events
            .iter()
            .filter_map(|r| r.get(CASE_ID_KEY).and_then(|v| v.as_str()))
            .collect::<BTreeSet<_>>()
            .len();
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
