//! Events, cases and event logs.

use crate::attributes::Attributes;
use crate::net::Transition;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Activity key of a record.
pub const ACTIVITY_KEY: &str = "concept:name";
/// Timestamp key of a record.
pub const TIMESTAMP_KEY: &str = "time:timestamp";
/// Case id key of a record.
pub const CASE_ID_KEY: &str = "case:concept:name";
/// Prefix for transition attributes copied onto a record.
pub const ATTRIBUTE_PREFIX: &str = "attr:";
/// Key of the emitting agent in multi-agent logs.
pub const AGENT_KEY: &str = "agent:id";

/// Moves `ts` forward by `by`, saturating at the representable range.
pub fn advance_timestamp(ts: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|d| ts.checked_add_signed(d))
        .unwrap_or(ts)
}

/// One recorded occurrence of a visible transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub activity: String,
    pub timestamp: DateTime<Utc>,
    pub case_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl Event {
    /// Records `transition` under its label. Silent transitions yield `None`.
    pub fn from_transition(
        transition: &Transition,
        case_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        let activity = transition.label()?.to_string();
        Some(Self {
            activity,
            timestamp,
            case_id: case_id.into(),
            attributes: transition.attributes().clone(),
            agent_id: None,
        })
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// ISO-8601 timestamp, e.g. `2024-01-01T00:10:00Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Flat key/value view using the well-known keys.
    pub fn to_record(&self) -> BTreeMap<String, serde_json::Value> {
        let mut record = BTreeMap::new();
        record.insert(ACTIVITY_KEY.to_string(), self.activity.clone().into());
        record.insert(TIMESTAMP_KEY.to_string(), self.timestamp_iso().into());
        record.insert(CASE_ID_KEY.to_string(), self.case_id.clone().into());
        for (key, value) in &self.attributes {
            record.insert(format!("{}{}", ATTRIBUTE_PREFIX, key), value.to_json());
        }
        if let Some(agent) = &self.agent_id {
            record.insert(AGENT_KEY.to_string(), agent.clone().into());
        }
        record
    }
}

/// The events of one process instance, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    pub events: Vec<Event>,
}

impl Case {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            events: Vec::new(),
        }
    }

    pub fn activities(&self) -> impl Iterator<Item = &str> + '_ {
        self.events.iter().map(|e| e.activity.as_str())
    }
}

/// An ordered collection of cases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub cases: Vec<Case>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_case(&mut self, case: Case) {
        self.cases.push(case);
    }

    /// Number of cases.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.cases.iter().map(|c| c.events.len()).sum()
    }

    pub fn case(&self, case_id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.case_id == case_id)
    }

    /// All events, case by case.
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.cases.iter().flat_map(|c| c.events.iter())
    }

    pub fn into_events(self) -> Vec<Event> {
        self.cases.into_iter().flat_map(|c| c.events).collect()
    }
}
