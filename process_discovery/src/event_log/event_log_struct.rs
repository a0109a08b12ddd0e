use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// Lifecycle transition of an [`Event`]
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LifecycleTransition {
    /// The activity instance was started
    Start,
    /// The activity instance was completed
    Complete,
    /// Any other lifecycle state (e.g., `suspend` or `resume`)
    Other(String),
}

///
/// An event: one recorded execution of an activity
///
/// Immutable once recorded.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Activity name
    pub activity: String,
    /// Lifecycle transition of the activity instance
    pub lifecycle: LifecycleTransition,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// Case the event belongs to (redundant if the event is part of a [`Trace`])
    pub case_id: Option<String>,
}

impl Event {
    /// Create a new completed event with the provided activity and an epoch timestamp
    pub fn new(activity: String) -> Self {
        Self::with_timestamp(activity, DateTime::UNIX_EPOCH)
    }

    /// Create a new completed event with the provided activity and timestamp
    pub fn with_timestamp(activity: String, timestamp: DateTime<Utc>) -> Self {
        Event {
            activity,
            lifecycle: LifecycleTransition::Complete,
            timestamp,
            case_id: None,
        }
    }
}

///
/// A trace: the ordered sequence of [`Event`]s recorded for one case
///
/// Insertion order is occurrence order.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    /// Case identifier, unique per case within an [`EventLog`]
    pub case_id: String,
    /// Events contained in the trace
    pub events: Vec<Event>,
}

impl Trace {
    /// Create a new empty trace for the given case
    pub fn new(case_id: String) -> Self {
        Trace {
            case_id,
            events: Vec::new(),
        }
    }

    /// Create a trace of completed events from a sequence of activity names
    pub fn from_activities(case_id: String, activities: &[&str]) -> Self {
        Trace {
            case_id,
            events: activities
                .iter()
                .map(|act| Event::new((*act).to_string()))
                .collect(),
        }
    }
}

///
/// An event log: a collection of [`Trace`]s with pairwise distinct case ids
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventLog {
    /// Traces contained in the log
    pub traces: Vec<Trace>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events over all traces
    pub fn num_events(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }

    /// Distinct activity names, in order of first occurrence
    pub fn unique_activities(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for trace in &self.traces {
            for event in &trace.events {
                if !seen.contains(&event.activity) {
                    seen.push(event.activity.clone());
                }
            }
        }
        seen
    }

    /// Frequency of each activity occurring as the first event of a trace
    pub fn start_activity_frequencies(&self) -> HashMap<String, u64> {
        let mut freqs: HashMap<String, u64> = HashMap::new();
        for trace in &self.traces {
            if let Some(first) = trace.events.first() {
                *freqs.entry(first.activity.clone()).or_insert(0) += 1;
            }
        }
        freqs
    }

    /// Frequency of each activity occurring as the last event of a trace
    pub fn end_activity_frequencies(&self) -> HashMap<String, u64> {
        let mut freqs: HashMap<String, u64> = HashMap::new();
        for trace in &self.traces {
            if let Some(last) = trace.events.last() {
                *freqs.entry(last.activity.clone()).or_insert(0) += 1;
            }
        }
        freqs
    }

    /// Keep only the traces whose last event is one of the given activities
    pub fn filter_by_end_activities(&self, end_activities: &[&str]) -> EventLog {
        EventLog {
            traces: self
                .traces
                .iter()
                .filter(|t| {
                    t.events
                        .last()
                        .is_some_and(|e| end_activities.contains(&e.activity.as_str()))
                })
                .cloned()
                .collect(),
        }
    }
}
