use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::event_log_struct::EventLog;

///
/// Projection of an event log on just activity labels
///
/// Activities are mapped to dense indices; equal traces are collapsed into
/// variants with a multiplicity. Both the activity list and the variant list
/// are sorted, so the indices (and everything derived from them) are canonical
/// for a given log.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLogActivityProjection {
    /// Activity names, sorted; the position is the activity index
    pub activities: Vec<String>,
    /// Reverse lookup from activity name to index
    pub act_to_index: HashMap<String, usize>,
    /// Trace variants (as activity index sequences) with their multiplicity
    pub traces: Vec<(Vec<usize>, u64)>,
}

impl From<&EventLog> for EventLogActivityProjection {
    fn from(log: &EventLog) -> Self {
        let activity_set: BTreeSet<&String> = log
            .traces
            .iter()
            .flat_map(|t| t.events.iter().map(|e| &e.activity))
            .collect();
        let activities: Vec<String> = activity_set.into_iter().cloned().collect();
        let act_to_index: HashMap<String, usize> = activities
            .iter()
            .enumerate()
            .map(|(i, act)| (act.clone(), i))
            .collect();
        let mut variants: BTreeMap<Vec<usize>, u64> = BTreeMap::new();
        log.traces.iter().for_each(|t| {
            let trace: Vec<usize> = t
                .events
                .iter()
                .map(|e| *act_to_index.get(&e.activity).unwrap())
                .collect();
            *variants.entry(trace).or_insert(0) += 1;
        });

        EventLogActivityProjection {
            activities,
            act_to_index,
            traces: variants.into_iter().collect(),
        }
    }
}

impl EventLogActivityProjection {
    /// Resolve activity indices back to their (sorted) names
    pub fn acts_to_names(&self, acts: &[usize]) -> Vec<String> {
        let mut ret: Vec<String> = acts
            .iter()
            .map(|act| self.activities[*act].clone())
            .collect();
        ret.sort();
        ret
    }
}
