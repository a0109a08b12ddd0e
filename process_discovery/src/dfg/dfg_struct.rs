use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::event_log::activity_projection::EventLogActivityProjection;

///
/// A directly-follows graph over activity indices
///
/// Contains the directly-follows edge frequencies, the start/end activities and
/// the per-activity occurrence counts of a (projected) event log. Derived once
/// per log and never mutated afterwards.
///
#[serde_as]
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectlyFollowsGraph {
    /// Activity indices that occur in the underlying log
    pub nodes: Vec<usize>,
    /// Directly-follows relations with their frequency
    #[serde_as(as = "Vec<(_, _)>")]
    pub edges: HashMap<(usize, usize), u64>,
    /// Activities occurring as the first event of a trace
    pub start_activities: HashSet<usize>,
    /// Activities occurring as the last event of a trace
    pub end_activities: HashSet<usize>,
    /// Occurrence count per activity index (index into the projection alphabet)
    pub activity_counts: Vec<u64>,
}

impl DirectlyFollowsGraph {
    /// Construct the directly-follows graph of an activity projection
    pub fn from_activity_projection(log: &EventLogActivityProjection) -> Self {
        Self::from_weighted_traces(&log.traces, log.activities.len())
    }

    /// Construct the directly-follows graph of weighted trace variants
    ///
    /// `num_activities` is the size of the full activity alphabet; the traces
    /// may use any subset of it.
    pub fn from_weighted_traces(traces: &[(Vec<usize>, u64)], num_activities: usize) -> Self {
        let edges: HashMap<(usize, usize), u64> = traces
            .par_iter()
            .map(|(t, w)| {
                let mut trace_dfs: Vec<((usize, usize), u64)> = Vec::new();
                let mut prev_event: Option<usize> = None;
                for e in t {
                    if let Some(prev_e) = prev_event {
                        trace_dfs.push(((prev_e, *e), *w));
                    }
                    prev_event = Some(*e);
                }
                trace_dfs
            })
            .flatten()
            .fold(
                HashMap::<(usize, usize), u64>::new,
                |mut map, (df_pair, w)| {
                    *map.entry(df_pair).or_insert(0) += w;
                    map
                },
            )
            .reduce_with(|mut m1, mut m2| {
                if m1.len() < m2.len() {
                    for (k, v) in m2 {
                        *m1.entry(k).or_default() += v;
                    }
                    m1
                } else {
                    for (k, v) in m1 {
                        *m2.entry(k).or_default() += v;
                    }
                    m2
                }
            })
            .unwrap_or_default();

        let mut start_activities: HashSet<usize> = HashSet::new();
        let mut end_activities: HashSet<usize> = HashSet::new();
        let mut activity_counts = vec![0_u64; num_activities];
        for (t, w) in traces {
            if let Some(first) = t.first() {
                start_activities.insert(*first);
            }
            if let Some(last) = t.last() {
                end_activities.insert(*last);
            }
            for act in t {
                activity_counts[*act] += w;
            }
        }
        let mut nodes: Vec<usize> = (0..num_activities)
            .filter(|act| activity_counts[*act] > 0)
            .collect();
        nodes.sort_unstable();

        DirectlyFollowsGraph {
            nodes,
            edges,
            start_activities,
            end_activities,
            activity_counts,
        }
    }

    /// Directly-follows frequency of `b` immediately following `a`
    pub fn df_between(&self, a: usize, b: usize) -> u64 {
        *self.edges.get(&(a, b)).unwrap_or(&0)
    }

    /// Activities directly preceding `act` with at least `df_threshold` observations
    pub fn df_preset_of<T: FromIterator<usize>>(&self, act: usize, df_threshold: u64) -> T {
        self.edges
            .iter()
            .filter_map(|((a, b), w)| {
                if *b == act && *w >= df_threshold {
                    Some(*a)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Activities directly following `act` with at least `df_threshold` observations
    pub fn df_postset_of<T: FromIterator<usize>>(&self, act: usize, df_threshold: u64) -> T {
        self.edges
            .iter()
            .filter_map(|((a, b), w)| {
                if *a == act && *w >= df_threshold {
                    Some(*b)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::event_log_struct::{EventLog, Trace};

    fn sample_projection() -> EventLogActivityProjection {
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a", "b", "d"]));
        log.traces
            .push(Trace::from_activities("c2".to_string(), &["a", "c", "d"]));
        log.traces
            .push(Trace::from_activities("c3".to_string(), &["a", "b", "d"]));
        (&log).into()
    }

    #[test]
    fn dfg_counts_and_endpoints() {
        let proj = sample_projection();
        let dfg = DirectlyFollowsGraph::from_activity_projection(&proj);
        let a = proj.act_to_index["a"];
        let b = proj.act_to_index["b"];
        let c = proj.act_to_index["c"];
        let d = proj.act_to_index["d"];

        assert_eq!(dfg.df_between(a, b), 2);
        assert_eq!(dfg.df_between(a, c), 1);
        assert_eq!(dfg.df_between(b, d), 2);
        assert_eq!(dfg.df_between(c, d), 1);
        assert_eq!(dfg.df_between(b, a), 0);
        assert_eq!(dfg.start_activities, HashSet::from([a]));
        assert_eq!(dfg.end_activities, HashSet::from([d]));
        assert_eq!(dfg.activity_counts[a], 3);
        assert_eq!(dfg.activity_counts[b], 2);

        let postset: HashSet<usize> = dfg.df_postset_of(a, 1);
        assert_eq!(postset, HashSet::from([b, c]));
        let preset: HashSet<usize> = dfg.df_preset_of(d, 2);
        assert_eq!(preset, HashSet::from([b]));
    }

    #[test]
    fn empty_log_yields_empty_graph() {
        let log = EventLog::new();
        let proj: EventLogActivityProjection = (&log).into();
        let dfg = DirectlyFollowsGraph::from_activity_projection(&proj);
        assert!(dfg.nodes.is_empty());
        assert!(dfg.edges.is_empty());
        assert!(dfg.start_activities.is_empty());
    }

    #[test]
    fn dfg_extraction_is_idempotent() {
        let proj = sample_projection();
        let dfg1 = DirectlyFollowsGraph::from_activity_projection(&proj);
        let dfg2 = DirectlyFollowsGraph::from_activity_projection(&proj);
        assert_eq!(dfg1, dfg2);
    }
}
