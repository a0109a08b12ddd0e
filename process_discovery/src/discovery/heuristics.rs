use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use itertools::Itertools;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use super::variants::DiscoveryError;
use crate::dfg::dfg_struct::DirectlyFollowsGraph;
use crate::event_log::activity_projection::EventLogActivityProjection;
use crate::petri_net::petri_net_struct::{ArcType, Marking, PetriNet, TransitionID};

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
/// Algorithm parameters for the Heuristics Miner
pub struct HeuristicsConfig {
    /// Minimum dependency measure for an edge to be kept (exclusive)
    pub dependency_threshold: f64,
    /// Minimum absolute directly-follows count for an edge to be kept (inclusive)
    pub min_frequency: u64,
    /// Two branches with mutual dependency below this threshold (and observed
    /// in both directions) are treated as concurrent instead of exclusive
    pub parallelism_threshold: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            dependency_threshold: 0.5,
            min_frequency: 1,
            parallelism_threshold: 0.5,
        }
    }
}

impl HeuristicsConfig {
    /// Serialize Heuristics Miner parameters to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
    /// Deserialize Heuristics Miner parameters from JSON string
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap()
    }
}

///
/// Dependency measure of the ordered activity pair `(a, b)`, in `(-1, 1)`
///
/// Self-loops use the variant formula `|a>a| / (|a>a| + 1)`.
///
pub fn dependency_measure(dfg: &DirectlyFollowsGraph, a: usize, b: usize) -> f64 {
    if a == b {
        let d = dfg.df_between(a, a) as f64;
        d / (d + 1.0)
    } else {
        let ab = dfg.df_between(a, b) as f64;
        let ba = dfg.df_between(b, a) as f64;
        (ab - ba) / (ab + ba + 1.0)
    }
}

///
/// Dependency graph: the thresholded intermediate of the Heuristics Miner
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Size of the activity alphabet
    pub num_activities: usize,
    /// Retained directed edges, sorted
    pub edges: Vec<(usize, usize)>,
    /// Unordered activity pairs `(a, b)` with `a < b` considered concurrent
    pub concurrent_pairs: Vec<(usize, usize)>,
}

///
/// Threshold the directly-follows graph into a dependency graph
///
/// An edge `a -> b` is kept iff its dependency measure exceeds
/// `dependency_threshold` and its absolute count reaches `min_frequency`.
/// A pair of activities observed in both directions whose absolute mutual
/// dependency stays below `parallelism_threshold` is marked concurrent.
///
pub fn build_dependency_graph(
    dfg: &DirectlyFollowsGraph,
    config: &HeuristicsConfig,
) -> DependencyGraph {
    let n = dfg.activity_counts.len();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for a in 0..n {
        for b in 0..n {
            let count = dfg.df_between(a, b);
            if count >= config.min_frequency
                && count > 0
                && dependency_measure(dfg, a, b) > config.dependency_threshold
            {
                edges.push((a, b));
            }
        }
    }
    let mut concurrent_pairs: Vec<(usize, usize)> = Vec::new();
    for a in 0..n {
        for b in (a + 1)..n {
            if dfg.df_between(a, b) > 0
                && dfg.df_between(b, a) > 0
                && dependency_measure(dfg, a, b).abs() < config.parallelism_threshold
            {
                concurrent_pairs.push((a, b));
            }
        }
    }
    DependencyGraph {
        num_activities: n,
        edges,
        concurrent_pairs,
    }
}

/// Group `members` into clusters of mutually exclusive activities
///
/// Two members end up in the same cluster iff they are transitively connected
/// through non-concurrent pairs; members in different clusters are concurrent
/// branches.
fn exclusive_clusters(members: &[usize], concurrent: &HashSet<(usize, usize)>) -> Vec<Vec<usize>> {
    let is_concurrent = |x: usize, y: usize| {
        concurrent.contains(&(x.min(y), x.max(y)))
    };
    let mut uf: UnionFind<usize> = UnionFind::new(members.len());
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            if !is_concurrent(members[i], members[j]) {
                uf.union(i, j);
            }
        }
    }
    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, member) in members.iter().enumerate() {
        clusters.entry(uf.find(i)).or_default().push(*member);
    }
    clusters.into_values().collect()
}

///
/// Discover a [`PetriNet`] using the Heuristics Miner
///
/// Builds the thresholded dependency graph and converts it to a Petri net:
/// exclusive successor (predecessor) branches share one place, concurrent
/// branches get separate places, expressing XOR- and AND-splits/joins.
/// Deterministic for a fixed log and configuration.
///
pub fn heuristics_discover_petri_net(
    log_proj: &EventLogActivityProjection,
    config: &HeuristicsConfig,
) -> Result<PetriNet, DiscoveryError> {
    let dfg = DirectlyFollowsGraph::from_activity_projection(log_proj);
    let dg = build_dependency_graph(&dfg, config);
    let n = dg.num_activities;
    let edge_set: HashSet<(usize, usize)> = dg.edges.iter().copied().collect();
    let concurrent: HashSet<(usize, usize)> = dg.concurrent_pairs.iter().copied().collect();

    let mut net = PetriNet::new();
    let transitions: Vec<TransitionID> = log_proj
        .activities
        .iter()
        .map(|act_name| net.add_transition(Some(act_name.clone())))
        .collect();

    // one proto-place per (source, exclusive successor cluster)
    let mut proto: Vec<(BTreeSet<usize>, BTreeSet<usize>)> = Vec::new();
    let mut place_of_edge: HashMap<(usize, usize), usize> = HashMap::new();
    for a in 0..n {
        let succs: Vec<usize> = (0..n)
            .filter(|b| *b != a && edge_set.contains(&(a, *b)))
            .collect();
        for cluster in exclusive_clusters(&succs, &concurrent) {
            let idx = proto.len();
            proto.push((
                BTreeSet::from([a]),
                cluster.iter().copied().collect::<BTreeSet<usize>>(),
            ));
            for b in cluster {
                place_of_edge.insert((a, b), idx);
            }
        }
    }

    // join side: exclusive predecessor clusters share one place, so their
    // proto-places are merged
    let mut uf: UnionFind<usize> = UnionFind::new(proto.len());
    for b in 0..n {
        let preds: Vec<usize> = (0..n)
            .filter(|a| *a != b && edge_set.contains(&(*a, b)))
            .collect();
        for cluster in exclusive_clusters(&preds, &concurrent) {
            for pair in cluster.windows(2) {
                uf.union(place_of_edge[&(pair[0], b)], place_of_edge[&(pair[1], b)]);
            }
        }
    }

    let mut merged: BTreeMap<usize, (BTreeSet<usize>, BTreeSet<usize>)> = BTreeMap::new();
    for (idx, (sources, targets)) in proto.iter().enumerate() {
        let entry = merged.entry(uf.find(idx)).or_default();
        entry.0.extend(sources.iter().copied());
        entry.1.extend(targets.iter().copied());
    }
    for (sources, targets) in merged.values() {
        let place_id = net.add_place(None);
        for a in sources {
            net.add_arc(ArcType::transition_to_place(transitions[*a], place_id), None);
        }
        for b in targets {
            net.add_arc(ArcType::place_to_transition(place_id, transitions[*b]), None);
        }
    }

    // self-loops get a dedicated place each
    for a in 0..n {
        if edge_set.contains(&(a, a)) {
            let place_id = net.add_place(None);
            net.add_arc(ArcType::transition_to_place(transitions[a], place_id), None);
            net.add_arc(ArcType::place_to_transition(place_id, transitions[a]), None);
        }
    }

    let source = net.add_place(Some("source".to_string()));
    let sink = net.add_place(Some("sink".to_string()));
    let mut start_covered = dfg.start_activities.is_empty();
    for (act, t) in transitions.iter().enumerate() {
        if net.preset_of_transition(*t).is_empty() {
            net.add_arc(ArcType::place_to_transition(source, *t), None);
            start_covered |= dfg.start_activities.contains(&act);
        }
    }
    if !start_covered {
        for act in dfg.start_activities.iter().sorted() {
            net.add_arc(ArcType::place_to_transition(source, transitions[*act]), None);
        }
    }
    let mut end_covered = dfg.end_activities.is_empty();
    for (act, t) in transitions.iter().enumerate() {
        if net.postset_of_transition(*t).is_empty() {
            net.add_arc(ArcType::transition_to_place(*t, sink), None);
            end_covered |= dfg.end_activities.contains(&act);
        }
    }
    if !end_covered {
        for act in dfg.end_activities.iter().sorted() {
            net.add_arc(ArcType::transition_to_place(transitions[*act], sink), None);
        }
    }

    net.initial_marking = Some(Marking::from([(source, 1)]));
    net.final_marking = Some(Marking::from([(sink, 1)]));
    net.validate()?;
    Ok(net)
}
