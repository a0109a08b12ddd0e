use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::event_log::event_log_struct::{EventLog, Trace};
use crate::petri_net::petri_net_struct::{ArcType, PetriNet, TransitionID};

/// Bound on the number of markings visited when searching over silent firings
const SILENT_SEARCH_BOUND: usize = 1024;

///
/// Error that can occur during token-based replay
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBasedReplayError {
    /// The net to replay on has no initial marking
    NoInitialMarking,
    /// The net to replay on has no final marking
    NoFinalMarking,
}

impl Display for TokenBasedReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenBasedReplayError::NoInitialMarking => {
                write!(f, "No initial marking given, but one is required")
            }
            TokenBasedReplayError::NoFinalMarking => {
                write!(f, "No final marking given, but one is required")
            }
        }
    }
}

impl std::error::Error for TokenBasedReplayError {}

///
/// Flattened view of a [`PetriNet`] for replay: per-transition input/output
/// place lists and dense marking vectors
///
pub(crate) struct ReplayNet {
    /// Input places with arc weights, indexed by transition
    pub(crate) inputs: Vec<Vec<(usize, u64)>>,
    /// Output places with arc weights, indexed by transition
    pub(crate) outputs: Vec<Vec<(usize, u64)>>,
    /// Transitions without a label
    pub(crate) silent: Vec<usize>,
    /// First transition carrying each label
    pub(crate) transition_of_label: HashMap<String, usize>,
    /// Transition labels, indexed by transition
    pub(crate) labels: Vec<Option<String>>,
    /// Initial marking as a dense token vector
    pub(crate) initial: Vec<u64>,
    /// Final marking as a dense token vector
    pub(crate) final_marking: Vec<u64>,
}

impl ReplayNet {
    pub(crate) fn from_petri_net(net: &PetriNet) -> Result<Self, TokenBasedReplayError> {
        let initial_marking = net
            .initial_marking
            .as_ref()
            .ok_or(TokenBasedReplayError::NoInitialMarking)?;
        let final_marking = net
            .final_marking
            .as_ref()
            .ok_or(TokenBasedReplayError::NoFinalMarking)?;
        let mut inputs: Vec<Vec<(usize, u64)>> = vec![Vec::new(); net.transitions.len()];
        let mut outputs: Vec<Vec<(usize, u64)>> = vec![Vec::new(); net.transitions.len()];
        for arc in &net.arcs {
            match arc.from_to {
                ArcType::PlaceTransition(p, t) => inputs[t].push((p, arc.weight as u64)),
                ArcType::TransitionPlace(t, p) => outputs[t].push((p, arc.weight as u64)),
            }
        }
        let labels: Vec<Option<String>> = net
            .transitions
            .iter()
            .map(|t| t.label.clone())
            .collect();
        let mut transition_of_label: HashMap<String, usize> = HashMap::new();
        let mut silent: Vec<usize> = Vec::new();
        for (t, label) in labels.iter().enumerate() {
            match label {
                Some(label) => {
                    transition_of_label.entry(label.clone()).or_insert(t);
                }
                None => silent.push(t),
            }
        }
        let mut initial = vec![0; net.places.len()];
        for (p, tokens) in initial_marking {
            initial[p.0] = *tokens;
        }
        let mut final_m = vec![0; net.places.len()];
        for (p, tokens) in final_marking {
            final_m[p.0] = *tokens;
        }
        Ok(Self {
            inputs,
            outputs,
            silent,
            transition_of_label,
            labels,
            initial,
            final_marking: final_m,
        })
    }

    pub(crate) fn is_enabled(&self, marking: &[u64], t: usize) -> bool {
        self.inputs[t].iter().all(|&(p, w)| marking[p] >= w)
    }

    /// Fires an enabled transition; returns the consumed and produced token
    /// counts
    pub(crate) fn fire(&self, marking: &mut [u64], t: usize) -> (u64, u64) {
        let mut consumed = 0;
        for &(p, w) in &self.inputs[t] {
            marking[p] -= w;
            consumed += w;
        }
        let mut produced = 0;
        for &(p, w) in &self.outputs[t] {
            marking[p] += w;
            produced += w;
        }
        (consumed, produced)
    }

    /// Fires a transition regardless of enabledness, minting tokens for empty
    /// input places; returns consumed, produced and minted token counts
    pub(crate) fn force_fire(&self, marking: &mut [u64], t: usize) -> (u64, u64, u64) {
        let mut consumed = 0;
        let mut missing = 0;
        for &(p, w) in &self.inputs[t] {
            if marking[p] < w {
                missing += w - marking[p];
                marking[p] = 0;
            } else {
                marking[p] -= w;
            }
            consumed += w;
        }
        let mut produced = 0;
        for &(p, w) in &self.outputs[t] {
            marking[p] += w;
            produced += w;
        }
        (consumed, produced, missing)
    }

    /// Breadth-first search over silent firings for a marking satisfying
    /// `goal`, returning the (shortest) sequence of silent transitions to fire
    pub(crate) fn silent_path(
        &self,
        start: &[u64],
        goal: impl Fn(&[u64]) -> bool,
    ) -> Option<Vec<usize>> {
        if goal(start) {
            return Some(Vec::new());
        }
        let mut visited: HashSet<Vec<u64>> = HashSet::from([start.to_vec()]);
        let mut parent: HashMap<Vec<u64>, (Vec<u64>, usize)> = HashMap::new();
        let mut queue: VecDeque<Vec<u64>> = VecDeque::from([start.to_vec()]);
        while let Some(marking) = queue.pop_front() {
            for &t in &self.silent {
                if !self.is_enabled(&marking, t) {
                    continue;
                }
                let mut next = marking.clone();
                self.fire(&mut next, t);
                if visited.contains(&next) {
                    continue;
                }
                parent.insert(next.clone(), (marking.clone(), t));
                if goal(&next) {
                    let mut path = vec![t];
                    let mut current = &marking;
                    while let Some((previous, fired)) = parent.get(current) {
                        path.push(*fired);
                        current = previous;
                    }
                    path.reverse();
                    return Some(path);
                }
                visited.insert(next.clone());
                if visited.len() > SILENT_SEARCH_BOUND {
                    return None;
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// All labels enabled in `start` or in any marking reachable from it
    /// through silent firings
    pub(crate) fn enabled_labels_with_closure(&self, start: &[u64]) -> HashSet<String> {
        let mut result: HashSet<String> = HashSet::new();
        let mut visited: HashSet<Vec<u64>> = HashSet::from([start.to_vec()]);
        let mut queue: VecDeque<Vec<u64>> = VecDeque::from([start.to_vec()]);
        while let Some(marking) = queue.pop_front() {
            for (t, label) in self.labels.iter().enumerate() {
                if let Some(label) = label {
                    if self.is_enabled(&marking, t) {
                        result.insert(label.clone());
                    }
                }
            }
            for &t in &self.silent {
                if !self.is_enabled(&marking, t) {
                    continue;
                }
                let mut next = marking.clone();
                self.fire(&mut next, t);
                if visited.len() <= SILENT_SEARCH_BOUND && visited.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
        result
    }
}

fn fitness_from_counts(missing: u64, consumed: u64, remaining: u64, produced: u64) -> f64 {
    let missing_part = if consumed > 0 {
        1.0 - missing as f64 / consumed as f64
    } else {
        1.0
    };
    let remaining_part = if produced > 0 {
        1.0 - remaining as f64 / produced as f64
    } else {
        1.0
    };
    (0.5 * missing_part + 0.5 * remaining_part).clamp(0.0, 1.0)
}

///
/// Token counts and fitness of replaying a single trace
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReplayResult {
    /// Case ID of the replayed trace
    pub case_id: String,
    /// Produced tokens, including the initial marking
    pub produced: u64,
    /// Consumed tokens, including the final marking
    pub consumed: u64,
    /// Tokens that had to be minted to keep the replay going
    pub missing: u64,
    /// Tokens left over besides the final marking
    pub remaining: u64,
    /// Token-based fitness of this trace, in `[0, 1]`
    pub trace_fitness: f64,
    /// True iff the trace replays without missing or remaining tokens
    pub trace_is_fit: bool,
}

///
/// Result of replaying an event log on a [`PetriNet`]
///
/// The log-level token counters are sums over all traces; [`Self::log_fitness`]
/// is computed from these sums, not averaged over traces.
///
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBasedReplayResult {
    /// Per-trace replay results, in log order
    pub trace_results: Vec<TraceReplayResult>,
    /// Total produced tokens
    pub produced: u64,
    /// Total consumed tokens
    pub consumed: u64,
    /// Total missing tokens
    pub missing: u64,
    /// Total remaining tokens
    pub remaining: u64,
    /// How often each transition fired during replay (0 for unfired ones)
    #[serde_as(as = "Vec<(_, _)>")]
    pub transition_visits: HashMap<TransitionID, u64>,
}

impl TokenBasedReplayResult {
    /// Token-based fitness of the whole log, in `[0, 1]`
    pub fn log_fitness(&self) -> f64 {
        fitness_from_counts(self.missing, self.consumed, self.remaining, self.produced)
    }
}

/// Replays one trace; returns its result and the per-transition visit counts
fn replay_trace(rnet: &ReplayNet, trace: &Trace) -> (TraceReplayResult, Vec<u64>) {
    let mut marking = rnet.initial.clone();
    let mut visits: Vec<u64> = vec![0; rnet.labels.len()];
    let mut produced: u64 = rnet.initial.iter().sum();
    let mut consumed: u64 = 0;
    let mut missing: u64 = 0;
    for event in &trace.events {
        match rnet.transition_of_label.get(&event.activity) {
            // a label the net does not know consumes a phantom token
            None => {
                missing += 1;
                consumed += 1;
            }
            Some(&t) => {
                if !rnet.is_enabled(&marking, t) {
                    if let Some(path) = rnet.silent_path(&marking, |m| rnet.is_enabled(m, t)) {
                        for s in path {
                            let (c, p) = rnet.fire(&mut marking, s);
                            consumed += c;
                            produced += p;
                            visits[s] += 1;
                        }
                    }
                }
                if rnet.is_enabled(&marking, t) {
                    let (c, p) = rnet.fire(&mut marking, t);
                    consumed += c;
                    produced += p;
                } else {
                    let (c, p, m) = rnet.force_fire(&mut marking, t);
                    consumed += c;
                    produced += p;
                    missing += m;
                }
                visits[t] += 1;
            }
        }
    }
    // try to cover the final marking through silent firings before accounting
    let covers_final = |m: &[u64]| {
        m.iter()
            .zip(&rnet.final_marking)
            .all(|(have, need)| have >= need)
    };
    if !covers_final(&marking) {
        if let Some(path) = rnet.silent_path(&marking, covers_final) {
            for s in path {
                let (c, p) = rnet.fire(&mut marking, s);
                consumed += c;
                produced += p;
                visits[s] += 1;
            }
        }
    }
    consumed += rnet.final_marking.iter().sum::<u64>();
    let mut remaining: u64 = 0;
    for (p, &need) in rnet.final_marking.iter().enumerate() {
        if marking[p] < need {
            missing += need - marking[p];
        } else {
            remaining += marking[p] - need;
        }
    }
    let trace_fitness = fitness_from_counts(missing, consumed, remaining, produced);
    (
        TraceReplayResult {
            case_id: trace.case_id.clone(),
            produced,
            consumed,
            missing,
            remaining,
            trace_fitness,
            trace_is_fit: missing == 0 && remaining == 0,
        },
        visits,
    )
}

///
/// Replay an event log on a [`PetriNet`] using token-based replay
///
/// Every trace is replayed independently (in parallel) from the initial
/// marking: each event fires the transition carrying its activity label,
/// firing silent transitions first where that enables it, and minting missing
/// tokens where it stays disabled. The final marking is consumed at the end of
/// each trace; leftovers count as remaining tokens.
///
pub fn replay_log(
    net: &PetriNet,
    log: &EventLog,
) -> Result<TokenBasedReplayResult, TokenBasedReplayError> {
    let rnet = ReplayNet::from_petri_net(net)?;
    let per_trace: Vec<(TraceReplayResult, Vec<u64>)> = log
        .traces
        .par_iter()
        .map(|trace| replay_trace(&rnet, trace))
        .collect();
    let mut result = TokenBasedReplayResult {
        trace_results: Vec::with_capacity(per_trace.len()),
        produced: 0,
        consumed: 0,
        missing: 0,
        remaining: 0,
        transition_visits: (0..net.transitions.len())
            .map(|t| (TransitionID(t), 0))
            .collect(),
    };
    for (trace_result, visits) in per_trace {
        result.produced += trace_result.produced;
        result.consumed += trace_result.consumed;
        result.missing += trace_result.missing;
        result.remaining += trace_result.remaining;
        for (t, count) in visits.into_iter().enumerate() {
            if let Some(total) = result.transition_visits.get_mut(&TransitionID(t)) {
                *total += count;
            }
        }
        result.trace_results.push(trace_result);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::event_log_struct::{EventLog, Trace};
    use crate::petri_net::petri_net_struct::Marking;

    /// source -> a -> mid -> b -> sink
    fn sequence_net() -> PetriNet {
        let mut net = PetriNet::new();
        let source = net.add_place(Some("source".to_string()));
        let mid = net.add_place(None);
        let sink = net.add_place(Some("sink".to_string()));
        let a = net.add_transition(Some("a".to_string()));
        let b = net.add_transition(Some("b".to_string()));
        net.add_arc(ArcType::place_to_transition(source, a), None);
        net.add_arc(ArcType::transition_to_place(a, mid), None);
        net.add_arc(ArcType::place_to_transition(mid, b), None);
        net.add_arc(ArcType::transition_to_place(b, sink), None);
        net.initial_marking = Some(Marking::from([(source, 1)]));
        net.final_marking = Some(Marking::from([(sink, 1)]));
        net
    }

    #[test]
    fn fitting_trace_has_no_missing_or_remaining_tokens() {
        let net = sequence_net();
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a", "b"]));
        let result = replay_log(&net, &log).unwrap();
        assert_eq!(result.missing, 0);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.log_fitness(), 1.0);
        assert!(result.trace_results[0].trace_is_fit);
        let a = net.transition_by_label("a").unwrap();
        assert_eq!(result.transition_visits[&a], 1);
    }

    #[test]
    fn force_firing_mints_missing_tokens() {
        let net = sequence_net();
        let mut log = EventLog::new();
        // b fires before a ever produced its token
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["b", "a"]));
        let result = replay_log(&net, &log).unwrap();
        let trace_result = &result.trace_results[0];
        assert!(trace_result.missing > 0);
        assert!(trace_result.remaining > 0);
        assert!(!trace_result.trace_is_fit);
        assert!(trace_result.trace_fitness < 1.0);
        assert!(trace_result.trace_fitness >= 0.0);
    }

    #[test]
    fn unknown_activity_counts_as_missing() {
        let net = sequence_net();
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a", "x", "b"]));
        let result = replay_log(&net, &log).unwrap();
        let trace_result = &result.trace_results[0];
        assert_eq!(trace_result.missing, 1);
        assert_eq!(trace_result.remaining, 0);
        assert!(!trace_result.trace_is_fit);
    }

    #[test]
    fn silent_transitions_bridge_the_replay() {
        // source -> tau -> mid -> a -> sink
        let mut net = PetriNet::new();
        let source = net.add_place(Some("source".to_string()));
        let mid = net.add_place(None);
        let sink = net.add_place(Some("sink".to_string()));
        let tau = net.add_transition(None);
        let a = net.add_transition(Some("a".to_string()));
        net.add_arc(ArcType::place_to_transition(source, tau), None);
        net.add_arc(ArcType::transition_to_place(tau, mid), None);
        net.add_arc(ArcType::place_to_transition(mid, a), None);
        net.add_arc(ArcType::transition_to_place(a, sink), None);
        net.initial_marking = Some(Marking::from([(source, 1)]));
        net.final_marking = Some(Marking::from([(sink, 1)]));

        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a"]));
        let result = replay_log(&net, &log).unwrap();
        assert_eq!(result.missing, 0);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.log_fitness(), 1.0);
        assert_eq!(result.transition_visits[&tau], 1);
    }

    #[test]
    fn log_fitness_uses_summed_counters() {
        let net = sequence_net();
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("fit".to_string(), &["a", "b"]));
        log.traces
            .push(Trace::from_activities("unfit".to_string(), &["b"]));
        let result = replay_log(&net, &log).unwrap();
        let trace_average: f64 = result
            .trace_results
            .iter()
            .map(|r| r.trace_fitness)
            .sum::<f64>()
            / result.trace_results.len() as f64;
        let from_sums = result.log_fitness();
        assert!(from_sums > 0.0 && from_sums < 1.0);
        // summed counters weight traces by size, so the two notions differ
        assert!((from_sums - trace_average).abs() > 1e-9);
    }

    #[test]
    fn replay_requires_markings() {
        let mut net = sequence_net();
        net.initial_marking = None;
        let log = EventLog::new();
        assert_eq!(
            replay_log(&net, &log).err(),
            Some(TokenBasedReplayError::NoInitialMarking)
        );
    }
}
