use std::collections::HashSet;

use itertools::Itertools;

use super::variants::DiscoveryError;
use crate::dfg::dfg_struct::DirectlyFollowsGraph;
use crate::dfg::footprint::{Footprint, Relation};
use crate::event_log::activity_projection::EventLogActivityProjection;
use crate::event_log::event_log_struct::EventLog;
use crate::petri_net::petri_net_struct::{ArcType, Marking, PetriNet, TransitionID};

fn all_causal_between(fp: &Footprint, a: &[usize], b: &[usize]) -> bool {
    a.iter()
        .all(|&x| b.iter().all(|&y| fp.relation_between(x, y) == Relation::Causal))
}

fn all_choice_within(fp: &Footprint, set: &[usize]) -> bool {
    set.iter().all(|&x| {
        set.iter()
            .all(|&y| x == y || fp.relation_between(x, y) == Relation::Choice)
    })
}

fn is_place_candidate(fp: &Footprint, a: &[usize], b: &[usize]) -> bool {
    all_causal_between(fp, a, b) && all_choice_within(fp, a) && all_choice_within(fp, b)
}

///
/// Build all place candidates `(A, B)` from the footprint relations
///
/// Every `a ∈ A` must causally precede every `b ∈ B`, while the activities
/// within `A` (and within `B`) must be pairwise in choice. Candidates are grown
/// from singleton causal pairs by merging until a fixpoint is reached.
///
pub fn build_place_candidates(fp: &Footprint) -> HashSet<(Vec<usize>, Vec<usize>)> {
    let mut cnds: HashSet<(Vec<usize>, Vec<usize>)> = HashSet::new();
    for (a, b) in fp.causal_pairs() {
        if fp.relation_between(a, a) == Relation::Choice
            && fp.relation_between(b, b) == Relation::Choice
        {
            cnds.insert((vec![a], vec![b]));
        }
    }

    let mut new_cnds: HashSet<(Vec<usize>, Vec<usize>)> = cnds.clone();
    let mut changed = true;
    while changed {
        changed = false;
        let mut added_cnds: HashSet<(Vec<usize>, Vec<usize>)> = HashSet::new();
        for (a1, b1) in &new_cnds {
            for (a2, b2) in &cnds {
                let mut a = [a1.as_slice(), a2.as_slice()].concat();
                let mut b = [b1.as_slice(), b2.as_slice()].concat();
                a.sort_unstable();
                a.dedup();
                b.sort_unstable();
                b.dedup();
                if !cnds.contains(&(a.clone(), b.clone())) && is_place_candidate(fp, &a, &b) {
                    added_cnds.insert((a, b));
                }
            }
        }
        if !added_cnds.is_empty() {
            changed = true;
            for cnd in &added_cnds {
                cnds.insert(cnd.clone());
            }
            new_cnds = added_cnds;
        }
    }
    cnds
}

/// Keep only the candidates not dominated by a superset candidate
fn maximal_candidates(
    cnds: HashSet<(Vec<usize>, Vec<usize>)>,
) -> Vec<(Vec<usize>, Vec<usize>)> {
    let is_subset = |sub: &[usize], sup: &[usize]| sub.iter().all(|x| sup.contains(x));
    cnds.iter()
        .filter(|(a, b)| {
            !cnds.iter().any(|(a2, b2)| {
                (a2, b2) != (a, b) && is_subset(a, a2) && is_subset(b, b2)
            })
        })
        .cloned()
        .sorted()
        .collect()
}

///
/// Discover a [`PetriNet`] using the Alpha process discovery algorithm
///
/// Builds the footprint relations of the log, derives maximal place candidates
/// and connects them with one place each; start and end activities are wired to
/// a source and a sink place carrying the initial and final marking. Degenerate
/// logs without causal pairs still yield a valid net with only source/sink
/// places.
///
pub fn alpha_discover_petri_net(
    log_proj: &EventLogActivityProjection,
) -> Result<PetriNet, DiscoveryError> {
    let dfg = DirectlyFollowsGraph::from_activity_projection(log_proj);
    let fp = Footprint::from_dfg(&dfg);
    let maximal = maximal_candidates(build_place_candidates(&fp));

    let mut net = PetriNet::new();
    let transitions: Vec<TransitionID> = log_proj
        .activities
        .iter()
        .map(|act_name| net.add_transition(Some(act_name.clone())))
        .collect();

    for (a, b) in &maximal {
        let place_id = net.add_place(None);
        for in_act in a {
            net.add_arc(
                ArcType::transition_to_place(transitions[*in_act], place_id),
                None,
            );
        }
        for out_act in b {
            net.add_arc(
                ArcType::place_to_transition(place_id, transitions[*out_act]),
                None,
            );
        }
    }

    let source = net.add_place(Some("source".to_string()));
    let sink = net.add_place(Some("sink".to_string()));
    for act in dfg.start_activities.iter().sorted() {
        net.add_arc(ArcType::place_to_transition(source, transitions[*act]), None);
    }
    for act in dfg.end_activities.iter().sorted() {
        net.add_arc(ArcType::transition_to_place(transitions[*act], sink), None);
    }
    // activities unreachable through any candidate place still become part of
    // the net, hanging off the source/sink places
    for t in &transitions {
        if net.preset_of_transition(*t).is_empty() {
            net.add_arc(ArcType::place_to_transition(source, *t), None);
        }
        if net.postset_of_transition(*t).is_empty() {
            net.add_arc(ArcType::transition_to_place(*t, sink), None);
        }
    }

    net.initial_marking = Some(Marking::from([(source, 1)]));
    net.final_marking = Some(Marking::from([(sink, 1)]));
    net.validate()?;
    Ok(net)
}

///
/// Discover a [`PetriNet`] from an event log using the Alpha algorithm
///
/// Convenience wrapper around [`alpha_discover_petri_net`] that first projects
/// the log onto its activities.
///
pub fn alpha_discover_petri_net_from_log(log: &EventLog) -> Result<PetriNet, DiscoveryError> {
    alpha_discover_petri_net(&EventLogActivityProjection::from(log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::token_based_replay::replay_log;
    use crate::event_log::event_log_struct::{EventLog, Trace};

    fn choice_log() -> EventLog {
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a", "b", "d"]));
        log.traces
            .push(Trace::from_activities("c2".to_string(), &["a", "c", "d"]));
        log.traces
            .push(Trace::from_activities("c3".to_string(), &["a", "b", "d"]));
        log
    }

    #[test]
    fn choice_log_yields_split_and_join_places() {
        let log = choice_log();
        let proj: EventLogActivityProjection = (&log).into();
        let net = alpha_discover_petri_net(&proj).unwrap();

        // one place splitting a into b/c, one rejoining before d, plus source/sink
        assert_eq!(net.places.len(), 4);
        assert_eq!(net.transitions.len(), 4);

        let b = net.transition_by_label("b").unwrap();
        let c = net.transition_by_label("c").unwrap();
        assert_eq!(net.preset_of_transition(b), net.preset_of_transition(c));
        assert_eq!(net.postset_of_transition(b), net.postset_of_transition(c));

        let replay = replay_log(&net, &log).unwrap();
        for trace_result in &replay.trace_results {
            assert_eq!(trace_result.missing, 0);
            assert_eq!(trace_result.remaining, 0);
            assert!(trace_result.trace_is_fit);
        }
    }

    #[test]
    fn identical_sequences_replay_perfectly() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.traces
                .push(Trace::from_activities(format!("c{i}"), &["a", "b", "c"]));
        }
        let proj: EventLogActivityProjection = (&log).into();
        let net = alpha_discover_petri_net(&proj).unwrap();

        let replay = replay_log(&net, &log).unwrap();
        assert_eq!(replay.missing, 0);
        assert_eq!(replay.remaining, 0);
        assert_eq!(replay.log_fitness(), 1.0);
    }

    #[test]
    fn log_wrapper_matches_projection_discovery() {
        let log = choice_log();
        let proj: EventLogActivityProjection = (&log).into();
        assert_eq!(
            alpha_discover_petri_net_from_log(&log).unwrap(),
            alpha_discover_petri_net(&proj).unwrap()
        );
    }

    #[test]
    fn discovery_is_deterministic() {
        let log = choice_log();
        let proj: EventLogActivityProjection = (&log).into();
        let net1 = alpha_discover_petri_net(&proj).unwrap();
        let net2 = alpha_discover_petri_net(&proj).unwrap();
        assert_eq!(net1, net2);
    }

    #[test]
    fn degenerate_single_activity_log() {
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a"]));
        let proj: EventLogActivityProjection = (&log).into();
        let net = alpha_discover_petri_net(&proj).unwrap();
        // no causal pairs: only source and sink places
        assert_eq!(net.places.len(), 2);
        assert_eq!(net.transitions.len(), 1);
        assert!(net.validate().is_ok());
    }
}
