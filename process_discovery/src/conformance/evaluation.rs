use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::token_based_replay::{replay_log, ReplayNet, TokenBasedReplayError};
use crate::event_log::event_log_struct::EventLog;
use crate::petri_net::petri_net_struct::PetriNet;

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
/// Parameters for model evaluation
pub struct EvaluationConfig {
    /// Model size subtracted before the simplicity penalty kicks in
    pub simplicity_baseline: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            simplicity_baseline: 0.0,
        }
    }
}

///
/// The four standard quality dimensions of a discovered model, each in `[0, 1]`
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Token-based replay fitness of the log on the model
    pub fitness: f64,
    /// Escaping-edges precision: how much modeled behavior the log never shows
    pub precision: f64,
    /// How evenly replay visits spread over the model's transitions
    pub generalization: f64,
    /// Inverse model size
    pub simplicity: f64,
}

impl EvaluationResult {
    /// Serialize the evaluation result to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

/// Moves `marking` along one event, mirroring token-based replay: fire silent
/// transitions first where that enables the transition, force-fire otherwise
fn advance(rnet: &ReplayNet, marking: &mut Vec<u64>, activity: &str) {
    if let Some(&t) = rnet.transition_of_label.get(activity) {
        if !rnet.is_enabled(marking, t) {
            if let Some(path) = rnet.silent_path(marking, |m| rnet.is_enabled(m, t)) {
                for s in path {
                    rnet.fire(marking, s);
                }
            }
        }
        if rnet.is_enabled(marking, t) {
            rnet.fire(marking, t);
        } else {
            rnet.force_fire(marking, t);
        }
    }
}

/// Escaping-edges precision over the log's prefix states
///
/// Every non-final prefix is visited once; the labels enabled in its marking
/// (through silent firings) that the log never continues with are escaping.
/// States are weighted by how often the prefix occurs in the log.
fn escaping_edges_precision(rnet: &ReplayNet, log: &EventLog) -> f64 {
    let mut next_of_prefix: HashMap<Vec<&str>, HashSet<&str>> = HashMap::new();
    let mut count_of_prefix: HashMap<Vec<&str>, u64> = HashMap::new();
    for trace in &log.traces {
        for (i, event) in trace.events.iter().enumerate() {
            let prefix: Vec<&str> = trace.events[..i]
                .iter()
                .map(|e| e.activity.as_str())
                .collect();
            next_of_prefix
                .entry(prefix.clone())
                .or_default()
                .insert(event.activity.as_str());
            *count_of_prefix.entry(prefix).or_default() += 1;
        }
    }
    let mut processed: HashSet<Vec<&str>> = HashSet::new();
    let mut allowed: u64 = 0;
    let mut escaping: u64 = 0;
    for trace in &log.traces {
        let mut marking = rnet.initial.clone();
        for (i, event) in trace.events.iter().enumerate() {
            let prefix: Vec<&str> = trace.events[..i]
                .iter()
                .map(|e| e.activity.as_str())
                .collect();
            if processed.insert(prefix.clone()) {
                let enabled = rnet.enabled_labels_with_closure(&marking);
                let observed = &next_of_prefix[&prefix];
                let weight = count_of_prefix[&prefix];
                allowed += weight * enabled.len() as u64;
                escaping += weight
                    * enabled
                        .iter()
                        .filter(|label| !observed.contains(label.as_str()))
                        .count() as u64;
            }
            advance(rnet, &mut marking, &event.activity);
        }
    }
    if allowed == 0 {
        return 1.0;
    }
    (1.0 - escaping as f64 / allowed as f64).clamp(0.0, 1.0)
}

///
/// Evaluate a discovered [`PetriNet`] against an event log
///
/// Computes token-based replay fitness, escaping-edges precision, a
/// visit-frequency generalization and an inverse-size simplicity, each in
/// `[0, 1]`.
///
pub fn evaluate(
    net: &PetriNet,
    log: &EventLog,
    config: &EvaluationConfig,
) -> Result<EvaluationResult, TokenBasedReplayError> {
    let replay = replay_log(net, log)?;
    let fitness = replay.log_fitness();

    let rnet = ReplayNet::from_petri_net(net)?;
    let precision = escaping_edges_precision(&rnet, log);

    // rarely visited (or unvisited) transitions drag generalization down
    let generalization = if net.transitions.is_empty() {
        1.0
    } else {
        let penalty: f64 = replay
            .transition_visits
            .values()
            .map(|&visits| 1.0 / ((visits + 1) as f64).sqrt())
            .sum();
        (1.0 - penalty / net.transitions.len() as f64).clamp(0.0, 1.0)
    };

    let size = net.places.len() + net.transitions.len() + net.arcs.len();
    let excess = (size as f64 - config.simplicity_baseline).max(0.0);
    let simplicity = (1.0 / (1.0 + excess)).clamp(0.0, 1.0);

    Ok(EvaluationResult {
        fitness,
        precision,
        generalization,
        simplicity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::alpha::alpha_discover_petri_net;
    use crate::discovery::inductive::{inductive_discover_petri_net, InductiveConfig};
    use crate::event_log::activity_projection::EventLogActivityProjection;
    use crate::event_log::event_log_struct::{EventLog, Trace};

    fn sequence_log(copies: usize) -> EventLog {
        let mut log = EventLog::new();
        for i in 0..copies {
            log.traces
                .push(Trace::from_activities(format!("c{i}"), &["a", "b", "c"]));
        }
        log
    }

    #[test]
    fn perfect_model_has_full_fitness_and_precision() {
        let log = sequence_log(10);
        let proj: EventLogActivityProjection = (&log).into();
        let net = alpha_discover_petri_net(&proj).unwrap();
        let result = evaluate(&net, &log, &EvaluationConfig::default()).unwrap();
        assert_eq!(result.fitness, 1.0);
        assert_eq!(result.precision, 1.0);
        assert!(result.generalization > 0.0 && result.generalization < 1.0);
        assert!(result.simplicity > 0.0 && result.simplicity <= 1.0);
    }

    #[test]
    fn flower_model_loses_precision() {
        let log = sequence_log(10);
        let proj: EventLogActivityProjection = (&log).into();
        let flower_net = inductive_discover_petri_net(
            &proj,
            &InductiveConfig {
                max_recursion_depth: 0,
            },
        )
        .unwrap();
        let result = evaluate(&flower_net, &log, &EvaluationConfig::default()).unwrap();
        assert_eq!(result.fitness, 1.0);
        assert!(result.precision < 1.0);
    }

    #[test]
    fn more_observations_increase_generalization() {
        let proj_small: EventLogActivityProjection = (&sequence_log(1)).into();
        let net = alpha_discover_petri_net(&proj_small).unwrap();
        let few = evaluate(&net, &sequence_log(1), &EvaluationConfig::default()).unwrap();
        let many = evaluate(&net, &sequence_log(50), &EvaluationConfig::default()).unwrap();
        assert!(many.generalization > few.generalization);
    }

    #[test]
    fn simplicity_baseline_discounts_model_size() {
        let log = sequence_log(5);
        let proj: EventLogActivityProjection = (&log).into();
        let net = alpha_discover_petri_net(&proj).unwrap();
        let strict = evaluate(&net, &log, &EvaluationConfig::default()).unwrap();
        let lenient = evaluate(
            &net,
            &log,
            &EvaluationConfig {
                simplicity_baseline: 1000.0,
            },
        )
        .unwrap();
        assert!(lenient.simplicity > strict.simplicity);
        assert_eq!(lenient.simplicity, 1.0);
    }

    #[test]
    fn all_metrics_stay_in_unit_interval() {
        let mut log = sequence_log(3);
        log.traces
            .push(Trace::from_activities("noisy".to_string(), &["c", "a", "x"]));
        let proj: EventLogActivityProjection = (&sequence_log(3)).into();
        let net = alpha_discover_petri_net(&proj).unwrap();
        let result = evaluate(&net, &log, &EvaluationConfig::default()).unwrap();
        for metric in [
            result.fitness,
            result.precision,
            result.generalization,
            result.simplicity,
        ] {
            assert!((0.0..=1.0).contains(&metric));
        }
    }
}
