use serde::{Deserialize, Serialize};

use super::alpha::alpha_discover_petri_net;
use super::heuristics::{heuristics_discover_petri_net, HeuristicsConfig};
use super::inductive::{inductive_discover_petri_net, InductiveConfig};
use crate::event_log::activity_projection::EventLogActivityProjection;
use crate::petri_net::petri_net_struct::{InvariantViolation, PetriNet};

///
/// Errors that can occur during process discovery
///
/// Discovery never fails on log content; the only failure mode is a net that
/// violates its structural invariants, which indicates corrupted construction.
///
#[derive(Debug, Clone)]
pub enum DiscoveryError {
    /// The constructed net violates a structural invariant
    InvalidNet(InvariantViolation),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidNet(violation) => {
                write!(f, "Discovered net is invalid: {violation}")
            }
        }
    }
}

impl From<InvariantViolation> for DiscoveryError {
    fn from(violation: InvariantViolation) -> Self {
        DiscoveryError::InvalidNet(violation)
    }
}

///
/// Discovery algorithm selection, including the algorithm parameters
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DiscoveryAlgorithm {
    /// Footprint-based Alpha Miner
    Alpha,
    /// Frequency-based Heuristics Miner
    Heuristics(HeuristicsConfig),
    /// Recursive-cut Inductive Miner
    Inductive(InductiveConfig),
}

///
/// Discover a [`PetriNet`] from an activity projection with the selected
/// algorithm
///
pub fn discover_petri_net(
    log_proj: &EventLogActivityProjection,
    algorithm: &DiscoveryAlgorithm,
) -> Result<PetriNet, DiscoveryError> {
    match algorithm {
        DiscoveryAlgorithm::Alpha => alpha_discover_petri_net(log_proj),
        DiscoveryAlgorithm::Heuristics(config) => heuristics_discover_petri_net(log_proj, config),
        DiscoveryAlgorithm::Inductive(config) => inductive_discover_petri_net(log_proj, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::event_log_struct::{EventLog, Trace};

    #[test]
    fn all_variants_discover_a_valid_net() {
        let mut log = EventLog::new();
        log.traces
            .push(Trace::from_activities("c1".to_string(), &["a", "b", "c"]));
        log.traces
            .push(Trace::from_activities("c2".to_string(), &["a", "b", "c"]));
        let proj: EventLogActivityProjection = (&log).into();

        for algorithm in [
            DiscoveryAlgorithm::Alpha,
            DiscoveryAlgorithm::Heuristics(HeuristicsConfig::default()),
            DiscoveryAlgorithm::Inductive(InductiveConfig::default()),
        ] {
            let net = discover_petri_net(&proj, &algorithm).unwrap();
            assert!(net.validate().is_ok());
            assert!(net.initial_marking.is_some());
            assert!(net.final_marking.is_some());
        }
    }
}
