#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]
#![doc = include_str!("../README.md")]

///
/// Event logs and their activity projections
///
pub mod event_log {
    /// Activity projection of event logs
    pub mod activity_projection;
    /// [`EventLog`] struct and sub-structs
    pub mod event_log_struct;

    pub use event_log_struct::{Event, EventLog, LifecycleTransition, Trace};
}

///
/// Directly-follows graphs and footprint relations
///
pub mod dfg {
    /// [`DirectlyFollowsGraph`] struct
    pub mod dfg_struct;
    /// Footprint relations (causal/parallel/choice) derived from a DFG
    pub mod footprint;

    #[doc(inline)]
    pub use dfg_struct::DirectlyFollowsGraph;
    #[doc(inline)]
    pub use footprint::Footprint;
}

///
/// Petri nets
///
pub mod petri_net {
    /// [`PetriNet`] struct
    pub mod petri_net_struct;

    #[doc(inline)]
    pub use petri_net_struct::PetriNet;
}

///
/// Process trees
///
pub mod process_tree {
    /// [`ProcessTree`] struct
    pub mod process_tree_struct;

    #[doc(inline)]
    pub use process_tree_struct::ProcessTree;
}

///
/// Process discovery algorithms
///
pub mod discovery {
    /// Alpha Miner (footprint-based discovery)
    pub mod alpha;
    /// Heuristics Miner (frequency/dependency-based discovery)
    pub mod heuristics;
    /// Inductive Miner (recursive-cut discovery via process trees)
    pub mod inductive;
    /// Selecting a discovery algorithm by value
    pub mod variants;

    #[doc(inline)]
    pub use variants::{discover_petri_net, DiscoveryAlgorithm, DiscoveryError};
}

///
/// Conformance checking and model evaluation
///
pub mod conformance {
    /// Fitness/precision/generalization/simplicity metrics
    pub mod evaluation;
    /// Token-based replay
    pub mod token_based_replay;
}

#[doc(inline)]
pub use event_log::event_log_struct::EventLog;

#[doc(inline)]
pub use event_log::activity_projection::EventLogActivityProjection;

#[doc(inline)]
pub use dfg::dfg_struct::DirectlyFollowsGraph;

#[doc(inline)]
pub use petri_net::petri_net_struct::PetriNet;

#[doc(inline)]
pub use process_tree::process_tree_struct::ProcessTree;

#[doc(inline)]
pub use discovery::alpha::alpha_discover_petri_net;

#[doc(inline)]
pub use discovery::alpha::alpha_discover_petri_net_from_log;

#[doc(inline)]
pub use discovery::heuristics::heuristics_discover_petri_net;

#[doc(inline)]
pub use discovery::inductive::inductive_discover_petri_net;

#[doc(inline)]
pub use discovery::inductive::inductive_discover_process_tree;

#[doc(inline)]
pub use discovery::variants::discover_petri_net;

#[doc(inline)]
pub use conformance::token_based_replay::replay_log;

#[doc(inline)]
pub use conformance::evaluation::evaluate;

///
/// Serialize a [`PetriNet`] as a JSON [`String`]
///
pub fn petrinet_to_json(net: &PetriNet) -> String {
    serde_json::to_string(net).unwrap()
}

///
/// Deserialize a [`PetriNet`] from a JSON [`String`]
///
pub fn json_to_petrinet(net_json: &str) -> PetriNet {
    serde_json::from_str(net_json).unwrap()
}
