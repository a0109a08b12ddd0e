use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Place in a Petri net
pub struct Place {
    /// Optional place name (purely descriptive)
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Transition in a Petri net
pub struct Transition {
    /// Transition label (None if this transition is _silent_)
    pub label: Option<String>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash)]
/// Index of a [`Place`] within its net
///
/// Indices are dense and stable: nets built the same way always assign the
/// same indices, so two nets can be compared for structural equality directly.
pub struct PlaceID(pub usize);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Hash)]
/// Index of a [`Transition`] within its net
pub struct TransitionID(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "nodes")]
/// Arc type in a Petri net
pub enum ArcType {
    /// From Place to Transition
    PlaceTransition(usize, usize),
    /// From Transition to Place
    TransitionPlace(usize, usize),
}

impl ArcType {
    /// Create new from place to transition
    pub fn place_to_transition(from: PlaceID, to: TransitionID) -> ArcType {
        ArcType::PlaceTransition(from.0, to.0)
    }
    /// Create new from transition to place
    pub fn transition_to_place(from: TransitionID, to: PlaceID) -> ArcType {
        ArcType::TransitionPlace(from.0, to.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Arc in a Petri net
///
/// Connecting a transition and a place (or the other way around)
pub struct Arc {
    /// Source and target of Arc
    pub from_to: ArcType,
    /// Weight (i.e., how many tokens this arc moves)
    pub weight: u32,
}

/// Marking of a Petri net: Assigning [`PlaceID`]s to a number of tokens
pub type Marking = HashMap<PlaceID, u64>;

#[derive(Debug, Clone)]
/// A structural invariant violated by a [`PetriNet`]
///
/// Any of these indicates a corrupted net construction and is fatal for
/// discovery.
pub enum InvariantViolation {
    /// An arc references a place or transition index outside the net
    DanglingArc {
        /// Index of the offending arc in [`PetriNet::arcs`]
        arc_index: usize,
        /// Source and target of the offending arc
        from_to: ArcType,
    },
    /// A transition has neither input nor output arcs
    IsolatedTransition(TransitionID),
    /// The initial or final marking references a place outside the net
    UnknownMarkingPlace(PlaceID),
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::DanglingArc { arc_index, from_to } => {
                write!(
                    f,
                    "Arc {arc_index} ({from_to:?}) references a non-existing place or transition"
                )
            }
            InvariantViolation::IsolatedTransition(t) => {
                write!(f, "Transition {} has no input or output arcs", t.0)
            }
            InvariantViolation::UnknownMarkingPlace(p) => {
                write!(f, "Marking references non-existing place {}", p.0)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
///
/// A Petri net of [`Place`]s and [`Transition`]s
///
/// Bipartite graph of [`Place`]s and [`Transition`]s with [`Arc`]s connecting
/// them, as well as an initial and a final [`Marking`]. Places and transitions
/// live in arenas and are referred to by their stable indices ([`PlaceID`],
/// [`TransitionID`]).
///
pub struct PetriNet {
    /// Places
    pub places: Vec<Place>,
    /// Transitions
    pub transitions: Vec<Transition>,
    /// Arcs
    pub arcs: Vec<Arc>,
    /// Initial marking
    pub initial_marking: Option<Marking>,
    /// Final marking
    pub final_marking: Option<Marking>,
}

impl PetriNet {
    /// Create new [`PetriNet`] with no places or transitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self).unwrap()
    }

    /// Add a place with an optional name
    pub fn add_place(&mut self, name: Option<String>) -> PlaceID {
        self.places.push(Place { name });
        PlaceID(self.places.len() - 1)
    }

    /// Add a transition with a label (`None` for a silent transition)
    pub fn add_transition(&mut self, label: Option<String>) -> TransitionID {
        self.transitions.push(Transition { label });
        TransitionID(self.transitions.len() - 1)
    }

    /// Add an arc
    pub fn add_arc(&mut self, from_to: ArcType, weight: Option<u32>) {
        self.arcs.push(Arc {
            from_to,
            weight: weight.unwrap_or(1),
        });
    }

    /// Get the preset of a [`PetriNet`] place
    pub fn preset_of_place(&self, p: PlaceID) -> Vec<TransitionID> {
        self.arcs
            .iter()
            .filter_map(|x: &Arc| match x.from_to {
                ArcType::TransitionPlace(from, to) if to == p.0 => Some(TransitionID(from)),
                _ => None,
            })
            .collect()
    }

    /// Get the preset of a [`PetriNet`] transition
    pub fn preset_of_transition(&self, t: TransitionID) -> Vec<PlaceID> {
        self.arcs
            .iter()
            .filter_map(|x: &Arc| match x.from_to {
                ArcType::PlaceTransition(from, to) if to == t.0 => Some(PlaceID(from)),
                _ => None,
            })
            .collect()
    }

    /// Get the postset of a [`PetriNet`] place
    pub fn postset_of_place(&self, p: PlaceID) -> Vec<TransitionID> {
        self.arcs
            .iter()
            .filter_map(|x: &Arc| match x.from_to {
                ArcType::PlaceTransition(from, to) if from == p.0 => Some(TransitionID(to)),
                _ => None,
            })
            .collect()
    }

    /// Get the postset of a [`PetriNet`] transition
    pub fn postset_of_transition(&self, t: TransitionID) -> Vec<PlaceID> {
        self.arcs
            .iter()
            .filter_map(|x: &Arc| match x.from_to {
                ArcType::TransitionPlace(from, to) if from == t.0 => Some(PlaceID(to)),
                _ => None,
            })
            .collect()
    }

    /// Find the first transition carrying the given label
    pub fn transition_by_label(&self, label: &str) -> Option<TransitionID> {
        self.transitions
            .iter()
            .position(|t| t.label.as_deref() == Some(label))
            .map(TransitionID)
    }

    /// Check if place is in the initial marking
    pub fn is_in_initial_marking(&self, p: &PlaceID) -> bool {
        self.initial_marking
            .as_ref()
            .is_some_and(|m| m.contains_key(p))
    }

    /// Check if place is in the final marking
    pub fn is_in_final_marking(&self, p: &PlaceID) -> bool {
        self.final_marking
            .as_ref()
            .is_some_and(|m| m.contains_key(p))
    }

    /// Check the structural invariants of the net
    ///
    /// Verifies that all arc endpoints exist, that no transition is isolated
    /// and that markings only reference existing places. Returns the first
    /// violation found.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for (arc_index, arc) in self.arcs.iter().enumerate() {
            let (p, t) = match arc.from_to {
                ArcType::PlaceTransition(from, to) => (from, to),
                ArcType::TransitionPlace(from, to) => (to, from),
            };
            if p >= self.places.len() || t >= self.transitions.len() {
                return Err(InvariantViolation::DanglingArc {
                    arc_index,
                    from_to: arc.from_to,
                });
            }
        }
        let mut connected = vec![false; self.transitions.len()];
        for arc in &self.arcs {
            match arc.from_to {
                ArcType::PlaceTransition(_, t) | ArcType::TransitionPlace(t, _) => {
                    connected[t] = true;
                }
            }
        }
        if let Some(t) = connected.iter().position(|c| !c) {
            return Err(InvariantViolation::IsolatedTransition(TransitionID(t)));
        }
        for marking in [&self.initial_marking, &self.final_marking]
            .into_iter()
            .flatten()
        {
            for p in marking.keys() {
                if p.0 >= self.places.len() {
                    return Err(InvariantViolation::UnknownMarkingPlace(*p));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn petri_nets() {
        let mut net = PetriNet::new();
        let p1 = net.add_place(None);
        let t1 = net.add_transition(Some("Have fun".into()));
        let t2 = net.add_transition(Some("Sleep".into()));
        net.add_arc(ArcType::place_to_transition(p1, t1), None);
        net.add_arc(ArcType::transition_to_place(t2, p1), None);

        assert!(net.postset_of_transition(t1).is_empty());
        assert!(net.preset_of_transition(t1) == vec![p1]);
        assert!(net.postset_of_place(p1) == vec![t1]);
        assert!(net.preset_of_place(p1) == vec![t2]);
        assert!(net.preset_of_transition(t2).is_empty());
        assert_eq!(net.transition_by_label("Sleep"), Some(t2));
        assert_eq!(net.transition_by_label("Work"), None);
        assert!(net.validate().is_ok());
    }

    #[test]
    fn validate_detects_dangling_arc() {
        let mut net = PetriNet::new();
        let p1 = net.add_place(None);
        net.add_transition(Some("a".into()));
        net.add_arc(ArcType::PlaceTransition(p1.0, 7), None);
        match net.validate() {
            Err(InvariantViolation::DanglingArc { arc_index: 0, .. }) => {}
            other => panic!("expected dangling arc violation, got {other:?}"),
        }
    }

    #[test]
    fn validate_detects_isolated_transition() {
        let mut net = PetriNet::new();
        let p1 = net.add_place(None);
        let t1 = net.add_transition(Some("a".into()));
        let t2 = net.add_transition(Some("b".into()));
        net.add_arc(ArcType::place_to_transition(p1, t1), None);
        match net.validate() {
            Err(InvariantViolation::IsolatedTransition(t)) => assert_eq!(t, t2),
            other => panic!("expected isolated transition violation, got {other:?}"),
        }
    }

    #[test]
    fn validate_detects_unknown_marking_place() {
        let mut net = PetriNet::new();
        let p1 = net.add_place(None);
        let t1 = net.add_transition(Some("a".into()));
        net.add_arc(ArcType::place_to_transition(p1, t1), None);
        net.initial_marking = Some(Marking::from([(PlaceID(3), 1)]));
        assert!(matches!(
            net.validate(),
            Err(InvariantViolation::UnknownMarkingPlace(PlaceID(3)))
        ));
    }

    #[test]
    fn serialize_roundtrip() {
        let mut net = PetriNet::new();
        let p1 = net.add_place(Some("source".into()));
        let t1 = net.add_transition(Some("a".into()));
        net.add_arc(ArcType::place_to_transition(p1, t1), None);
        net.initial_marking = Some(Marking::from([(p1, 1)]));

        let json = net.to_json();
        let read_back: PetriNet = serde_json::from_str(&json).unwrap();
        assert_eq!(net, read_back);
    }
}
