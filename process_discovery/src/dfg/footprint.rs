use serde::{Deserialize, Serialize};

use super::dfg_struct::DirectlyFollowsGraph;

///
/// Footprint relation between an ordered pair of activities
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Neither activity ever directly follows the other
    Choice,
    /// `a` directly precedes `b`, but never the other way around
    Causal,
    /// `b` directly precedes `a`, but never the other way around
    ReverseCausal,
    /// Both directions observed
    Parallel,
}

///
/// Footprint matrix: the [`Relation`] for every ordered pair of activities
///
/// Derived once from a [`DirectlyFollowsGraph`] over the full projection
/// alphabet.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Footprint {
    /// Size of the activity alphabet
    pub num_activities: usize,
    /// Relations in row-major order (`a * num_activities + b`)
    pub relations: Vec<Relation>,
}

impl Footprint {
    /// Derive the footprint relations from a directly-follows graph
    pub fn from_dfg(dfg: &DirectlyFollowsGraph) -> Self {
        let n = dfg.activity_counts.len();
        let mut relations = Vec::with_capacity(n * n);
        for a in 0..n {
            for b in 0..n {
                let forward = dfg.df_between(a, b);
                let backward = dfg.df_between(b, a);
                relations.push(match (forward > 0, backward > 0) {
                    (false, false) => Relation::Choice,
                    (true, false) => Relation::Causal,
                    (false, true) => Relation::ReverseCausal,
                    (true, true) => Relation::Parallel,
                });
            }
        }
        Footprint {
            num_activities: n,
            relations,
        }
    }

    /// Relation between the ordered activity pair `(a, b)`
    pub fn relation_between(&self, a: usize, b: usize) -> Relation {
        self.relations[a * self.num_activities + b]
    }

    /// All activity pairs `(a, b)` with `a` causally preceding `b`
    pub fn causal_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for a in 0..self.num_activities {
            for b in 0..self.num_activities {
                if self.relation_between(a, b) == Relation::Causal {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }
}
