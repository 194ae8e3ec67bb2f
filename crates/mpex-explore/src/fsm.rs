//! Immutable snapshot of the visible automaton.

use crate::explorer::Transition;
use mpex_term::Term;
use std::collections::{BTreeSet, VecDeque};

/// A pruned, immutable view of the explorer's visible state, suitable for
/// rendering or serialization. Derived on demand by
/// [`ExploredTransitions::get_fa`](crate::ExploredTransitions::get_fa);
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fsm {
    /// The initial node. Always present in `nodes`, even if isolated.
    pub initial: Term,
    /// Nodes with at least one incident visible transition, plus the initial.
    pub nodes: BTreeSet<Term>,
    /// The visible transition set.
    pub transitions: BTreeSet<Transition>,
    /// Visible accepting nodes.
    pub accepting: BTreeSet<Term>,
    /// Visible nodes violating the state invariant.
    pub unsafe_nodes: BTreeSet<Term>,
    /// `IsomorphicTo` grouping edges between visible nodes. Annotation only;
    /// never part of the automaton.
    pub grouping: BTreeSet<Transition>,
}

impl Fsm {
    /// Nodes with no path to any accepting node over visible transitions.
    ///
    /// Computed by backward reachability from the accepting set. With no
    /// accepting nodes in view, every node is dead.
    pub fn dead_nodes(&self) -> BTreeSet<Term> {
        let mut alive: BTreeSet<Term> = self.accepting.clone();
        let mut frontier: VecDeque<Term> = alive.iter().cloned().collect();
        while let Some(node) = frontier.pop_front() {
            for transition in &self.transitions {
                if transition.target == node && alive.insert(transition.source.clone()) {
                    frontier.push_back(transition.source.clone());
                }
            }
        }
        self.nodes.difference(&alive).cloned().collect()
    }
}
