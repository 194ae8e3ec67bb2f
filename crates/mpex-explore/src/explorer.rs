//! Incremental exploration of a model program's state space.
//!
//! `ExploredTransitions` owns the growing node/transition sets for one
//! exploration session. States are discovered lazily: the model program is
//! only invoked for `(node, action)` pairs the caller asks to see, and every
//! result is memoized so re-querying a pair never re-invokes the oracle.
//! Synthetic nodes are integer literals assigned in discovery order; the
//! state↔node bijection deduplicates states reached via different paths.

use crate::fsm::Fsm;
use crate::program::{IsomorphismChecker, ModelProgram, ProgramError, TransitionProperties};
use ahash::AHashMap;
use mpex_term::{Symbol, Term};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, trace};

/// Symbol name of the non-automaton "is isomorphic to" grouping edges.
pub const ISOMORPHIC_TO: &str = "IsomorphicTo";

fn isomorphic_to_action() -> Term {
    Term::compound(Symbol::new(ISOMORPHIC_TO), Vec::new())
}

/// A directed, action-labeled edge between two nodes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Transition {
    pub source: Term,
    pub action: Term,
    pub target: Term,
}

impl Transition {
    pub fn new(source: Term, action: Term, target: Term) -> Self {
        Self {
            source,
            action,
            target,
        }
    }
}

/// Symmetry-reduction policy for isomorphic states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SymmetryReduction {
    /// No isomorphism checking; states deduplicate on structural equality only.
    #[default]
    Off,
    /// Isomorphic states stay visible; an `IsomorphicTo` grouping edge links
    /// each one to its canonical (first-seen) representative. The copies are
    /// not expanded further by reachability exploration.
    Annotate,
    /// Transitions into an isomorphic state are redirected to the canonical
    /// representative; the copy never becomes a node.
    Collapse,
}

impl SymmetryReduction {
    pub fn is_enabled(self) -> bool {
        !matches!(self, SymmetryReduction::Off)
    }
}

/// Exploration budgets and policy for one session.
///
/// The symmetry policy is fixed for the lifetime of the aggregate: memoized
/// exploration results are only valid under the policy they were computed
/// with, so changing it means constructing a new [`ExploredTransitions`].
#[derive(Clone, Debug)]
pub struct ExploreConfig {
    /// Visible-transition budget for the first `show_reachable` call.
    pub initial_budget: usize,
    /// Budget for every subsequent `show_reachable` call.
    pub per_step_budget: usize,
    pub symmetry: SymmetryReduction,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            initial_budget: 200,
            per_step_budget: 100,
            symmetry: SymmetryReduction::Off,
        }
    }
}

/// Exploration error.
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("unknown node {node}")]
    UnknownNode { node: Term },

    #[error(transparent)]
    Program(#[from] ProgramError),
}

pub type ExploreResult<T> = Result<T, ExploreError>;

/// Result of a bounded reachability exploration. Exhausting the budget is a
/// normal terminal condition, not an error; a non-empty frontier means the
/// caller can resume by calling `show_reachable` again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExploreOutcome {
    /// The frontier emptied within budget.
    Complete { transitions_added: usize },
    /// The visible-transition budget was reached with work remaining.
    BudgetReached {
        transitions_added: usize,
        frontier: usize,
    },
}

/// Memoized result of invoking the model program for one `(node, action)`.
#[derive(Clone, Debug)]
struct ExploredAction {
    target: Term,
    properties: TransitionProperties,
}

/// The incremental explorer for one model program.
///
/// Exclusively owned by one exploration session; operations are synchronous
/// and run to completion. `nodes`, `state_map` and the memo table grow
/// monotonically; `transitions` and `hidden_transitions` trade entries as the
/// caller expands and collapses the view.
pub struct ExploredTransitions<M: ModelProgram> {
    program: M,
    checker: Option<Box<dyn IsomorphismChecker<M::State>>>,
    config: ExploreConfig,
    /// All nodes ever created, in discovery order of their integer labels.
    nodes: BTreeSet<Term>,
    accepting_nodes: BTreeSet<Term>,
    /// Nodes whose state violates the state invariant.
    unsafe_nodes: BTreeSet<Term>,
    /// Nodes whose state fails the state filter; shown but never expanded.
    filtered_nodes: BTreeSet<Term>,
    /// Nodes created as isomorphic copies under `Annotate`; never expanded
    /// by `show_reachable` (explicit `show_outgoing` still works).
    reduced_nodes: BTreeSet<Term>,
    /// The currently visible transition set.
    transitions: BTreeSet<Transition>,
    /// Discovered then explicitly hidden; re-showing restores from here.
    hidden_transitions: BTreeSet<Transition>,
    /// Non-automaton `IsomorphicTo` annotation edges.
    grouping_transitions: BTreeSet<Transition>,
    state_map: AHashMap<Term, M::State>,
    node_map: AHashMap<M::State, Term>,
    /// Per source node, the memoized action→target results.
    actions_explored: AHashMap<Term, AHashMap<Term, ExploredAction>>,
    /// Visited states in first-seen order; the isomorphism checker scans this.
    visit_order: Vec<M::State>,
    next_node: i64,
    initial_node: Term,
    first_exploration_done: bool,
}

impl<M: ModelProgram> ExploredTransitions<M> {
    /// Create an explorer seeded with node 0 = the program's initial state.
    /// No transitions are discovered yet.
    pub fn new(program: M, config: ExploreConfig) -> Self {
        Self::build(program, config, None)
    }

    /// Create an explorer with an isomorphism checker for symmetry reduction.
    pub fn with_isomorphism_checker(
        program: M,
        config: ExploreConfig,
        checker: Box<dyn IsomorphismChecker<M::State>>,
    ) -> Self {
        Self::build(program, config, Some(checker))
    }

    fn build(
        program: M,
        config: ExploreConfig,
        checker: Option<Box<dyn IsomorphismChecker<M::State>>>,
    ) -> Self {
        let initial_state = program.initial_state();
        let mut this = Self {
            program,
            checker,
            config,
            nodes: BTreeSet::new(),
            accepting_nodes: BTreeSet::new(),
            unsafe_nodes: BTreeSet::new(),
            filtered_nodes: BTreeSet::new(),
            reduced_nodes: BTreeSet::new(),
            transitions: BTreeSet::new(),
            hidden_transitions: BTreeSet::new(),
            grouping_transitions: BTreeSet::new(),
            state_map: AHashMap::new(),
            node_map: AHashMap::new(),
            actions_explored: AHashMap::new(),
            visit_order: Vec::new(),
            next_node: 0,
            initial_node: Term::int(0),
            first_exploration_done: false,
        };
        this.initial_node = this.intern_state(initial_state);
        this
    }

    /// The synthetic node of the initial state. Always `Literal(0)`.
    pub fn initial_node(&self) -> &Term {
        &self.initial_node
    }

    pub fn nodes(&self) -> &BTreeSet<Term> {
        &self.nodes
    }

    pub fn accepting_nodes(&self) -> &BTreeSet<Term> {
        &self.accepting_nodes
    }

    pub fn transitions(&self) -> &BTreeSet<Transition> {
        &self.transitions
    }

    pub fn hidden_transitions(&self) -> &BTreeSet<Transition> {
        &self.hidden_transitions
    }

    pub fn grouping_transitions(&self) -> &BTreeSet<Transition> {
        &self.grouping_transitions
    }

    /// The opaque model state behind a synthetic node.
    pub fn node_state(&self, node: &Term) -> Option<&M::State> {
        self.state_map.get(node)
    }

    /// The synthetic node of an already-discovered state.
    pub fn state_node(&self, state: &M::State) -> Option<&Term> {
        self.node_map.get(state)
    }

    /// Memoized transition properties for a resolved `(node, action)` pair.
    pub fn transition_properties(
        &self,
        source: &Term,
        action: &Term,
    ) -> Option<&TransitionProperties> {
        self.actions_explored
            .get(source)?
            .get(action)
            .map(|e| &e.properties)
    }

    /// Assign a node to a state, or return the existing one.
    fn intern_state(&mut self, state: M::State) -> Term {
        if let Some(node) = self.node_map.get(&state) {
            return node.clone();
        }
        let node = Term::int(self.next_node);
        self.next_node += 1;
        if self.program.is_accepting(&state) {
            self.accepting_nodes.insert(node.clone());
        }
        if !self.program.satisfies_state_invariant(&state) {
            self.unsafe_nodes.insert(node.clone());
        }
        if !self.program.satisfies_state_filter(&state) {
            self.filtered_nodes.insert(node.clone());
        }
        trace!(node = %node, state = ?state, "discovered state");
        self.nodes.insert(node.clone());
        self.state_map.insert(node.clone(), state.clone());
        self.node_map.insert(state.clone(), node.clone());
        self.visit_order.push(state);
        node
    }

    /// Resolve `(source, action)` and make the transition visible.
    ///
    /// Idempotent: a memoized pair never re-invokes the model program; the
    /// transition is restored from `hidden_transitions` if it was hidden.
    pub fn show_transition(&mut self, source: &Term, action: &Term) -> ExploreResult<Term> {
        if let Some(entry) = self.actions_explored.get(source).and_then(|m| m.get(action)) {
            let target = entry.target.clone();
            let transition = Transition::new(source.clone(), action.clone(), target.clone());
            self.hidden_transitions.remove(&transition);
            self.transitions.insert(transition);
            return Ok(target);
        }

        let Some(state) = self.state_map.get(source).cloned() else {
            return Err(ExploreError::UnknownNode {
                node: source.clone(),
            });
        };
        let (target_state, properties) = self.program.get_target_state(&state, action)?;
        let target = self.resolve_target(target_state)?;
        trace!(source = %source, action = %action, target = %target, "explored transition");

        self.actions_explored
            .entry(source.clone())
            .or_default()
            .insert(
                action.clone(),
                ExploredAction {
                    target: target.clone(),
                    properties,
                },
            );
        let transition = Transition::new(source.clone(), action.clone(), target.clone());
        self.hidden_transitions.remove(&transition);
        self.transitions.insert(transition);
        Ok(target)
    }

    /// Map a freshly computed successor state to a node, applying the
    /// symmetry-reduction policy for states not seen before.
    fn resolve_target(&mut self, target_state: M::State) -> ExploreResult<Term> {
        if let Some(node) = self.node_map.get(&target_state) {
            return Ok(node.clone());
        }
        if !self.config.symmetry.is_enabled() {
            return Ok(self.intern_state(target_state));
        }

        let checker = self.checker.as_deref().ok_or_else(|| {
            ProgramError::fault("symmetry reduction enabled without an isomorphism checker")
        })?;
        let isomorphic = checker.has_isomorphic(&target_state, &mut self.visit_order.iter())?;
        match isomorphic {
            None => Ok(self.intern_state(target_state)),
            Some(canonical) => {
                let canonical_node = self.node_map.get(&canonical).cloned().ok_or_else(|| {
                    ProgramError::fault("isomorphism checker returned an unvisited state")
                })?;
                match self.config.symmetry {
                    SymmetryReduction::Collapse => {
                        debug!(canonical = %canonical_node, "collapsed isomorphic state");
                        Ok(canonical_node)
                    }
                    SymmetryReduction::Annotate => {
                        let node = self.intern_state(target_state);
                        debug!(node = %node, canonical = %canonical_node, "annotated isomorphic state");
                        self.reduced_nodes.insert(node.clone());
                        self.grouping_transitions.insert(Transition::new(
                            node.clone(),
                            isomorphic_to_action(),
                            canonical_node,
                        ));
                        Ok(node)
                    }
                    SymmetryReduction::Off => unreachable!("is_enabled checked above"),
                }
            }
        }
    }

    /// Enabled actions of a node's state, grouped per potentially enabled
    /// action symbol.
    fn enabled_actions(&self, state: &M::State) -> Result<SmallVec<[Term; 8]>, ProgramError> {
        let mut actions = SmallVec::new();
        for symbol in self.program.potentially_enabled_action_symbols(state) {
            actions.extend(self.program.get_actions(state, &symbol)?);
        }
        Ok(actions)
    }

    /// Show every enabled transition out of `node`.
    ///
    /// The resulting transition set is independent of the model program's
    /// enumeration order.
    pub fn show_outgoing(&mut self, node: &Term) -> ExploreResult<()> {
        let Some(state) = self.state_map.get(node).cloned() else {
            return Err(ExploreError::UnknownNode { node: node.clone() });
        };
        for action in self.enabled_actions(&state)? {
            self.show_transition(node, &action)?;
        }
        Ok(())
    }

    /// Bounded breadth-first expansion from `node`.
    ///
    /// Expands nodes until the frontier empties or the visible transition
    /// set has grown by the budget (`initial_budget` on the first call of
    /// the session, `per_step_budget` thereafter), so a caller can resume a
    /// budget-bounded exploration by calling again. Nodes failing the state
    /// filter and isomorphic copies under `Annotate` are never expanded;
    /// the explicitly requested start node is expanded regardless of filter.
    pub fn show_reachable(&mut self, node: &Term) -> ExploreResult<ExploreOutcome> {
        if !self.state_map.contains_key(node) {
            return Err(ExploreError::UnknownNode { node: node.clone() });
        }
        let before = self.transitions.len();
        let budget = before
            + if self.first_exploration_done {
                self.config.per_step_budget
            } else {
                self.config.initial_budget
            };
        self.first_exploration_done = true;

        let mut frontier = VecDeque::new();
        let mut visited = HashSet::new();
        frontier.push_back(node.clone());
        visited.insert(node.clone());

        while let Some(current) = frontier.pop_front() {
            if current != *node
                && (self.filtered_nodes.contains(&current) || self.reduced_nodes.contains(&current))
            {
                continue;
            }
            // The state is always known here: frontier nodes come from
            // show_transition results or from the checked start node.
            let Some(state) = self.state_map.get(&current).cloned() else {
                return Err(ExploreError::UnknownNode { node: current });
            };
            for action in self.enabled_actions(&state)? {
                if self.transitions.len() >= budget {
                    let frontier_len = frontier.len() + 1;
                    debug!(
                        limit = budget,
                        frontier = frontier_len,
                        added = self.transitions.len() - before,
                        "exploration budget reached"
                    );
                    return Ok(ExploreOutcome::BudgetReached {
                        transitions_added: self.transitions.len() - before,
                        frontier: frontier_len,
                    });
                }
                let target = self.show_transition(&current, &action)?;
                if visited.insert(target.clone()) {
                    frontier.push_back(target);
                }
            }
        }

        let added = self.transitions.len() - before;
        debug!(added, total = self.transitions.len(), "exploration complete");
        Ok(ExploreOutcome::Complete {
            transitions_added: added,
        })
    }

    /// Move every visible transition matching the predicate to the hidden
    /// set. Returns the number of transitions hidden.
    fn hide_matching(&mut self, predicate: impl Fn(&Transition) -> bool) -> usize {
        let hidden: Vec<Transition> = self
            .transitions
            .iter()
            .filter(|t| predicate(t))
            .cloned()
            .collect();
        let count = hidden.len();
        for transition in hidden {
            self.transitions.remove(&transition);
            self.hidden_transitions.insert(transition);
        }
        count
    }

    /// Hide the transition for one `(node, action)` pair. Idempotent; the
    /// memoized target survives for a later re-show.
    pub fn hide_transition(&mut self, node: &Term, action: &Term) -> usize {
        self.hide_matching(|t| t.source == *node && t.action == *action)
    }

    /// Hide every visible transition out of `node`.
    pub fn hide_outgoing(&mut self, node: &Term) -> usize {
        self.hide_matching(|t| t.source == *node)
    }

    /// Hide every visible transition out of `node` whose action is headed by
    /// `symbol`.
    pub fn hide_all(&mut self, node: &Term, symbol: &Symbol) -> usize {
        self.hide_matching(|t| t.source == *node && t.action.symbol() == Some(symbol))
    }

    /// Hide every transition on every path forward from `node`.
    ///
    /// The traversal follows the union of visible and hidden transitions, so
    /// descendants whose edges were hidden earlier stay covered: a later
    /// show from an ancestor does not resurrect them. Returns the number of
    /// transitions hidden, or [`ExploreError::UnknownNode`] for an
    /// undiscovered start node.
    pub fn hide_reachable(&mut self, node: &Term) -> ExploreResult<usize> {
        if !self.state_map.contains_key(node) {
            return Err(ExploreError::UnknownNode { node: node.clone() });
        }
        let mut count = 0;
        let mut frontier = VecDeque::new();
        let mut visited = HashSet::new();
        frontier.push_back(node.clone());
        visited.insert(node.clone());

        while let Some(current) = frontier.pop_front() {
            let outgoing: Vec<Transition> = self
                .transitions
                .iter()
                .chain(self.hidden_transitions.iter())
                .filter(|t| t.source == current)
                .cloned()
                .collect();
            for transition in outgoing {
                if self.transitions.remove(&transition) {
                    self.hidden_transitions.insert(transition.clone());
                    count += 1;
                }
                if visited.insert(transition.target.clone()) {
                    frontier.push_back(transition.target);
                }
            }
        }
        debug!(node = %node, count, "hid reachable transitions");
        Ok(count)
    }

    /// Derive an immutable snapshot of the visible automaton.
    ///
    /// Nodes with no incident visible transition are pruned, except the
    /// initial node, which is always retained.
    pub fn get_fa(&self) -> Fsm {
        let mut visible: BTreeSet<Term> = BTreeSet::new();
        visible.insert(self.initial_node.clone());
        for transition in &self.transitions {
            visible.insert(transition.source.clone());
            visible.insert(transition.target.clone());
        }
        let grouping = self
            .grouping_transitions
            .iter()
            .filter(|t| visible.contains(&t.source) && visible.contains(&t.target))
            .cloned()
            .collect();
        Fsm {
            initial: self.initial_node.clone(),
            accepting: self
                .accepting_nodes
                .intersection(&visible)
                .cloned()
                .collect(),
            unsafe_nodes: self.unsafe_nodes.intersection(&visible).cloned().collect(),
            transitions: self.transitions.clone(),
            grouping,
            nodes: visible,
        }
    }
}
