//! The model-program oracle interface consumed by the explorer.

use mpex_term::{Symbol, Term};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Error raised by a model program or isomorphism checker.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The action is not applicable in the given source state.
    #[error("action {action} is not enabled in the source state")]
    ActionNotEnabled { action: Term },

    /// Any other failure inside the oracle. Propagated to the caller of the
    /// triggering explore command; previously discovered state stays valid.
    #[error("model program fault: {message}")]
    Fault { message: String },
}

impl ProgramError {
    /// Convenience constructor for oracle-side failures.
    pub fn fault(message: impl Into<String>) -> Self {
        ProgramError::Fault {
            message: message.into(),
        }
    }
}

/// Named annotation terms a model program attaches to a transition,
/// e.g. probabilities, coverage points, or timing requirements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionProperties {
    pub properties: BTreeMap<Symbol, Vec<Term>>,
}

impl TransitionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one property term under the given key.
    pub fn add(&mut self, key: Symbol, value: Term) {
        self.properties.entry(key).or_default().push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A state transition oracle: exposes a labeled transition system through
/// queries without materializing it.
///
/// Precondition: every operation must be a pure function of its arguments.
/// Repeated calls with equal states and actions must yield equal results.
/// The explorer memoizes `get_target_state` results per `(state, action)`
/// pair and never re-invokes the oracle for a pair it has already resolved,
/// so a stateful oracle would silently desynchronize from the explorer.
pub trait ModelProgram {
    /// Opaque state values. Equality must be structural (value semantics):
    /// two states reached via different paths deduplicate iff they are equal.
    type State: Clone + Eq + Hash + fmt::Debug;

    /// The initial state of the transition system.
    fn initial_state(&self) -> Self::State;

    /// Whether the state is accepting.
    fn is_accepting(&self, state: &Self::State) -> bool;

    /// Whether the state satisfies the state invariant. Violating states are
    /// still explored but flagged as unsafe.
    fn satisfies_state_invariant(&self, state: &Self::State) -> bool;

    /// Whether the state satisfies the state filter. States failing the
    /// filter are shown but never expanded by reachability exploration.
    fn satisfies_state_filter(&self, state: &Self::State) -> bool;

    /// Action symbols that may have enabled instances in the state.
    /// Over-approximation is fine; `get_actions` decides per instance.
    fn potentially_enabled_action_symbols(&self, state: &Self::State) -> BTreeSet<Symbol>;

    /// Concrete enabled action instances under the given symbol.
    /// Every returned term is ground and headed by `symbol`.
    /// Enumeration order is unspecified.
    fn get_actions(&self, state: &Self::State, symbol: &Symbol)
        -> Result<Vec<Term>, ProgramError>;

    /// The successor state and transition properties for an enabled action.
    /// Fails with [`ProgramError::ActionNotEnabled`] if the action is not
    /// actually applicable in `state`.
    fn get_target_state(
        &self,
        state: &Self::State,
        action: &Term,
    ) -> Result<(Self::State, TransitionProperties), ProgramError>;
}

impl<M: ModelProgram + ?Sized> ModelProgram for Box<M> {
    type State = M::State;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn is_accepting(&self, state: &Self::State) -> bool {
        (**self).is_accepting(state)
    }

    fn satisfies_state_invariant(&self, state: &Self::State) -> bool {
        (**self).satisfies_state_invariant(state)
    }

    fn satisfies_state_filter(&self, state: &Self::State) -> bool {
        (**self).satisfies_state_filter(state)
    }

    fn potentially_enabled_action_symbols(&self, state: &Self::State) -> BTreeSet<Symbol> {
        (**self).potentially_enabled_action_symbols(state)
    }

    fn get_actions(
        &self,
        state: &Self::State,
        symbol: &Symbol,
    ) -> Result<Vec<Term>, ProgramError> {
        (**self).get_actions(state, symbol)
    }

    fn get_target_state(
        &self,
        state: &Self::State,
        action: &Term,
    ) -> Result<(Self::State, TransitionProperties), ProgramError> {
        (**self).get_target_state(state, action)
    }
}

/// Decides whether a state is isomorphic to an already-visited one,
/// i.e. identical up to renaming of anonymous identities.
///
/// Consulted only when symmetry reduction is enabled. If the checker cannot
/// decide it must fail with an error; it must never default to "not
/// isomorphic" — that substitution would silently change which states the
/// explorer collapses.
pub trait IsomorphismChecker<S> {
    /// Return the first visited state isomorphic to `state`, if any.
    fn has_isomorphic<'a>(
        &self,
        state: &S,
        visited: &mut dyn Iterator<Item = &'a S>,
    ) -> Result<Option<S>, ProgramError>
    where
        S: 'a;
}
