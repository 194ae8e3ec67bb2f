//! Built-in demonstration model programs.
//!
//! All of them use `Term` as the opaque state type so they can live behind
//! the registry's trait objects.

use ahash::AHashMap;
use mpex_explore::{IsomorphismChecker, ModelProgram, ProgramError, TransitionProperties};
use mpex_term::{Literal, Symbol, Term};
use std::collections::BTreeSet;

fn state0(name: &str) -> Term {
    Term::compound(Symbol::new(name), vec![])
}

fn action(name: &str, args: Vec<Term>) -> Term {
    Term::compound(Symbol::new(name), args)
}

/// A bounded counter: `Inc()` up to `max`, `Dec()` down to zero.
/// Accepting at zero.
pub struct Counter {
    pub max: i64,
}

impl ModelProgram for Counter {
    type State = Term;

    fn initial_state(&self) -> Term {
        Term::int(0)
    }

    fn is_accepting(&self, state: &Term) -> bool {
        state.as_int() == Some(0)
    }

    fn satisfies_state_invariant(&self, state: &Term) -> bool {
        state.as_int().is_some_and(|n| (0..=self.max).contains(&n))
    }

    fn satisfies_state_filter(&self, _state: &Term) -> bool {
        true
    }

    fn potentially_enabled_action_symbols(&self, _state: &Term) -> BTreeSet<Symbol> {
        [Symbol::new("Inc"), Symbol::new("Dec")].into_iter().collect()
    }

    fn get_actions(&self, state: &Term, symbol: &Symbol) -> Result<Vec<Term>, ProgramError> {
        let n = value_of(state)?;
        let enabled = match symbol.name() {
            "Inc" => n < self.max,
            "Dec" => n > 0,
            _ => false,
        };
        Ok(if enabled {
            vec![action(symbol.name(), vec![])]
        } else {
            vec![]
        })
    }

    fn get_target_state(
        &self,
        state: &Term,
        action: &Term,
    ) -> Result<(Term, TransitionProperties), ProgramError> {
        let n = value_of(state)?;
        let next = match action.symbol().map(|s| s.name()) {
            Some("Inc") if n < self.max => n + 1,
            Some("Dec") if n > 0 => n - 1,
            _ => {
                return Err(ProgramError::ActionNotEnabled {
                    action: action.clone(),
                })
            }
        };
        Ok((Term::int(next), TransitionProperties::new()))
    }
}

fn value_of(state: &Term) -> Result<i64, ProgramError> {
    state
        .as_int()
        .ok_or_else(|| ProgramError::fault(format!("counter state is not an integer: {}", state)))
}

/// A request/response server: `Req_Start(i)` moves from `Idle()` to
/// `Pending(i)`, `Req_Finish(i)` returns to `Idle()`. The start/finish pairs
/// exercise the Mealy display merge.
pub struct ClientServer {
    pub clients: i64,
}

impl ClientServer {
    fn pending_of(state: &Term) -> Option<i64> {
        match state.symbol() {
            Some(symbol) if symbol.name() == "Pending" => state.args().first()?.as_int(),
            _ => None,
        }
    }
}

impl ModelProgram for ClientServer {
    type State = Term;

    fn initial_state(&self) -> Term {
        state0("Idle")
    }

    fn is_accepting(&self, state: &Term) -> bool {
        state == &state0("Idle")
    }

    fn satisfies_state_invariant(&self, _state: &Term) -> bool {
        true
    }

    fn satisfies_state_filter(&self, _state: &Term) -> bool {
        true
    }

    fn potentially_enabled_action_symbols(&self, state: &Term) -> BTreeSet<Symbol> {
        if state == &state0("Idle") {
            [Symbol::new("Req_Start")].into_iter().collect()
        } else {
            [Symbol::new("Req_Finish")].into_iter().collect()
        }
    }

    fn get_actions(&self, state: &Term, symbol: &Symbol) -> Result<Vec<Term>, ProgramError> {
        match symbol.name() {
            "Req_Start" if state == &state0("Idle") => Ok((1..=self.clients)
                .map(|i| action("Req_Start", vec![Term::int(i)]))
                .collect()),
            "Req_Finish" => Ok(Self::pending_of(state)
                .map(|i| action("Req_Finish", vec![Term::int(i)]))
                .into_iter()
                .collect()),
            _ => Ok(vec![]),
        }
    }

    fn get_target_state(
        &self,
        state: &Term,
        act: &Term,
    ) -> Result<(Term, TransitionProperties), ProgramError> {
        let args = act.args();
        match act.symbol().map(|s| s.name()) {
            Some("Req_Start") if state == &state0("Idle") => {
                let id = args
                    .first()
                    .and_then(Term::as_int)
                    .filter(|i| (1..=self.clients).contains(i))
                    .ok_or_else(|| ProgramError::ActionNotEnabled { action: act.clone() })?;
                let mut properties = TransitionProperties::new();
                properties.add(Symbol::new("client"), Term::int(id));
                Ok((
                    Term::compound(Symbol::new("Pending"), vec![Term::int(id)]),
                    properties,
                ))
            }
            Some("Req_Finish") => {
                let pending = Self::pending_of(state);
                let id = args.first().and_then(Term::as_int);
                if pending.is_some() && pending == id {
                    Ok((state0("Idle"), TransitionProperties::new()))
                } else {
                    Err(ProgramError::ActionNotEnabled { action: act.clone() })
                }
            }
            _ => Err(ProgramError::ActionNotEnabled { action: act.clone() }),
        }
    }
}

/// A pool of interchangeable clients: `Spawn(i)` adds client `i`, `Stop(i)`
/// removes it. States differing only in which ids are alive are isomorphic,
/// which makes this the symmetry-reduction demo.
pub struct Spawner {
    pub pool: i64,
}

impl Spawner {
    fn alive(state: &Term) -> Vec<i64> {
        state.args().iter().filter_map(Term::as_int).collect()
    }

    fn clients_state(mut alive: Vec<i64>) -> Term {
        alive.sort_unstable();
        Term::compound(Symbol::new("Clients"), alive.into_iter().map(Term::int).collect())
    }
}

impl ModelProgram for Spawner {
    type State = Term;

    fn initial_state(&self) -> Term {
        Self::clients_state(vec![])
    }

    fn is_accepting(&self, state: &Term) -> bool {
        state.args().is_empty()
    }

    fn satisfies_state_invariant(&self, state: &Term) -> bool {
        Self::alive(state).len() as i64 <= self.pool
    }

    fn satisfies_state_filter(&self, _state: &Term) -> bool {
        true
    }

    fn potentially_enabled_action_symbols(&self, _state: &Term) -> BTreeSet<Symbol> {
        [Symbol::new("Spawn"), Symbol::new("Stop")].into_iter().collect()
    }

    fn get_actions(&self, state: &Term, symbol: &Symbol) -> Result<Vec<Term>, ProgramError> {
        let alive = Self::alive(state);
        Ok(match symbol.name() {
            "Spawn" => (1..=self.pool)
                .filter(|i| !alive.contains(i))
                .map(|i| action("Spawn", vec![Term::int(i)]))
                .collect(),
            "Stop" => alive
                .iter()
                .map(|&i| action("Stop", vec![Term::int(i)]))
                .collect(),
            _ => vec![],
        })
    }

    fn get_target_state(
        &self,
        state: &Term,
        act: &Term,
    ) -> Result<(Term, TransitionProperties), ProgramError> {
        let mut alive = Self::alive(state);
        let id = act
            .args()
            .first()
            .and_then(Term::as_int)
            .ok_or_else(|| ProgramError::ActionNotEnabled { action: act.clone() })?;
        match act.symbol().map(|s| s.name()) {
            Some("Spawn") if (1..=self.pool).contains(&id) && !alive.contains(&id) => {
                alive.push(id);
                Ok((Self::clients_state(alive), TransitionProperties::new()))
            }
            Some("Stop") if alive.contains(&id) => {
                alive.retain(|&i| i != id);
                Ok((Self::clients_state(alive), TransitionProperties::new()))
            }
            _ => Err(ProgramError::ActionNotEnabled { action: act.clone() }),
        }
    }
}

/// Decides isomorphism by renaming integer identities in first-occurrence
/// order: two states are isomorphic iff they are equal after the renaming.
pub struct RenamingChecker;

fn canonicalize(term: &Term) -> Term {
    fn walk(term: &Term, renaming: &mut AHashMap<i64, i64>) -> Term {
        match term {
            Term::Literal(Literal::Int(n)) => {
                let next = renaming.len() as i64;
                Term::int(*renaming.entry(*n).or_insert(next))
            }
            Term::Literal(_) | Term::Variable(_) => term.clone(),
            Term::Compound(symbol, args) => Term::compound(
                symbol.clone(),
                args.iter().map(|a| walk(a, renaming)).collect(),
            ),
        }
    }
    walk(term, &mut AHashMap::new())
}

impl IsomorphismChecker<Term> for RenamingChecker {
    fn has_isomorphic<'a>(
        &self,
        state: &Term,
        mut visited: &mut dyn Iterator<Item = &'a Term>,
    ) -> Result<Option<Term>, ProgramError>
    where
        Term: 'a,
    {
        let wanted = canonicalize(state);
        Ok((&mut visited).find(|s| canonicalize(s) == wanted).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpex_explore::{ExploreConfig, ExploreOutcome, ExploredTransitions, SymmetryReduction};

    #[test]
    fn counter_explores_to_completion() {
        let mut explorer = ExploredTransitions::new(Counter { max: 3 }, ExploreConfig::default());
        let initial = explorer.initial_node().clone();
        let outcome = explorer.show_reachable(&initial).unwrap();
        assert!(matches!(outcome, ExploreOutcome::Complete { .. }));
        assert_eq!(explorer.nodes().len(), 4);
        // Inc everywhere but the top, Dec everywhere but the bottom.
        assert_eq!(explorer.transitions().len(), 6);
        assert_eq!(explorer.accepting_nodes().len(), 1);
    }

    #[test]
    fn client_server_pairs_start_and_finish() {
        let mut explorer =
            ExploredTransitions::new(ClientServer { clients: 2 }, ExploreConfig::default());
        let initial = explorer.initial_node().clone();
        explorer.show_reachable(&initial).unwrap();
        // Idle + one Pending per client.
        assert_eq!(explorer.nodes().len(), 3);
        assert_eq!(explorer.transitions().len(), 4);
    }

    #[test]
    fn transition_properties_are_memoized_and_survive_hiding() {
        let mut explorer =
            ExploredTransitions::new(ClientServer { clients: 2 }, ExploreConfig::default());
        let initial = explorer.initial_node().clone();
        let start = action("Req_Start", vec![Term::int(1)]);
        explorer.show_transition(&initial, &start).unwrap();

        let client = Symbol::new("client");
        let props = explorer.transition_properties(&initial, &start).unwrap();
        assert_eq!(props.properties.get(&client), Some(&vec![Term::int(1)]));

        // Hiding removes the edge from view but not the memoized annotation.
        assert_eq!(explorer.hide_outgoing(&initial), 1);
        let props = explorer.transition_properties(&initial, &start).unwrap();
        assert_eq!(props.properties.get(&client), Some(&vec![Term::int(1)]));

        // Unresolved pairs have no properties.
        let other = action("Req_Start", vec![Term::int(2)]);
        assert!(explorer.transition_properties(&initial, &other).is_none());
    }

    #[test]
    fn renaming_checker_identifies_interchangeable_clients() {
        let one = Term::compound(Symbol::new("Clients"), vec![Term::int(1)]);
        let two = Term::compound(Symbol::new("Clients"), vec![Term::int(2)]);
        let both = Term::compound(Symbol::new("Clients"), vec![Term::int(1), Term::int(2)]);
        let visited = vec![one.clone()];
        let found = RenamingChecker
            .has_isomorphic(&two, &mut visited.iter())
            .unwrap();
        assert_eq!(found, Some(one.clone()));
        let found = RenamingChecker
            .has_isomorphic(&both, &mut visited.iter())
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn spawner_collapses_under_symmetry() {
        let config = ExploreConfig {
            symmetry: SymmetryReduction::Collapse,
            ..Default::default()
        };
        let mut explorer = ExploredTransitions::with_isomorphism_checker(
            Spawner { pool: 3 },
            config,
            Box::new(RenamingChecker),
        );
        let initial = explorer.initial_node().clone();
        explorer.show_reachable(&initial).unwrap();
        // Without reduction there are 8 subsets; collapsed there is one node
        // per pool size.
        assert_eq!(explorer.nodes().len(), 4);
    }
}
