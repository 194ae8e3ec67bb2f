//! End-to-end exploration scenarios over the public API.

use mpex_explore::{
    ExploreConfig, ExploreOutcome, ExploredTransitions, ModelProgram, ProgramError,
    SymmetryReduction, Transition, TransitionProperties,
};
use mpex_term::{Symbol, Term};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// A model program backed by an explicit edge table. The call counter is
/// shared so tests can assert memoization after moving the program into an
/// explorer.
struct TableProgram {
    initial: Term,
    accepting: BTreeSet<Term>,
    edges: Vec<(Term, Term, Term)>,
    target_calls: Rc<Cell<usize>>,
}

impl TableProgram {
    fn new(initial: Term, accepting: &[Term], edges: Vec<(Term, Term, Term)>) -> Self {
        Self {
            initial,
            accepting: accepting.iter().cloned().collect(),
            edges,
            target_calls: Rc::new(Cell::new(0)),
        }
    }
}

impl ModelProgram for TableProgram {
    type State = Term;

    fn initial_state(&self) -> Term {
        self.initial.clone()
    }

    fn is_accepting(&self, state: &Term) -> bool {
        self.accepting.contains(state)
    }

    fn satisfies_state_invariant(&self, _state: &Term) -> bool {
        true
    }

    fn satisfies_state_filter(&self, _state: &Term) -> bool {
        true
    }

    fn potentially_enabled_action_symbols(&self, state: &Term) -> BTreeSet<Symbol> {
        self.edges
            .iter()
            .filter(|(s, _, _)| s == state)
            .filter_map(|(_, a, _)| a.symbol().cloned())
            .collect()
    }

    fn get_actions(&self, state: &Term, symbol: &Symbol) -> Result<Vec<Term>, ProgramError> {
        Ok(self
            .edges
            .iter()
            .filter(|(s, a, _)| s == state && a.symbol() == Some(symbol))
            .map(|(_, a, _)| a.clone())
            .collect())
    }

    fn get_target_state(
        &self,
        state: &Term,
        action: &Term,
    ) -> Result<(Term, TransitionProperties), ProgramError> {
        self.target_calls.set(self.target_calls.get() + 1);
        self.edges
            .iter()
            .find(|(s, a, _)| s == state && a == action)
            .map(|(_, _, t)| (t.clone(), TransitionProperties::new()))
            .ok_or(ProgramError::ActionNotEnabled {
                action: action.clone(),
            })
    }
}

fn state(name: &str) -> Term {
    Term::compound(Symbol::new(name), vec![])
}

fn action(name: &str) -> Term {
    Term::compound(Symbol::new(name), vec![])
}

fn config(initial_budget: usize, per_step_budget: usize) -> ExploreConfig {
    ExploreConfig {
        initial_budget,
        per_step_budget,
        symmetry: SymmetryReduction::Off,
    }
}

/// S0 --a()--> S1 --b()--> S0, S0 accepting.
fn two_state_loop() -> TableProgram {
    TableProgram::new(
        state("S0"),
        &[state("S0")],
        vec![
            (state("S0"), action("a"), state("S1")),
            (state("S1"), action("b"), state("S0")),
        ],
    )
}

#[test]
fn two_state_scenario_with_budget_ten() {
    let mut explorer = ExploredTransitions::new(two_state_loop(), config(10, 10));
    let initial = explorer.initial_node().clone();
    let outcome = explorer.show_reachable(&initial).unwrap();
    assert_eq!(
        outcome,
        ExploreOutcome::Complete {
            transitions_added: 2
        }
    );

    let fsm = explorer.get_fa();
    let expected_nodes: BTreeSet<Term> = [Term::int(0), Term::int(1)].into_iter().collect();
    let expected_transitions: BTreeSet<Transition> = [
        Transition::new(Term::int(0), action("a"), Term::int(1)),
        Transition::new(Term::int(1), action("b"), Term::int(0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(fsm.nodes, expected_nodes);
    assert_eq!(fsm.transitions, expected_transitions);
    assert_eq!(
        fsm.accepting,
        [Term::int(0)].into_iter().collect::<BTreeSet<Term>>()
    );
}

#[test]
fn show_is_idempotent_over_the_public_api() {
    let mut explorer = ExploredTransitions::new(two_state_loop(), config(10, 10));
    let initial = explorer.initial_node().clone();
    explorer.show_transition(&initial, &action("a")).unwrap();
    let once = explorer.get_fa();
    explorer.show_transition(&initial, &action("a")).unwrap();
    assert_eq!(explorer.get_fa(), once);
}

#[test]
fn budget_is_monotone_across_resumed_explorations() {
    // Binary tree of depth 4: 30 edges.
    let mut edges = Vec::new();
    for i in 1..16i64 {
        edges.push((state(&format!("n{}", i)), action(&format!("l{}", i)), state(&format!("n{}", 2 * i))));
        edges.push((state(&format!("n{}", i)), action(&format!("r{}", i)), state(&format!("n{}", 2 * i + 1))));
    }
    let program = TableProgram::new(state("n1"), &[], edges);
    let mut explorer = ExploredTransitions::new(program, config(5, 7));
    let initial = explorer.initial_node().clone();

    let mut previous = 0;
    let mut step_budget = 5;
    loop {
        let outcome = explorer.show_reachable(&initial).unwrap();
        let visible = explorer.transitions().len();
        assert!(visible >= previous, "visible set must be non-decreasing");
        assert!(
            visible <= previous + step_budget,
            "budget must bound per-call growth"
        );
        previous = visible;
        step_budget = 7;
        match outcome {
            ExploreOutcome::Complete { .. } => break,
            ExploreOutcome::BudgetReached { frontier, .. } => assert!(frontier > 0),
        }
    }
    assert_eq!(explorer.transitions().len(), 30);
}

#[test]
fn snapshot_is_independent_of_show_order() {
    // Discover everything once so node numbering is fixed by memoization,
    // then replay permuted show sequences against hidden transitions.
    let build = || {
        let program = TableProgram::new(
            state("S0"),
            &[state("S0")],
            vec![
                (state("S0"), action("a"), state("S1")),
                (state("S0"), action("b"), state("S2")),
                (state("S1"), action("c"), state("S2")),
            ],
        );
        let mut explorer = ExploredTransitions::new(program, config(100, 100));
        let initial = explorer.initial_node().clone();
        explorer.show_reachable(&initial).unwrap();
        explorer.hide_reachable(&initial).unwrap();
        explorer
    };

    let calls = [
        (Term::int(0), action("a")),
        (Term::int(0), action("b")),
        (Term::int(1), action("c")),
    ];

    let mut forward = build();
    for (source, act) in &calls {
        forward.show_transition(source, act).unwrap();
    }
    let mut backward = build();
    for (source, act) in calls.iter().rev() {
        backward.show_transition(source, act).unwrap();
    }
    assert_eq!(forward.get_fa(), backward.get_fa());
}

#[test]
fn hidden_descendants_stay_hidden_after_ancestor_show() {
    let program = TableProgram::new(
        state("S0"),
        &[],
        vec![
            (state("S0"), action("a"), state("S1")),
            (state("S1"), action("b"), state("S2")),
            (state("S2"), action("c"), state("S3")),
        ],
    );
    let mut explorer = ExploredTransitions::new(program, config(100, 100));
    let initial = explorer.initial_node().clone();
    explorer.show_reachable(&initial).unwrap();

    explorer.hide_reachable(&Term::int(1)).unwrap();
    assert_eq!(explorer.transitions().len(), 1);

    // Re-showing from the ancestor restores only its direct edge; the
    // transitively hidden descendants do not resurrect.
    explorer.show_outgoing(&initial).unwrap();
    assert_eq!(explorer.transitions().len(), 1);
    assert_eq!(explorer.hidden_transitions().len(), 2);

    explorer.show_outgoing(&Term::int(1)).unwrap();
    assert_eq!(explorer.transitions().len(), 2);
    assert_eq!(explorer.hidden_transitions().len(), 1);
}

#[test]
fn oracle_runs_once_per_pair_across_show_hide_cycles() {
    let program = two_state_loop();
    let calls = program.target_calls.clone();
    let mut explorer = ExploredTransitions::new(program, config(100, 100));
    let initial = explorer.initial_node().clone();
    for _ in 0..3 {
        explorer.show_reachable(&initial).unwrap();
        explorer.hide_reachable(&initial).unwrap();
    }
    explorer.show_reachable(&initial).unwrap();
    assert_eq!(explorer.transitions().len(), 2);
    // 2 edges, each resolved against the oracle exactly once.
    assert_eq!(calls.get(), 2);
}
