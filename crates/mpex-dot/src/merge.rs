//! Merging parallel transitions into multi-labeled display edges.
//!
//! Two merge modes: classical (every action term is a label, deduplicated by
//! a sorted set) and Mealy-paired (a `<name>_Start`/`<name>_Finish` action
//! pair around an intermediate node renders as one input/output-labeled edge
//! that bypasses the node). Both modes display the same underlying transition
//! set; they differ only in grouping.

use mpex_explore::{Fsm, Transition};
use mpex_term::Term;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A display label on a merged edge.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeLabel {
    /// A plain action term.
    Action(Term),
    /// A combined start/finish action pair, rendered `base(in) / (out)`
    /// with the `_Start`/`_Finish` suffixes stripped.
    Paired { start: Term, finish: Term },
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Term]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl EdgeLabel {
    /// Short rendering: only the action symbol, no arguments. For paired
    /// labels this is the shared base name.
    pub fn symbol_text(&self) -> String {
        match self {
            EdgeLabel::Action(action) => match action.symbol() {
                Some(symbol) => symbol.to_string(),
                None => action.to_string(),
            },
            EdgeLabel::Paired { start, .. } => match start.symbol() {
                Some(symbol) => match symbol.split_suffix() {
                    Some((base, _)) => base.to_string(),
                    None => symbol.to_string(),
                },
                None => start.to_string(),
            },
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Action(action) => write!(f, "{}", action),
            EdgeLabel::Paired { start, finish } => {
                write!(f, "{}(", self.symbol_text())?;
                write_args(f, start.args())?;
                write!(f, ") / (")?;
                write_args(f, finish.args())?;
                write!(f, ")")
            }
        }
    }
}

/// One display edge between an ordered pair of nodes, carrying the sorted
/// set of labels of every merged transition.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MultiLabeledTransition {
    pub source: Term,
    pub target: Term,
    pub labels: BTreeSet<EdgeLabel>,
}

/// How transitions are grouped for display.
#[derive(Clone, Copy, Debug)]
pub struct MergePolicy {
    /// Merge all labels between one node pair into a single edge; otherwise
    /// emit one edge per label.
    pub combine_labels: bool,
    /// Elide intermediate nodes between matching `_Start`/`_Finish` actions.
    pub merge_start_finish: bool,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            combine_labels: true,
            merge_start_finish: false,
        }
    }
}

/// The merged display view of an FSM snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedView {
    /// Display nodes: the snapshot's nodes minus any elided intermediates.
    pub nodes: BTreeSet<Term>,
    pub edges: Vec<MultiLabeledTransition>,
}

/// True if the node sits between exactly one `<base>_Start` in-edge and one
/// or more `<base>_Finish` out-edges with a matching base name. Purely local.
fn is_mealy_intermediate(node: &Term, fsm: &Fsm) -> bool {
    if *node == fsm.initial {
        return false;
    }
    let incoming: Vec<&Transition> = fsm
        .transitions
        .iter()
        .filter(|t| t.target == *node)
        .collect();
    let [entering] = incoming.as_slice() else {
        return false;
    };
    if entering.source == *node {
        return false;
    }
    let Some(base) = entering
        .action
        .symbol()
        .and_then(|s| s.split_suffix())
        .filter(|(_, suffix)| *suffix == "Start")
        .map(|(base, _)| base.to_string())
    else {
        return false;
    };
    let outgoing: Vec<&Transition> = fsm
        .transitions
        .iter()
        .filter(|t| t.source == *node)
        .collect();
    !outgoing.is_empty()
        && outgoing.iter().all(|t| {
            t.action
                .symbol()
                .and_then(|s| s.split_suffix())
                .is_some_and(|(b, suffix)| b == base && suffix == "Finish")
        })
}

/// Merge the snapshot's transitions into display edges under the policy.
pub fn merge_transitions(fsm: &Fsm, policy: &MergePolicy) -> MergedView {
    let elided: BTreeSet<Term> = if policy.merge_start_finish {
        fsm.nodes
            .iter()
            .filter(|n| is_mealy_intermediate(n, fsm))
            .cloned()
            .collect()
    } else {
        BTreeSet::new()
    };

    let mut grouped: BTreeMap<(Term, Term), BTreeSet<EdgeLabel>> = BTreeMap::new();
    for transition in &fsm.transitions {
        if elided.contains(&transition.source) {
            // Consumed by the pairing below, via its predecessor.
            continue;
        }
        if elided.contains(&transition.target) {
            for finish in fsm
                .transitions
                .iter()
                .filter(|t| t.source == transition.target)
            {
                grouped
                    .entry((transition.source.clone(), finish.target.clone()))
                    .or_default()
                    .insert(EdgeLabel::Paired {
                        start: transition.action.clone(),
                        finish: finish.action.clone(),
                    });
            }
        } else {
            grouped
                .entry((transition.source.clone(), transition.target.clone()))
                .or_default()
                .insert(EdgeLabel::Action(transition.action.clone()));
        }
    }

    let mut edges = Vec::new();
    for ((source, target), labels) in grouped {
        if policy.combine_labels {
            edges.push(MultiLabeledTransition {
                source,
                target,
                labels,
            });
        } else {
            for label in labels {
                edges.push(MultiLabeledTransition {
                    source: source.clone(),
                    target: target.clone(),
                    labels: [label].into_iter().collect(),
                });
            }
        }
    }

    MergedView {
        nodes: fsm.nodes.difference(&elided).cloned().collect(),
        edges,
    }
}
