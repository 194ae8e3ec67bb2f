//! FSM snapshot to DOT (Graphviz) conversion.
//!
//! A pure function from a snapshot plus display policy to a text buffer; it
//! never mutates explorer state and is safe to call repeatedly on cached
//! snapshots. Output conventions:
//! - the initial node is emitted first with its own attribute line;
//! - accepting nodes get `peripheries=2`;
//! - dead and unsafe nodes get caller-chosen fill colors;
//! - `IsomorphicTo` grouping edges render `style=dashed`;
//! - all labels are quote-escaped.

use crate::merge::{merge_transitions, EdgeLabel, MergePolicy};
use mpex_explore::Fsm;
use mpex_term::Term;
use std::collections::BTreeSet;
use std::fmt::Write;
use tracing::debug;

/// Graph layout direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankDir {
    /// Top to bottom.
    #[default]
    TB,
    /// Left to right.
    LR,
}

impl RankDir {
    fn as_str(self) -> &'static str {
        match self {
            RankDir::TB => "TB",
            RankDir::LR => "LR",
        }
    }
}

/// How much of an action term to show on edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionLabels {
    /// No edge labels.
    None,
    /// Only the action symbol, no arguments.
    ActionSymbol,
    /// The full action term.
    #[default]
    Action,
}

/// Display policy for DOT output.
#[derive(Clone, Debug)]
pub struct DotConfig {
    /// Graph name after `digraph`.
    pub graph_name: String,
    pub rankdir: RankDir,
    /// Shape for every node (default: "box").
    pub node_shape: &'static str,
    /// Default fill color (default: "lightgray").
    pub fillcolor: &'static str,
    /// Fill color for the initial node, if different.
    pub initial_color: Option<&'static str>,
    /// Fill color for dead nodes (no path to any accepting node).
    pub dead_color: Option<&'static str>,
    /// Fill color for unsafe nodes (state invariant violated).
    pub unsafe_color: Option<&'static str>,
    pub transition_labels: TransitionLabels,
    pub merge: MergePolicy,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            graph_name: "model".to_string(),
            rankdir: RankDir::TB,
            node_shape: "box",
            fillcolor: "lightgray",
            initial_color: Some("lightgreen"),
            dead_color: Some("lightyellow"),
            unsafe_color: Some("lightsalmon"),
            transition_labels: TransitionLabels::Action,
            merge: MergePolicy::default(),
        }
    }
}

/// Escape a string for use inside a double-quoted DOT attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn label_text(label: &EdgeLabel, policy: TransitionLabels) -> Option<String> {
    match policy {
        TransitionLabels::None => None,
        TransitionLabels::ActionSymbol => Some(label.symbol_text()),
        TransitionLabels::Action => Some(label.to_string()),
    }
}

/// Attribute line for one node, or None when all defaults apply.
fn node_attributes(node: &Term, fsm: &Fsm, dead: &BTreeSet<Term>, config: &DotConfig) -> String {
    let mut attrs: Vec<String> = Vec::new();
    if fsm.accepting.contains(node) {
        attrs.push("peripheries=2".to_string());
    }
    // Unsafe wins over dead wins over initial, most alarming first.
    let color = if fsm.unsafe_nodes.contains(node) {
        config.unsafe_color
    } else if dead.contains(node) {
        config.dead_color
    } else if *node == fsm.initial {
        config.initial_color
    } else {
        None
    };
    if let Some(color) = color {
        attrs.push(format!("fillcolor={}", color));
    }
    attrs.join(", ")
}

/// Render an FSM snapshot as a DOT digraph.
pub fn to_dot(fsm: &Fsm, config: &DotConfig) -> String {
    let view = merge_transitions(fsm, &config.merge);
    let dead = if config.dead_color.is_some() {
        fsm.dead_nodes()
    } else {
        BTreeSet::new()
    };
    debug!(
        nodes = view.nodes.len(),
        edges = view.edges.len(),
        "rendering dot"
    );

    let mut out = String::new();
    let _ = writeln!(out, "digraph \"{}\" {{", escape(&config.graph_name));
    let _ = writeln!(out, "  rankdir={};", config.rankdir.as_str());
    let _ = writeln!(
        out,
        "  node [style=filled, shape={}, peripheries=1, fillcolor={}];",
        config.node_shape, config.fillcolor
    );

    // Initial node first, then the rest in node order.
    let ordered = std::iter::once(&fsm.initial)
        .chain(view.nodes.iter().filter(|n| **n != fsm.initial));
    for node in ordered {
        if !view.nodes.contains(node) {
            continue;
        }
        let attrs = node_attributes(node, fsm, &dead, config);
        if attrs.is_empty() {
            let _ = writeln!(out, "  \"{}\";", escape(&node.to_string()));
        } else {
            let _ = writeln!(out, "  \"{}\" [{}];", escape(&node.to_string()), attrs);
        }
    }

    for edge in &view.edges {
        let labels: Vec<String> = edge
            .labels
            .iter()
            .filter_map(|l| label_text(l, config.transition_labels))
            .collect();
        let mut attrs: Vec<String> = Vec::new();
        if !labels.is_empty() {
            attrs.push(format!("label=\"{}\"", escape(&labels.join("\n"))));
        }
        let src = escape(&edge.source.to_string());
        let dst = escape(&edge.target.to_string());
        if attrs.is_empty() {
            let _ = writeln!(out, "  \"{}\" -> \"{}\";", src, dst);
        } else {
            let _ = writeln!(out, "  \"{}\" -> \"{}\" [{}];", src, dst, attrs.join(", "));
        }
    }

    for edge in &fsm.grouping {
        if !view.nodes.contains(&edge.source) || !view.nodes.contains(&edge.target) {
            continue;
        }
        let mut attrs: Vec<String> = Vec::new();
        if config.transition_labels != TransitionLabels::None {
            attrs.push(format!("label=\"{}\"", escape(&edge.action.to_string())));
        }
        attrs.push("style=dashed".to_string());
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [{}];",
            escape(&edge.source.to_string()),
            escape(&edge.target.to_string()),
            attrs.join(", ")
        );
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpex_explore::Transition;
    use mpex_term::Symbol;

    fn node(i: i64) -> Term {
        Term::int(i)
    }

    fn act(name: &str, args: Vec<Term>) -> Term {
        Term::compound(Symbol::new(name), args)
    }

    /// 0 --a()--> 1 --b()--> 0, node 0 accepting.
    fn two_state_fsm() -> Fsm {
        Fsm {
            initial: node(0),
            nodes: [node(0), node(1)].into_iter().collect(),
            transitions: [
                Transition::new(node(0), act("a", vec![]), node(1)),
                Transition::new(node(1), act("b", vec![]), node(0)),
            ]
            .into_iter()
            .collect(),
            accepting: [node(0)].into_iter().collect(),
            unsafe_nodes: BTreeSet::new(),
            grouping: BTreeSet::new(),
        }
    }

    #[test]
    fn renders_the_basic_digraph_shape() {
        let dot = to_dot(&two_state_fsm(), &DotConfig::default());
        assert!(dot.starts_with("digraph \"model\" {\n"));
        assert!(dot.contains("rankdir=TB;"));
        assert!(dot.contains("node [style=filled, shape=box, peripheries=1, fillcolor=lightgray];"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn initial_node_is_emitted_first_and_accepting_gets_double_periphery() {
        let dot = to_dot(&two_state_fsm(), &DotConfig::default());
        let node_zero = dot.find("\"0\" [").unwrap();
        let node_one = dot.find("\"1\"").unwrap();
        assert!(node_zero < node_one);
        assert!(dot.contains("\"0\" [peripheries=2, fillcolor=lightgreen];"));
    }

    #[test]
    fn symbol_labels_drop_arguments() {
        let config = DotConfig {
            transition_labels: TransitionLabels::ActionSymbol,
            ..Default::default()
        };
        let dot = to_dot(&two_state_fsm(), &config);
        assert!(dot.contains("\"0\" -> \"1\" [label=\"a\"];"));
        assert!(dot.contains("\"1\" -> \"0\" [label=\"b\"];"));
    }

    #[test]
    fn full_labels_show_the_action_term() {
        let dot = to_dot(&two_state_fsm(), &DotConfig::default());
        assert!(dot.contains("\"0\" -> \"1\" [label=\"a()\"];"));
    }

    #[test]
    fn no_labels_mode_emits_bare_edges() {
        let config = DotConfig {
            transition_labels: TransitionLabels::None,
            ..Default::default()
        };
        let dot = to_dot(&two_state_fsm(), &config);
        assert!(dot.contains("\"0\" -> \"1\";"));
    }

    #[test]
    fn dead_nodes_get_the_dead_color() {
        // 0 accepting, 0 -> 1 with no way back: node 1 is dead.
        let fsm = Fsm {
            initial: node(0),
            nodes: [node(0), node(1)].into_iter().collect(),
            transitions: [Transition::new(node(0), act("a", vec![]), node(1))]
                .into_iter()
                .collect(),
            accepting: [node(0)].into_iter().collect(),
            unsafe_nodes: BTreeSet::new(),
            grouping: BTreeSet::new(),
        };
        let dot = to_dot(&fsm, &DotConfig::default());
        assert!(dot.contains("\"1\" [fillcolor=lightyellow];"));
    }

    #[test]
    fn unsafe_color_wins_over_dead_color() {
        let fsm = Fsm {
            initial: node(0),
            nodes: [node(0), node(1)].into_iter().collect(),
            transitions: [Transition::new(node(0), act("a", vec![]), node(1))]
                .into_iter()
                .collect(),
            accepting: [node(0)].into_iter().collect(),
            unsafe_nodes: [node(1)].into_iter().collect(),
            grouping: BTreeSet::new(),
        };
        let dot = to_dot(&fsm, &DotConfig::default());
        assert!(dot.contains("\"1\" [fillcolor=lightsalmon];"));
    }

    #[test]
    fn grouping_edges_are_dashed() {
        let mut fsm = two_state_fsm();
        fsm.grouping.insert(Transition::new(
            node(1),
            act("IsomorphicTo", vec![]),
            node(0),
        ));
        let dot = to_dot(&fsm, &DotConfig::default());
        assert!(dot.contains("\"1\" -> \"0\" [label=\"IsomorphicTo()\", style=dashed];"));
    }

    #[test]
    fn labels_are_quote_escaped() {
        let fsm = Fsm {
            initial: node(0),
            nodes: [node(0), node(1)].into_iter().collect(),
            transitions: [Transition::new(
                node(0),
                act("say", vec![Term::str("hi \"there\"")]),
                node(1),
            )]
            .into_iter()
            .collect(),
            accepting: BTreeSet::new(),
            unsafe_nodes: BTreeSet::new(),
            grouping: BTreeSet::new(),
        };
        let dot = to_dot(&fsm, &DotConfig::default());
        assert!(dot.contains(r#"label="say(\"hi \\\"there\\\"\")""#));
    }

    #[test]
    fn mealy_merge_renders_the_paired_label() {
        let fsm = Fsm {
            initial: node(0),
            nodes: [node(0), node(1), node(2)].into_iter().collect(),
            transitions: [
                Transition::new(node(0), act("Req_Start", vec![Term::int(5)]), node(1)),
                Transition::new(node(1), act("Req_Finish", vec![Term::int(6)]), node(2)),
            ]
            .into_iter()
            .collect(),
            accepting: BTreeSet::new(),
            unsafe_nodes: BTreeSet::new(),
            grouping: BTreeSet::new(),
        };
        let config = DotConfig {
            merge: MergePolicy {
                combine_labels: true,
                merge_start_finish: true,
            },
            ..Default::default()
        };
        let dot = to_dot(&fsm, &config);
        assert!(dot.contains("\"0\" -> \"2\" [label=\"Req(5) / (6)\"];"));
        assert!(!dot.contains("\"1\""));
    }
}
