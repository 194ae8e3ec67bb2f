//! Display-edge merging and Graphviz dot export for explored automata.

pub mod dot;
pub mod merge;

pub use dot::{to_dot, DotConfig, RankDir, TransitionLabels};
pub use merge::{merge_transitions, EdgeLabel, MergePolicy, MergedView, MultiLabeledTransition};
