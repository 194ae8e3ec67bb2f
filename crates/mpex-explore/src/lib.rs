//! Incremental state-space explorer for model programs.
//!
//! A model program exposes a (possibly infinite) labeled transition system
//! through state/action queries without ever materializing it. The explorer
//! discovers transitions lazily and on demand, deduplicates structurally
//! identical states, optionally collapses isomorphic states, and supports
//! user-directed show/hide of the explored frontier.

pub mod explorer;
pub mod fsm;
pub mod program;

pub use explorer::{
    ExploreConfig, ExploreError, ExploreOutcome, ExploreResult, ExploredTransitions,
    SymmetryReduction, Transition, ISOMORPHIC_TO,
};
pub use fsm::Fsm;
pub use program::{IsomorphismChecker, ModelProgram, ProgramError, TransitionProperties};
