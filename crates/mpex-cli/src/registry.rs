//! Name-to-factory registry for model programs.
//!
//! Programs are registered at startup and resolved by string identifier, so
//! a host can add its own without the explorer knowing about any of them.

use crate::programs::{ClientServer, Counter, RenamingChecker, Spawner};
use mpex_explore::{IsomorphismChecker, ModelProgram};
use mpex_term::Term;

pub type DynProgram = Box<dyn ModelProgram<State = Term>>;
pub type DynChecker = Box<dyn IsomorphismChecker<Term>>;

/// A program factory produces a fresh model program, plus the isomorphism
/// checker to use if symmetry reduction is requested for it.
pub type ProgramFactory = fn() -> (DynProgram, Option<DynChecker>);

pub struct RegisteredProgram {
    pub name: &'static str,
    pub description: &'static str,
    factory: ProgramFactory,
}

/// Registry of model-program constructors, resolved by name.
#[derive(Default)]
pub struct ProgramRegistry {
    entries: Vec<RegisteredProgram>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in demonstration programs.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("counter", "bounded counter with Inc/Dec actions", || {
            (Box::new(Counter { max: 3 }), None)
        });
        registry.register(
            "clientserver",
            "request/response server with Req_Start/Req_Finish pairs",
            || (Box::new(ClientServer { clients: 2 }), None),
        );
        registry.register(
            "spawn",
            "pool of interchangeable clients (use with --symmetry)",
            || (Box::new(Spawner { pool: 3 }), Some(Box::new(RenamingChecker))),
        );
        registry
    }

    /// Register a factory under a unique name. Later registrations shadow
    /// earlier ones with the same name.
    pub fn register(
        &mut self,
        name: &'static str,
        description: &'static str,
        factory: ProgramFactory,
    ) {
        self.entries.retain(|e| e.name != name);
        self.entries.push(RegisteredProgram {
            name,
            description,
            factory,
        });
    }

    /// Construct the program registered under `name`.
    pub fn resolve(&self, name: &str) -> Option<(DynProgram, Option<DynChecker>)> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.factory)())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredProgram> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }
}
