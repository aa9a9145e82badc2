//! Rove, an exploration scheduler for a symbolic-execution engine.
//!
//! The engine's main loop repeatedly asks an [`Explorer`](explorer::Explorer)
//! for the next state to step, executes one step of that state, and reports
//! the outcome back through `update`: the state that just stepped, the states
//! newly branched from it and the states that terminated. Everything in this
//! crate is a strategy answering that one question — *which live state runs
//! next* — either directly (depth-first, breadth-first, random, weighted,
//! tree-walk) or by wrapping another strategy (batching, iterative deepening,
//! merging, interleaving, select-N fairness).
//!
//! The scheduler never looks inside a state: symbolic memory, path
//! constraints and the branch/terminate decisions all belong to the engine.
//! Strategies only see the identity and numeric metadata exposed by
//! [`state::ExecutionState`] and the branch history recorded in
//! [`ptree::PTree`].

pub mod explorer;
pub mod pdf;
pub mod ptree;
pub mod state;
pub mod utils;
