//! Exploration strategies driving the engine's select/step/notify loop.
//!
//! An [`Explorer`] answers one question: which live state does the engine
//! step next. Leaf strategies ([`dfs`], [`bfs`], [`random`], [`weighted`],
//! [`random_path`]) keep the actual population storage; decorator strategies
//! ([`batching`], [`deepening`], [`merging`], [`interleaved`], [`select_n`])
//! wrap an inner explorer and change when, how often or in what order it is
//! consulted, never its internal logic. Chains are built from boxed trait
//! objects, so any combination can be swapped in without touching the main
//! loop.
//!
//! Scheduling is strictly single threaded and cooperative: the engine calls
//! `select`, steps the returned state, then calls `update`, with no overlap.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::state::StateRef;

pub mod batching;
pub mod bfs;
pub mod deepening;
pub mod dfs;
pub mod interleaved;
pub mod merging;
pub mod random;
pub mod random_path;
pub mod select_n;
pub mod weighted;

mod error;
pub use error::{ExplorerError, ExplorerResult};

/// Uniform random source shared by reference between the stochastic
/// explorers. Not safe for use outside the single-threaded engine loop.
pub type SharedRng = Rc<RefCell<StdRng>>;

/// A deterministically seeded shared random source.
pub fn seeded_rng(seed: u64) -> SharedRng {
    Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
}

/// A shared random source seeded from the operating system.
pub fn entropy_rng() -> SharedRng {
    Rc::new(RefCell::new(StdRng::from_entropy()))
}

/// Selection strategy over the live execution states.
pub trait Explorer {
    /// Selects a state for further exploration.
    ///
    /// The tracked population must be non-empty; calling this on an empty
    /// explorer is a contract violation and aborts. Selection never changes
    /// population membership, though internal bookkeeping (batching
    /// baselines, round-robin cursors) may move.
    fn select(&mut self) -> StateRef;

    /// Notifies the explorer about population changes.
    ///
    /// `current` is the state that just executed and produced `added`, its
    /// direct children from the most recent branch; it is `None` when the
    /// notification carries no branch (initial seeding, pause bookkeeping,
    /// revival). States in `removed` must never be selected again.
    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]);

    /// True iff no state is currently selectable.
    fn is_empty(&self) -> bool;

    /// Diagnostic name, used for logging only.
    fn describe(&self) -> String;
}

impl Debug for dyn Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}
