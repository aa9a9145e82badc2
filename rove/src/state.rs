//! Execution-state handles and the metadata the scheduler is allowed to read.
//!
//! The engine owns every [`ExecutionState`]; explorers only hold non-owning
//! [`StateRef`] handles and compare them by their assigned id, never by
//! address. The numeric metrics live behind `Cell`s because the engine keeps
//! mutating them while explorers hold shared references.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ptree::PTreeNodeIx;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique, monotonically assigned state identifier.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateId(u64);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "es{}", self.0)
    }
}

/// Shared handle to an execution state.
pub type StateRef = Rc<ExecutionState>;

/// Per-state numeric metrics queried on demand by the weighted explorer.
/// All of them are computed and written by external collaborators (coverage
/// tracking, the solver, the interpreter); the scheduler is read-only here.
#[derive(Debug, Default)]
struct StateMetrics {
    instr_count: Cell<u64>,
    call_path_instr_count: Cell<u64>,
    query_cost: Cell<f64>,
    min_dist_to_uncovered: Cell<u64>,
    insts_since_cov_new: Cell<u64>,
    covered_new: Cell<bool>,
}

impl StateMetrics {
    fn snapshot(&self) -> StateMetrics {
        StateMetrics {
            instr_count: self.instr_count.clone(),
            call_path_instr_count: self.call_path_instr_count.clone(),
            query_cost: self.query_cost.clone(),
            min_dist_to_uncovered: self.min_dist_to_uncovered.clone(),
            insts_since_cov_new: self.insts_since_cov_new.clone(),
            covered_new: self.covered_new.clone(),
        }
    }
}

/// One in-progress exploration path.
///
/// Opaque from the scheduler's point of view: an identity, a branch depth, a
/// back-reference into the process tree and the metrics block above.
#[derive(Debug)]
pub struct ExecutionState {
    id: StateId,
    depth: Cell<u32>,
    ptree_node: Cell<Option<PTreeNodeIx>>,
    metrics: StateMetrics,
}

impl ExecutionState {
    /// Creates a fresh root state at depth 0.
    pub fn new() -> StateRef {
        Rc::new(ExecutionState {
            id: StateId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            depth: Cell::new(0),
            ptree_node: Cell::new(None),
            metrics: StateMetrics::default(),
        })
    }

    /// Creates the branched-off child of this state: fresh id, depth one
    /// below the parent, metrics carried over. The parent's own depth bump on
    /// a branch is the engine's responsibility.
    pub fn fork(&self) -> StateRef {
        Rc::new(ExecutionState {
            id: StateId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            depth: Cell::new(self.depth.get() + 1),
            ptree_node: Cell::new(None),
            metrics: self.metrics.snapshot(),
        })
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    pub fn set_depth(&self, depth: u32) {
        self.depth.set(depth);
    }

    pub fn ptree_node(&self) -> Option<PTreeNodeIx> {
        self.ptree_node.get()
    }

    pub fn set_ptree_node(&self, node: Option<PTreeNodeIx>) {
        self.ptree_node.set(node);
    }

    /// Instructions executed at the state's current location.
    pub fn instr_count(&self) -> u64 {
        self.metrics.instr_count.get()
    }

    pub fn set_instr_count(&self, count: u64) {
        self.metrics.instr_count.set(count);
    }

    /// Instructions executed along the state's current call path.
    pub fn call_path_instr_count(&self) -> u64 {
        self.metrics.call_path_instr_count.get()
    }

    pub fn set_call_path_instr_count(&self, count: u64) {
        self.metrics.call_path_instr_count.set(count);
    }

    /// Cumulative solver time spent on this state's queries, in seconds.
    pub fn query_cost(&self) -> f64 {
        self.metrics.query_cost.get()
    }

    pub fn set_query_cost(&self, cost: f64) {
        self.metrics.query_cost.set(cost);
    }

    /// Estimated minimum distance to not-yet-covered code. 0 means the
    /// estimator has no target.
    pub fn min_dist_to_uncovered(&self) -> u64 {
        self.metrics.min_dist_to_uncovered.get()
    }

    pub fn set_min_dist_to_uncovered(&self, dist: u64) {
        self.metrics.min_dist_to_uncovered.set(dist);
    }

    /// Instructions executed since this state last covered new code.
    pub fn insts_since_cov_new(&self) -> u64 {
        self.metrics.insts_since_cov_new.get()
    }

    pub fn set_insts_since_cov_new(&self, count: u64) {
        self.metrics.insts_since_cov_new.set(count);
    }

    /// Whether this state has ever covered new code.
    pub fn covered_new(&self) -> bool {
        self.metrics.covered_new.get()
    }

    pub fn set_covered_new(&self, covered: bool) {
        self.metrics.covered_new.set(covered);
    }
}

impl PartialEq for ExecutionState {
    fn eq(&self, other: &ExecutionState) -> bool {
        self.id == other.id
    }
}

impl Eq for ExecutionState {}

impl Hash for ExecutionState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Engine-global counters the scheduler reads but never writes.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Total instructions executed across all states.
    pub instructions: Cell<u64>,
}

/// Shared handle to the engine counters.
pub type SharedStats = Rc<EngineStats>;
