//! Decorator that keeps re-returning one state until a budget runs out.

use std::time::{Duration, Instant};

use crate::explorer::Explorer;
use crate::rove_warn;
use crate::state::{SharedStats, StateRef};

/// Amortizes a possibly expensive inner `select` by handing the same state
/// back for a span of wall-clock time or a number of executed instructions,
/// whichever runs out first. With both budgets at zero this degenerates to a
/// pass-through.
pub struct BatchingExplorer {
    base: Box<dyn Explorer>,
    stats: SharedStats,
    time_budget: Duration,
    instruction_budget: u64,
    last_state: Option<StateRef>,
    last_start_time: Instant,
    last_start_instructions: u64,
}

impl BatchingExplorer {
    pub fn new(
        base: Box<dyn Explorer>,
        stats: SharedStats,
        time_budget: Duration,
        instruction_budget: u64,
    ) -> BatchingExplorer {
        BatchingExplorer {
            base,
            stats,
            time_budget,
            instruction_budget,
            last_state: None,
            last_start_time: Instant::now(),
            last_start_instructions: 0,
        }
    }
}

impl Explorer for BatchingExplorer {
    fn select(&mut self) -> StateRef {
        if let Some(ref es) = self.last_state {
            let elapsed = self.last_start_time.elapsed();
            let executed = self
                .stats
                .instructions
                .get()
                .wrapping_sub(self.last_start_instructions);
            if elapsed < self.time_budget && executed < self.instruction_budget {
                return es.clone();
            }
            // A single step that blows well past the span means the budget is
            // too small for this workload; stretch it to what was observed.
            if !self.time_budget.is_zero() && elapsed > self.time_budget.mul_f64(1.1) {
                rove_warn!(
                    "sched_batch_budget|{:?}|{:?}",
                    self.time_budget,
                    elapsed
                );
                self.time_budget = elapsed;
            }
        }
        let es = self.base.select();
        self.last_state = Some(es.clone());
        self.last_start_time = Instant::now();
        self.last_start_instructions = self.stats.instructions.get();
        es
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        // Never hold on to a dead state; the next select must re-delegate.
        if let Some(ref es) = self.last_state {
            if removed.contains(es) {
                self.last_state = None;
            }
        }
        self.base.update(current, added, removed);
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    fn describe(&self) -> String {
        format!(
            "<BatchingExplorer> time budget: {:?}, instruction budget: {}, base:\n{}\n</BatchingExplorer>",
            self.time_budget,
            self.instruction_budget,
            self.base.describe()
        )
    }
}
